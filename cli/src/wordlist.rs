//! Word list parsing for dictionary import.
//!
//! Supported formats:
//! - JSON object: {"word": frequency, ...}
//! - JSON array: [["word", frequency], ...]
//! - TXT: one word per line, optionally followed by a tab or comma and a
//!   frequency (defaults to 1). Lines starting with '#' are comments.

use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum WordListFormat {
    Json,
    Txt,
}

impl WordListFormat {
    /// Guess the format from a file extension; anything but `.json` is text.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Txt,
        }
    }
}

pub fn load(path: &Path, format: Option<WordListFormat>) -> anyhow::Result<Vec<(String, u32)>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read word list {}: {}", path.display(), e))?;
    match format.unwrap_or_else(|| WordListFormat::from_path(path)) {
        WordListFormat::Json => parse_json(&content),
        WordListFormat::Txt => parse_txt(&content),
    }
}

pub fn parse_json(content: &str) -> anyhow::Result<Vec<(String, u32)>> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| anyhow::anyhow!("Failed to parse JSON: {}", e))?;
    if value.is_object() {
        let map: BTreeMap<String, u32> = serde_json::from_value(value)
            .map_err(|e| anyhow::anyhow!("Expected {{\"word\": frequency}}: {}", e))?;
        return Ok(map.into_iter().collect());
    }
    let entries: Vec<(String, u32)> = serde_json::from_value(value)
        .map_err(|e| anyhow::anyhow!("Expected [[\"word\", frequency], ...]: {}", e))?;
    Ok(entries)
}

pub fn parse_txt(content: &str) -> anyhow::Result<Vec<(String, u32)>> {
    let mut entries = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (word, freq) = match line.split_once(['\t', ',']) {
            Some((word, freq)) => {
                let freq = freq.trim().parse::<u32>().map_err(|e| {
                    anyhow::anyhow!("line {}: bad frequency '{}': {}", lineno + 1, freq.trim(), e)
                })?;
                (word.trim(), freq)
            }
            None => (line, 1),
        };
        entries.push((word.to_lowercase(), freq));
    }
    Ok(entries)
}
