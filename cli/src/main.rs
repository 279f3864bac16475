use clap::{Parser, Subcommand};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use swipekeys_core::{
    Candidate, Config, ControlAction, KeyboardLayoutDescriptor, KeyboardSession, LexiconEngine,
    SequencerEvent, SwipeVector,
};

mod wordlist;
use wordlist::WordListFormat;

#[derive(Parser)]
#[command(name = "swipekeys")]
#[command(about = "Swipe keyboard word prediction from the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Layout name (overrides the configuration)
    #[arg(short, long)]
    layout: Option<String>,

    /// Word list to load into the dictionary
    #[arg(short, long)]
    words: Option<PathBuf>,

    /// Word list format (guessed from the extension when omitted)
    #[arg(long, value_enum)]
    format: Option<WordListFormat>,

    /// Prediction engine: trie or lexicon
    #[arg(short, long)]
    engine: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive REPL mode (default)
    Repl,
    /// Build an FST lexicon for the lexicon engine from a word list
    BuildLexicon {
        /// Input word list
        #[arg(short, long)]
        input: PathBuf,
        /// Output .fst file
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, value_enum)]
        format: Option<WordListFormat>,
    },
    /// List the built-in layouts and their key groups
    Layouts,
}

const DEMO_WORDS: [(&str, u32); 12] = [
    ("yes", 90),
    ("no", 85),
    ("help", 70),
    ("hello", 60),
    ("thanks", 55),
    ("water", 40),
    ("tired", 30),
    ("pain", 35),
    ("more", 25),
    ("stop", 50),
    ("go", 45),
    ("hi", 20),
];

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Some(Commands::BuildLexicon {
            input,
            output,
            format,
        }) => build_lexicon(input, output, *format),
        Some(Commands::Layouts) => {
            list_layouts();
            Ok(())
        }
        Some(Commands::Repl) | None => repl(&cli),
    }
}

fn build_lexicon(input: &Path, output: &Path, format: Option<WordListFormat>) -> anyhow::Result<()> {
    let entries = wordlist::load(input, format)?;
    println!("Parsed {} words from {}", entries.len(), input.display());
    let engine = LexiconEngine::from_words(entries)
        .map_err(|e| anyhow::anyhow!("Failed to build lexicon: {}", e))?;
    let bytes = engine
        .fst_bytes()
        .ok_or_else(|| anyhow::anyhow!("lexicon is empty"))?;
    std::fs::write(output, &bytes)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", output.display(), e))?;
    println!("✓ Wrote {} bytes to {}", bytes.len(), output.display());
    Ok(())
}

fn list_layouts() {
    for name in KeyboardLayoutDescriptor::builtin_names() {
        if let Some(layout) = KeyboardLayoutDescriptor::builtin(name) {
            println!("{:<11} {:?}  {}", name, layout.input_mode(), layout.letter_groups.join(" "));
        }
    }
}

fn build_session(cli: &Cli) -> anyhow::Result<(Config, KeyboardSession)> {
    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load_toml(path)?;
            println!("✓ Loaded configuration from {}", path.display());
            config
        }
        None => Config::default(),
    };
    if let Some(layout) = &cli.layout {
        config.layout = layout.clone();
    }
    if let Some(engine) = &cli.engine {
        config.engine = engine.clone();
    }

    let session = KeyboardSession::from_config(&config)?;
    let words = match &cli.words {
        Some(path) => wordlist::load(path, cli.format)?,
        None if config.custom_words.is_empty() => {
            println!("ℹ Using demo word list");
            DEMO_WORDS.iter().map(|&(w, f)| (w.to_string(), f)).collect()
        }
        None => Vec::new(),
    };
    if !words.is_empty() {
        let report = session.manager().import_words(words);
        println!("✓ Imported {} words", report.inserted);
        for err in report.rejected.iter().take(5) {
            eprintln!("⚠ {}", err);
        }
        if report.rejected.len() > 5 {
            eprintln!("⚠ ... and {} more rejected", report.rejected.len() - 5);
        }
    }
    Ok((config, session))
}

fn switch_layout(session: &mut KeyboardSession, config: &Config, name: &str) -> anyhow::Result<()> {
    let layout = config.find_layout(name)?;
    session.set_layout(layout);
    Ok(())
}

fn print_suggestions(session: &KeyboardSession) {
    let keys: Vec<String> = session.key_sequence().iter().map(|k| k.to_string()).collect();
    match session.entered_letters() {
        Some(letters) => println!("  keys: [{}] \"{}\"", keys.join(","), letters),
        None => println!("  keys: [{}]", keys.join(",")),
    }
    let suggestions: Vec<Candidate> = session.suggestions();
    if suggestions.is_empty() {
        println!("  → (no suggestions)\n");
        return;
    }
    for (i, c) in suggestions.iter().enumerate() {
        println!("  {}. {} (frequency: {})", i + 1, c.word, c.frequency);
    }
    println!();
}

fn report_event(session: &mut KeyboardSession, event: SequencerEvent) {
    match event {
        SequencerEvent::Ignored => println!("  (ignored)"),
        SequencerEvent::StrokePending(key) => println!("  first stroke {}", key),
        SequencerEvent::DetailOpened(key) => println!("  group {} open", key),
        SequencerEvent::Control(ControlAction::Yes) => commit(session, None),
        SequencerEvent::Control(ControlAction::Speak) => match session.suggestions().first() {
            Some(top) => println!("  🔊 {}", top.word),
            None => println!("  🔊 (nothing to speak)"),
        },
        SequencerEvent::Control(action) => println!("  {:?}", action),
        SequencerEvent::Appended(_) => {}
    }
}

fn commit(session: &mut KeyboardSession, word: Option<&str>) {
    let result = match word {
        Some(word) => session.commit(word).map(|_| Some(word.to_string())),
        None => session.commit_top(),
    };
    match result {
        Ok(Some(word)) => println!("  ✓ committed \"{}\"", word),
        Ok(None) => println!("  (nothing to commit)"),
        Err(e) => eprintln!("  ⚠ {}", e),
    }
}

fn parse_keys(input: &str) -> Option<Vec<usize>> {
    input
        .split(',')
        .map(|k| k.trim().parse::<usize>().ok())
        .collect()
}

fn print_stats(session: &KeyboardSession) {
    let manager = session.manager();
    let metrics = manager.metrics();
    println!(
        "  engine: {}",
        manager.current_engine_id().unwrap_or_else(|| "-".to_string())
    );
    println!("  queries: {}", metrics.query_count);
    if let Some(avg) = metrics.average_latency() {
        println!("  average latency: {:?}", avg);
    }
    match metrics.cache_hit_rate() {
        Some(rate) => println!("  cache hit rate: {:.1}%", rate),
        None => println!("  cache hit rate: n/a"),
    }
    println!(
        "  cache: {}/{} entries, ~{} bytes\n",
        manager.cache_len(),
        manager.cache_capacity(),
        metrics.memory_bytes
    );
}

fn print_help() {
    println!("Commands:");
    println!("  1,3,2          enter keys as taps");
    println!("  swipe DX DY    enter a swipe (y grows downward)");
    println!("  tap K          enter one key");
    println!("  delete         remove the last key");
    println!("  reset          clear the entered keys");
    println!("  commit [WORD]  accept WORD, or the top suggestion");
    println!("  layout NAME    switch layout");
    println!("  engine ID      switch prediction engine");
    println!("  stats          show engine metrics");
    println!();
}

fn repl(cli: &Cli) -> anyhow::Result<()> {
    println!("═══════════════════════════════════════════════════");
    println!("  swipekeys - Interactive Swipe Keyboard Test");
    println!("═══════════════════════════════════════════════════");
    println!();

    let (config, mut session) = build_session(cli)?;
    println!(
        "Ready! Layout '{}' ({:?}). Type 'help' for commands.",
        session.layout().name,
        session.layout().input_mode()
    );
    println!("Press Ctrl+C to exit.");
    println!();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let raw = match line {
            Ok(raw) => raw,
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        };
        let input = raw.trim();
        if input.is_empty() {
            continue;
        }
        let mut parts = input.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match (command, args.as_slice()) {
            ("help", _) => print_help(),
            ("quit" | "exit", _) => break,
            ("stats", _) => print_stats(&session),
            ("reset", _) => {
                session.reset();
                print_suggestions(&session);
            }
            ("delete", _) => {
                session.delete_last();
                print_suggestions(&session);
            }
            ("commit", []) => commit(&mut session, None),
            ("commit", [word]) => commit(&mut session, Some(*word)),
            ("swipe", [dx, dy]) => match (dx.parse::<f64>(), dy.parse::<f64>()) {
                (Ok(dx), Ok(dy)) => {
                    let event = session.swipe(SwipeVector::new(dx, dy));
                    report_event(&mut session, event);
                    print_suggestions(&session);
                }
                _ => eprintln!("  ⚠ usage: swipe DX DY"),
            },
            ("tap", [key]) => match key.parse::<usize>() {
                Ok(key) => {
                    let event = session.tap(key);
                    report_event(&mut session, event);
                    print_suggestions(&session);
                }
                Err(_) => eprintln!("  ⚠ usage: tap K"),
            },
            ("layout", [name]) => match switch_layout(&mut session, &config, name) {
                Ok(()) => println!("  ✓ layout {}", name),
                Err(e) => eprintln!("  ⚠ {}", e),
            },
            ("engine", [id]) => {
                if session.switch_engine(id) {
                    println!("  ✓ engine {}", id);
                } else {
                    eprintln!(
                        "  ⚠ engine '{}' unavailable (registered: {})",
                        id,
                        session.manager().engine_ids().join(", ")
                    );
                }
            }
            _ => match parse_keys(input) {
                Some(keys) => {
                    for key in keys {
                        let event = session.tap(key);
                        report_event(&mut session, event);
                    }
                    print_suggestions(&session);
                }
                None => eprintln!("  ⚠ unknown command '{}' (try 'help')", input),
            },
        }
    }
    Ok(())
}
