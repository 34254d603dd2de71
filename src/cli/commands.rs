//! CLI command definitions for swe-recover.

use crate::classify::Classifier;
use crate::detector::{DetectorConfig, ErrorDetector};
use crate::replay::replay_stream;
use crate::suggest::SuggestionTemplates;
use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use tracing::info;

/// Error-recovery trace tooling for autonomous SWE agents.
#[derive(Parser)]
#[command(name = "swe-recover")]
#[command(about = "Replay and audit error-recovery traces from SWE agent runs")]
#[command(version)]
#[command(
    long_about = "swe-recover replays JSONL streams of error events through the same detector a live agent uses, re-deriving loop detections, recovery suggestions and per-instance statistics.\n\nExample usage:\n  swe-recover replay --input trace.jsonl\n  swe-recover classify \"SyntaxError: invalid syntax\""
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Replay a recorded event stream through a detector, one reset per
    /// task instance, and report suggestions and statistics.
    Replay(ReplayArgs),

    /// Classify diagnostic messages onto the closed error taxonomy.
    Classify(ClassifyArgs),
}

/// Arguments for `swe-recover replay`.
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// Input JSONL file of recorded events ("-" for stdin).
    #[arg(short, long, default_value = "-")]
    pub input: String,

    /// YAML file overriding the builtin suggestion templates.
    #[arg(short, long, env = "SWE_RECOVER_TEMPLATES")]
    pub templates: Option<PathBuf>,

    /// Override the loop-detection window size.
    #[arg(long)]
    pub window: Option<usize>,

    /// Override the repetition streak required to flag a loop.
    #[arg(long)]
    pub streak: Option<usize>,

    /// Print the full report as JSON instead of text.
    #[arg(short = 'j', long)]
    pub json: bool,

    /// Print fired suggestion bodies, not just their reasons.
    #[arg(long)]
    pub show_suggestions: bool,
}

/// Arguments for `swe-recover classify`.
#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    /// Message to classify. Reads one message per line from stdin when
    /// omitted.
    pub message: Option<String>,
}

/// Parse command-line arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parse arguments and run the selected command.
pub fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli())
}

/// Run the selected command with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Replay(args) => run_replay(args),
        Commands::Classify(args) => run_classify(args),
    }
}

fn run_replay(args: ReplayArgs) -> anyhow::Result<()> {
    let mut config = DetectorConfig::default();
    if let Some(window) = args.window {
        config = config.with_window(window);
    }
    if let Some(streak) = args.streak {
        config = config.with_streak(streak);
    }

    let mut detector = ErrorDetector::with_config(config);
    if let Some(path) = &args.templates {
        let templates = SuggestionTemplates::from_yaml_file(path)
            .with_context(|| format!("loading templates from {}", path.display()))?;
        detector = detector.with_templates(templates);
        info!("Loaded suggestion templates from {}", path.display());
    }

    let report = if args.input == "-" {
        replay_stream(io::stdin().lock(), &mut detector)?
    } else {
        let file = File::open(&args.input)
            .with_context(|| format!("opening event stream {}", args.input))?;
        replay_stream(BufReader::new(file), &mut detector)?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print!("{}", report.render_text());
    if args.show_suggestions {
        for instance in &report.instances {
            for fired in &instance.suggestions {
                println!(
                    "\n--- suggestion #{} (instance {}) ---",
                    fired.sequence_index, instance.instance
                );
                println!("{}", fired.text);
            }
        }
    }
    Ok(())
}

fn run_classify(args: ClassifyArgs) -> anyhow::Result<()> {
    let classifier = Classifier::new();
    match args.message {
        Some(message) => {
            println!("{}", classifier.classify(&message));
        }
        None => {
            for line in io::stdin().lock().lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                println!("{}\t{}", classifier.classify(&line), line);
            }
        }
    }
    Ok(())
}
