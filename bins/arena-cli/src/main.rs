mod commands;
mod terminal;

use anyhow::Result;
use arena_common::types::Language;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "arena-cli")]
#[command(about = "Arena CLI - Run, submit and diagnose solutions from the terminal", long_about = None)]
struct Cli {
    /// Workspace config file (JSON). Falls back to ARENA_* env vars
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print the workspace snapshot as JSON instead of a console report
    #[arg(long, global = true, default_value = "false")]
    json: bool,

    /// Emit logs as JSON
    #[arg(long, global = true, default_value = "false")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a solution against the sample test cases
    Run {
        /// Problem identifier
        #[arg(short, long)]
        problem: String,

        /// Language (python, cpp, c, java, javascript, rust)
        #[arg(short, long, value_parser = parse_language)]
        lang: Language,

        /// Source file
        #[arg(short, long)]
        file: PathBuf,

        /// Custom stdin instead of the sample cases
        #[arg(short, long, conflicts_with = "input_file")]
        input: Option<String>,

        /// Read custom stdin from a file
        #[arg(long)]
        input_file: Option<PathBuf>,

        /// Number of sample cases (drives the progress display)
        #[arg(long, default_value = "0")]
        cases: u32,
    },

    /// Submit a solution for grading against every test case
    Submit {
        /// Problem identifier
        #[arg(short, long)]
        problem: String,

        /// Language (python, cpp, c, java, javascript, rust)
        #[arg(short, long, value_parser = parse_language)]
        lang: Language,

        /// Source file
        #[arg(short, long)]
        file: PathBuf,

        /// Skip the confirmation prompt
        #[arg(short, long, default_value = "false")]
        yes: bool,

        /// Total number of test cases (drives the progress display)
        #[arg(long, default_value = "0")]
        cases: u32,
    },

    /// Map compiler output onto source lines without calling the judge
    Diagnose {
        /// Source file
        #[arg(short, long)]
        file: PathBuf,

        /// File holding the compiler output (stdin when omitted)
        #[arg(short, long)]
        errors: Option<PathBuf>,
    },

    /// Check whether a snippet would count as an external paste
    Paste {
        /// Source file the snippet is pasted into
        #[arg(short, long)]
        file: PathBuf,

        /// File holding the pasted text
        #[arg(short, long)]
        snippet: PathBuf,

        /// Answer yes to the paste confirmation
        #[arg(short, long, default_value = "false")]
        yes: bool,
    },
}

fn parse_language(s: &str) -> std::result::Result<Language, String> {
    Language::from_str(s).ok_or_else(|| format!("unsupported language '{}'", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Run {
            problem,
            lang,
            file,
            input,
            input_file,
            cases,
        } => {
            let custom_input = match (input, input_file) {
                (Some(text), _) => Some(text),
                (None, Some(path)) => Some(terminal::read_text(&path)?),
                (None, None) => None,
            };
            commands::run(config, &problem, lang, &file, custom_input.as_deref(), cases, cli.json).await?;
        }
        Commands::Submit {
            problem,
            lang,
            file,
            yes,
            cases,
        } => {
            commands::submit(config, &problem, lang, &file, yes, cases, cli.json).await?;
        }
        Commands::Diagnose { file, errors } => {
            commands::diagnose(&file, errors.as_deref(), cli.json)?;
        }
        Commands::Paste { file, snippet, yes } => {
            commands::paste(config, &file, &snippet, yes)?;
        }
    }

    Ok(())
}
