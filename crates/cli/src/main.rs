//! `trialmatch` — CLI entry point. Loads configuration, opens the document
//! store, runs the matching pipeline, and prints emitted `TrialMatch`
//! records as text or JSON.
//!
//! Grounded on `crates/cli/src/main.rs`'s clap derive `Parser`/`Subcommand`
//! conventions and exit-code discipline.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

mod config;
mod error;
mod pipeline;
mod store;

use config::AppConfig;
use error::MatchError;
use pipeline::{run_pipeline, TrialMatch};
use store::FileDocumentStore;

#[derive(Parser)]
#[command(name = "trialmatch", about = "Clinical-trial matching engine")]
struct Cli {
    /// Path to the TOML configuration file (store + concurrency + transforms).
    #[arg(long, global = true, default_value = "trialmatch.toml")]
    config: PathBuf,

    /// Enable debug-level logging.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the matching pipeline and emit `TrialMatch` records.
    #[command(after_help = "Example:\n  trialmatch match --protocol-no PN-1 --sample-id SID-1")]
    Match {
        #[arg(long = "protocol-no")]
        protocol_no: Vec<String>,

        #[arg(long = "sample-id")]
        sample_id: Vec<String>,

        /// Emit results as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(debug: bool) {
    let filter = if debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start async runtime: {err}");
            return ExitCode::from(1);
        }
    };
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> ExitCode {
    let Commands::Match { protocol_no, sample_id, json } = cli.command;

    match run_match(&cli.config, protocol_no, sample_id, json).await {
        Ok(()) => ExitCode::from(0),
        Err(MatchError::Config(msg)) => {
            eprintln!("configuration error: {msg}");
            ExitCode::from(1)
        }
        Err(MatchError::UnknownTransform(name)) => {
            eprintln!("configuration error: unknown transform '{name}'");
            ExitCode::from(1)
        }
        Err(MatchError::Store(err)) => {
            eprintln!("store connectivity error: {err}");
            ExitCode::from(2)
        }
    }
}

async fn run_match(config_path: &Path, protocol_no: Vec<String>, sample_id: Vec<String>, json: bool) -> Result<(), MatchError> {
    let config = AppConfig::load(config_path)?;
    let store = Arc::new(FileDocumentStore::load(&config.store.fixtures_dir).map_err(MatchError::Store)?);
    let cancel = CancellationToken::new();

    let protocol_filter = (!protocol_no.is_empty()).then_some(protocol_no);
    let sample_filter = (!sample_id.is_empty()).then_some(sample_id);

    let matches = run_pipeline(store, &config, protocol_filter, sample_filter, cancel).await?;

    if json {
        print_json(&matches);
    } else {
        print_text(&matches);
    }
    Ok(())
}

fn print_text(matches: &[TrialMatch]) {
    for m in matches {
        println!(
            "{} [{}] -> {} patient(s)",
            m.trial.protocol_no,
            m.match_clause_data.level,
            m.raw_results.len()
        );
        for result in &m.raw_results {
            println!("    {}", result.clinical_id);
        }
    }
}

fn print_json(matches: &[TrialMatch]) {
    let rows: Vec<_> = matches
        .iter()
        .map(|m| {
            serde_json::json!({
                "protocol_no": m.trial.protocol_no,
                "level": m.match_clause_data.level,
                "match_path": m.match_path,
                "query": {
                    "clinical": m.query.clinical,
                    "genomic": m.query.genomic,
                },
                "patients": m.raw_results.iter().map(|r| r.clinical_id.clone()).collect::<Vec<_>>(),
            })
        })
        .collect();
    match serde_json::to_string_pretty(&rows) {
        Ok(text) => println!("{text}"),
        Err(err) => eprintln!("failed to serialize results: {err}"),
    }
}
