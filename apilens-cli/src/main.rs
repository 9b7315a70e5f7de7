// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  apilens: access-log analytics
//
//  Input:   JSON array or JSON Lines file (built-in demo batch if omitted)
//  Config:  YAML file + APILENS_* env overrides
//  Output:  JSON report on stdout, logs on stderr
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use anyhow::Context;
use apilens_analytics::Analyzer;
use apilens_cli::{input, logging};
use apilens_core::{AnalyzerConfig, ApilensError};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "apilens", version, about = "apilens: batch analytics over HTTP access logs")]
struct Cli {
    /// Access-log records (JSON array or JSON Lines). Uses a demo batch when omitted.
    input: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, default_value = "apilens.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Print the report on a single line
    #[arg(long)]
    compact: bool,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing(&cli.log_level, cli.log_json);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "apilens failed");
            match e.downcast_ref::<ApilensError>() {
                Some(api) => {
                    eprintln!("{}", api.to_json_body());
                    ExitCode::from(api.exit_code() as u8)
                }
                None => {
                    eprintln!("error: {e:#}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    // ── Config ──
    let config = if cli.config.exists() {
        info!(path = %cli.config.display(), "Loading config file");
        AnalyzerConfig::load(&cli.config)
            .map_err(|e| ApilensError::ConfigError(format!("{}: {e}", cli.config.display())))?
    } else {
        info!("No config file found, using defaults");
        AnalyzerConfig::default()
    };

    if cli.print_config {
        print!("{}", serde_yaml::to_string(&config).context("rendering configuration")?);
        return Ok(());
    }

    // ── Input ──
    let records = match &cli.input {
        Some(path) => {
            info!(path = %path.display(), "Loading access log records");
            input::load_records(path)?
        }
        None => {
            info!("No input given, analyzing the demo batch");
            input::demo_records()
        }
    };

    // ── Analysis ──
    let report = Analyzer::new(config).analyze(&records);
    let rendered = if cli.compact {
        report.to_json()
    } else {
        report.to_json_pretty()
    };
    println!("{}", rendered.map_err(ApilensError::from)?);
    Ok(())
}
