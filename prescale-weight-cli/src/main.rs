//! Prescale Weight CLI Application
//!
//! This is the command-line interface for the prescale weight calculator.
//! It uses the prescale-weight library and adds:
//! - TOML configuration with command-line overrides
//! - Replay of recorded run/event trigger data, one stream per file
//! - Report generation (TXT/JSON)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

mod config;
mod replay;
mod report;

use config::{AppConfig, OutputFormat};

/// Prescale Weight - Combined HLT x L1 prescale weights for recorded events
#[derive(Parser, Debug)]
#[command(name = "prescale-weight")]
#[command(about = "Compute combined trigger prescale weights for recorded events", long_about = None)]
#[command(version)]
struct Args {
    /// Recording file(s) to replay (JSON)
    #[arg(value_name = "RECORDING", required = true)]
    recordings: Vec<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// HLT path of interest (can be repeated; replaces the configured list)
    #[arg(short = 'p', long = "path", value_name = "NAME")]
    paths: Vec<String>,

    /// Trigger results tag, e.g. "TriggerResults::HLT"
    #[arg(long, value_name = "TAG")]
    trigger_results: Option<String>,

    /// L1 menu tag, e.g. "l1GtTriggerMenuLite"
    #[arg(long, value_name = "TAG")]
    l1_menu: Option<String>,

    /// Diagnostic verbosity of the weight calculator (0 = silent)
    #[arg(long, value_name = "LEVEL")]
    verbosity: Option<u32>,

    /// Report format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file for the report (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Only print the summary
    #[arg(long)]
    summary_only: bool,

    /// Log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Prescale Weight CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using prescale-weight library v{}", prescale_weight::VERSION);

    let config = resolve_config(&args)?;
    log::debug!("Effective configuration: {:?}", config.prescale_weight);

    let reports = replay::replay_files(&args.recordings, &config.prescale_weight)?;

    let text = report::render(
        config.output.format,
        &reports,
        config.output.per_event,
        chrono::Utc::now(),
    )?;

    match &config.output.file {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => print!("{}", text),
    }

    Ok(())
}

/// Load the config file (if any) and apply command-line overrides
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    let weight = &mut config.prescale_weight;
    if !args.paths.is_empty() {
        weight.hlt_paths = args.paths.clone();
    }
    if let Some(tag) = &args.trigger_results {
        weight.trigger_results = tag
            .parse()
            .with_context(|| format!("Invalid --trigger-results tag: {}", tag))?;
    }
    if let Some(tag) = &args.l1_menu {
        weight.l1_menu = tag
            .parse()
            .with_context(|| format!("Invalid --l1-menu tag: {}", tag))?;
    }
    if let Some(verbosity) = args.verbosity {
        weight.verbosity = verbosity;
    }

    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(output) = &args.output {
        config.output.file = Some(output.clone());
    }
    if args.summary_only {
        config.output.per_event = false;
    }

    if let Err(e) = config.prescale_weight.validate() {
        log::warn!("Weighting disabled, every event gets weight 1: {}", e);
    }

    Ok(config)
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
