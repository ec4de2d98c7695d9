// Shelfwise CLI - product matching and price reconciliation from CSV feeds

mod classify;
mod config;
mod exit_codes;
mod feeds;
mod matching;
mod sync;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use exit_codes::{EXIT_INVALID_CONFIG, EXIT_IO, EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "shelfwise")]
#[command(about = "Match a retail catalog against competitor feeds and reconcile shelf prices")]
#[command(version)]
#[command(long_version = long_version())]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Errors only
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the feed type of a CSV file and validate its rows
    #[command(after_help = "\
Examples:
  shelfwise classify products.csv
  shelfwise classify monitoring.csv --json")]
    Classify {
        /// CSV file to classify
        file: PathBuf,

        /// Print the typed rows and import summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score every catalog product against a candidate feed
    #[command(after_help = "\
Examples:
  shelfwise match --catalog products.csv --candidates rival.csv
  shelfwise match --catalog products.csv --candidates rival.csv --top 3 --json
  shelfwise match --catalog products.csv --candidates rival.csv --config tuned.toml --output run.json")]
    Match {
        /// Product feed with the internal catalog
        #[arg(long)]
        catalog: PathBuf,

        /// Product feed with competitor / supplier candidates
        #[arg(long)]
        candidates: PathBuf,

        /// Source label for candidate ids (`<source>:<sku>`)
        #[arg(long, default_value = "competitor")]
        source: String,

        /// Candidates kept per product (defaults to thresholds.top_n)
        #[arg(long)]
        top: Option<usize>,

        /// Engine tunables (TOML)
        #[arg(long, env = "SHELFWISE_CONFIG")]
        config: Option<PathBuf>,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Find the best candidate for a single catalog SKU
    #[command(after_help = "\
Examples:
  shelfwise check --catalog products.csv --candidates rival.csv --sku A300")]
    Check {
        #[arg(long)]
        catalog: PathBuf,

        #[arg(long)]
        candidates: PathBuf,

        /// Catalog SKU to check
        #[arg(long)]
        sku: String,

        #[arg(long, default_value = "competitor")]
        source: String,

        #[arg(long, env = "SHELFWISE_CONFIG")]
        config: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Reconcile observed prices from a monitoring feed against the catalog
    #[command(after_help = "\
Exit code 20 means some signals or store writes failed; everything else was applied.

Examples:
  shelfwise sync --catalog products.csv --feed monitoring.csv
  shelfwise sync --catalog products.csv --feed monitoring.csv --date 2026-03-02 --json")]
    Sync {
        #[arg(long)]
        catalog: PathBuf,

        /// Monitoring feed (Product Code, My Price, ...)
        #[arg(long)]
        feed: PathBuf,

        /// Observation source label
        #[arg(long, default_value = "monitoring")]
        source: String,

        /// Effective date for history records (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long, env = "SHELFWISE_CONFIG")]
        config: Option<PathBuf>,

        #[arg(long)]
        json: bool,

        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Engine configuration
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("SHELFWISE_COMMIT"), ")",
        "\nengine:  shelfwise-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("SHELFWISE_TARGET"),
    )
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = match cli.command {
        Commands::Classify { file, json } => classify::cmd_classify(file, json),
        Commands::Match {
            catalog,
            candidates,
            source,
            top,
            config,
            json,
            output,
        } => matching::cmd_match(catalog, candidates, source, top, config, json, output),
        Commands::Check {
            catalog,
            candidates,
            sku,
            source,
            config,
            json,
        } => matching::cmd_check(catalog, candidates, sku, source, config, json),
        Commands::Sync {
            catalog,
            feed,
            source,
            date,
            config,
            json,
            output,
        } => sync::cmd_sync(catalog, feed, source, date, config, json, output),
        Commands::Config { command } => config::cmd_config(command),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::new(EXIT_PARSE, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(EXIT_INVALID_CONFIG, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Serialize `value` once; write it to `output` and/or stdout.
pub fn emit_json<T: serde::Serialize>(
    value: &T,
    json: bool,
    output: Option<&PathBuf>,
) -> Result<(), CliError> {
    if !json && output.is_none() {
        return Ok(());
    }
    let json_str = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::new(exit_codes::EXIT_ERROR, format!("JSON serialization error: {e}")))?;

    if let Some(path) = output {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }
    if json {
        println!("{json_str}");
    }
    Ok(())
}
