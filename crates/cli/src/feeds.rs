//! Loading CSV feeds and config files for the commands.

use std::path::Path;

use shelfwise_recon::etl::{classify_rows, EtlOutcome, FeedKind, ImportSummary, MonitoringRow, ProductRow};
use shelfwise_recon::table::RawTable;
use shelfwise_recon::ReconConfig;

use crate::exit_codes::{EXIT_UNKNOWN_FEED, EXIT_WRONG_FEED};
use crate::CliError;

pub fn read_table(path: &Path) -> Result<RawTable, CliError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
    RawTable::from_csv(&data).map_err(|e| CliError::parse(format!("{}: {e}", path.display())))
}

/// Read and classify a feed. An unrecognized layout is an error here.
pub fn load_feed(path: &Path) -> Result<EtlOutcome, CliError> {
    let table = read_table(path)?;
    match classify_rows(&table.headers, &table.rows) {
        EtlOutcome::Unknown { message, .. } => Err(CliError::new(
            EXIT_UNKNOWN_FEED,
            format!("{}: {message}", path.display()),
        )
        .with_hint("run `shelfwise classify` on the file to see its headers")),
        outcome => Ok(outcome),
    }
}

fn wrong_feed(path: &Path, expected: FeedKind, got: Option<FeedKind>) -> CliError {
    let got = got.map(|k| k.to_string()).unwrap_or_else(|| "unknown".into());
    CliError::new(
        EXIT_WRONG_FEED,
        format!("{}: expected a {expected} feed, found a {got} feed", path.display()),
    )
}

pub fn report_skips(path: &Path, summary: &ImportSummary) {
    if summary.skipped.is_empty() {
        return;
    }
    let parts: Vec<String> = summary
        .skipped
        .iter()
        .map(|(reason, n)| format!("{n} {reason}"))
        .collect();
    eprintln!(
        "{}: {} of {} rows skipped ({})",
        path.display(),
        summary.skipped_total(),
        summary.total_rows,
        parts.join(", ")
    );
}

pub fn load_products(path: &Path) -> Result<Vec<ProductRow>, CliError> {
    match load_feed(path)? {
        EtlOutcome::Product { rows, summary } => {
            report_skips(path, &summary);
            Ok(rows)
        }
        other => Err(wrong_feed(path, FeedKind::Product, other.kind())),
    }
}

pub fn load_monitoring(path: &Path) -> Result<Vec<MonitoringRow>, CliError> {
    match load_feed(path)? {
        EtlOutcome::Monitoring { rows, summary } => {
            report_skips(path, &summary);
            Ok(rows)
        }
        other => Err(wrong_feed(path, FeedKind::Monitoring, other.kind())),
    }
}

/// Defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<ReconConfig, CliError> {
    let Some(path) = path else {
        return Ok(ReconConfig::default());
    };
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
    ReconConfig::from_toml(&config_str)
        .map_err(|e| CliError::config(format!("{}: {e}", path.display())))
}
