//! `shelfwise classify`: feed detection and row validation.

use std::path::PathBuf;

use shelfwise_recon::etl::{classify_rows, EtlOutcome};

use crate::exit_codes::EXIT_UNKNOWN_FEED;
use crate::feeds::{read_table, report_skips};
use crate::{emit_json, CliError};

pub fn cmd_classify(file: PathBuf, json: bool) -> Result<(), CliError> {
    let table = read_table(&file)?;
    let outcome = classify_rows(&table.headers, &table.rows);

    emit_json(&outcome, json, None)?;

    if let EtlOutcome::Unknown { message, headers } = outcome {
        return Err(CliError::new(EXIT_UNKNOWN_FEED, message)
            .with_hint(format!("headers found: {}", headers.join(", "))));
    }

    if let (Some(kind), Some(summary)) = (outcome.kind(), outcome.summary()) {
        eprintln!(
            "{}: {kind} feed, {} of {} rows valid",
            file.display(),
            summary.valid_rows,
            summary.total_rows
        );
        report_skips(&file, summary);
    }
    Ok(())
}
