//! `shelfwise sync`: monitoring feed → price transitions → store.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use shelfwise_recon::model::PriceHistoryRecord;
use shelfwise_recon::price_sync::{ApplyReport, SyncReport};
use shelfwise_recon::store::MemoryStore;
use shelfwise_recon::{apply_transitions, sync_prices};

use crate::exit_codes::EXIT_SYNC_PARTIAL;
use crate::feeds::{load_config, load_monitoring, load_products};
use crate::{emit_json, CliError};

#[derive(Serialize)]
struct SyncOutput<'a> {
    date: NaiveDate,
    report: &'a SyncReport,
    applied: &'a ApplyReport,
    /// Price history after the run, all products.
    history: &'a [PriceHistoryRecord],
}

pub fn cmd_sync(
    catalog: PathBuf,
    feed: PathBuf,
    source: String,
    date: Option<NaiveDate>,
    config_path: Option<PathBuf>,
    json: bool,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?;
    let today = date.unwrap_or_else(|| chrono::Local::now().date_naive());

    let prices: Vec<_> = load_products(&catalog)?
        .iter()
        .map(|r| r.to_catalog_price(&r.sku))
        .collect();
    let signals: Vec<_> = load_monitoring(&feed)?
        .iter()
        .filter_map(|r| r.price_signal(&source, today))
        .collect();

    // Catalog prices predate this run; their history opens the day before.
    let since = today.pred_opt().unwrap_or(today);
    let mut store = MemoryStore::from_catalog(prices, since);

    let report = sync_prices(&store.catalog_prices(), &signals, today, &config.price_sync);
    let applied = apply_transitions(&mut store, &report.transitions);

    emit_json(
        &SyncOutput {
            date: today,
            report: &report,
            applied: &applied,
            history: store.history(),
        },
        json,
        output.as_ref(),
    )?;

    let c = &report.counters;
    eprintln!(
        "price sync {today}: {} signals, {} matched, {} unmatched; {} price changes, {} promotions, {} promotions ended, {} unchanged",
        c.signals,
        c.matched,
        c.unmatched,
        c.prices_updated,
        c.promotions_detected,
        c.promotions_ended,
        c.unchanged,
    );
    for err in &report.errors {
        eprintln!("  skipped: {err}");
    }
    for err in &applied.errors {
        eprintln!("  not applied: {} ({}: {})", err.product_id, err.op, err.error);
    }

    let failures = report.errors.len() + applied.errors.len();
    if failures > 0 {
        return Err(CliError::new(
            EXIT_SYNC_PARTIAL,
            format!("{failures} item(s) failed; the rest were applied"),
        ));
    }
    Ok(())
}
