//! `shelfwise match` and `shelfwise check`.

use std::path::{Path, PathBuf};

use shelfwise_recon::model::{CandidateProduct, InternalProduct};
use shelfwise_recon::{check_single, match_catalog};

use crate::exit_codes::{EXIT_MATCH_NONE, EXIT_MATCH_UNKNOWN_SKU};
use crate::feeds::{load_config, load_products};
use crate::{emit_json, CliError};

fn load_catalog(path: &Path) -> Result<Vec<InternalProduct>, CliError> {
    Ok(load_products(path)?
        .iter()
        .map(|r| r.to_internal_product(&r.sku))
        .collect())
}

fn load_candidates(path: &Path, source: &str) -> Result<Vec<CandidateProduct>, CliError> {
    Ok(load_products(path)?
        .iter()
        .map(|r| r.to_candidate(source))
        .collect())
}

pub fn cmd_match(
    catalog: PathBuf,
    candidates: PathBuf,
    source: String,
    top: Option<usize>,
    config_path: Option<PathBuf>,
    json: bool,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let mut config = load_config(config_path.as_deref())?;
    match top {
        Some(0) => return Err(CliError::args("--top must be at least 1")),
        Some(n) => config.thresholds.top_n = n,
        None => {}
    }

    let products = load_catalog(&catalog)?;
    let candidates = load_candidates(&candidates, &source)?;
    let run = match_catalog(&products, &candidates, &config);

    emit_json(&run, json, output.as_ref())?;

    let s = &run.summary;
    eprintln!(
        "matched {} products against {} candidates: {} auto-matched, {} pending review, {} rejected, {} without candidates",
        s.products, s.candidates, s.auto_matched, s.pending, s.rejected, s.unmatched_products,
    );
    Ok(())
}

pub fn cmd_check(
    catalog: PathBuf,
    candidates: PathBuf,
    sku: String,
    source: String,
    config_path: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?;
    let products = load_catalog(&catalog)?;
    let wanted = sku.trim().to_lowercase();
    let product = products
        .iter()
        .find(|p| p.sku.trim().to_lowercase() == wanted)
        .ok_or_else(|| {
            CliError::new(
                EXIT_MATCH_UNKNOWN_SKU,
                format!("SKU '{sku}' not found in {}", catalog.display()),
            )
        })?;

    let candidates = load_candidates(&candidates, &source)?;
    let check = check_single(product, &candidates, &config).ok_or_else(|| {
        CliError::new(
            EXIT_MATCH_NONE,
            format!(
                "no candidate for '{}' scored {} or higher",
                product.sku, config.thresholds.single_min_score
            ),
        )
    })?;

    emit_json(&check, json, None)?;

    let c = &check.best.score.components;
    eprintln!(
        "{} -> {} ({}): score {:.3} [name {:.3}, brand {:.3}, size {:.3}, category {:.3}], auto-approve: {}",
        product.sku,
        check.best.candidate.id,
        check.best.candidate.name,
        check.best.score.score,
        c.name,
        c.brand,
        c.size,
        c.category,
        if check.auto_approve { "yes" } else { "no" },
    );
    Ok(())
}
