use serde::Serialize;

use crate::model::{EffectiveStatus, MatchDecision};

/// Totals for one matching run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub products: usize,
    pub candidates: usize,
    pub decisions: usize,
    /// Products with no candidate above the batch floor.
    pub unmatched_products: usize,
    pub auto_matched: usize,
    pub pending: usize,
    pub rejected: usize,
    pub approved: usize,
    pub review_rejected: usize,
}

/// Compute summary statistics from match decisions.
pub fn compute_match_summary(
    products: usize,
    candidates: usize,
    decisions: &[MatchDecision],
) -> MatchSummary {
    let mut summary = MatchSummary {
        products,
        candidates,
        decisions: decisions.len(),
        ..MatchSummary::default()
    };

    for d in decisions {
        match d.effective_status() {
            EffectiveStatus::AutoMatched => summary.auto_matched += 1,
            EffectiveStatus::Pending => summary.pending += 1,
            EffectiveStatus::Rejected => summary.rejected += 1,
            EffectiveStatus::Approved => summary.approved += 1,
            EffectiveStatus::ReviewRejected => summary.review_rejected += 1,
        }
    }

    let mut matched_products: Vec<&str> = decisions.iter().map(|d| d.internal_id.as_str()).collect();
    matched_products.sort_unstable();
    matched_products.dedup();
    summary.unmatched_products = products.saturating_sub(matched_products.len());

    summary
}
