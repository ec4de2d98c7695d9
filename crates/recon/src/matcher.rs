use rayon::prelude::*;
use serde::Serialize;

use crate::classify::{classify_by_score, is_auto_approval_candidate};
use crate::config::ReconConfig;
use crate::evidence::{compute_match_summary, MatchSummary};
use crate::model::{CandidateProduct, InternalProduct, MatchDecision, MatchScore};
use crate::scorer::score;

/// A candidate with its score against one internal product.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub candidate: CandidateProduct,
    #[serde(flatten)]
    pub score: MatchScore,
}

/// Output of the bulk matching pass.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRun {
    pub summary: MatchSummary,
    pub decisions: Vec<MatchDecision>,
}

/// Output of the single-product check.
#[derive(Debug, Clone, Serialize)]
pub struct SingleCheck {
    pub internal_id: String,
    pub best: RankedCandidate,
    pub auto_approve: bool,
}

/// Score every candidate, keep those at or above the batch floor, best first.
///
/// Ties keep input order (stable sort). `top_n` defaults to the configured limit.
pub fn rank_candidates(
    internal: &InternalProduct,
    candidates: &[CandidateProduct],
    top_n: Option<usize>,
    config: &ReconConfig,
) -> Vec<RankedCandidate> {
    let limit = top_n.unwrap_or(config.thresholds.top_n);
    let floor = config.thresholds.batch_min_score;

    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .map(|c| RankedCandidate {
            candidate: c.clone(),
            score: score(internal, c, config),
        })
        .filter(|r| r.score.score >= floor)
        .collect();

    ranked.sort_by(|a, b| b.score.score.total_cmp(&a.score.score));
    ranked.truncate(limit);
    ranked
}

fn to_decision(internal: &InternalProduct, ranked: &RankedCandidate, config: &ReconConfig) -> MatchDecision {
    MatchDecision {
        internal_id: internal.id.clone(),
        candidate_id: ranked.candidate.id.clone(),
        score: ranked.score.score,
        components: ranked.score.components,
        status: classify_by_score(ranked.score.score, &config.thresholds),
        review: None,
    }
}

/// Bulk pass: rank candidates for every catalog product and derive a status
/// for each surviving pair. Products are scored in parallel; output order
/// follows `products`.
pub fn match_catalog(
    products: &[InternalProduct],
    candidates: &[CandidateProduct],
    config: &ReconConfig,
) -> MatchRun {
    let decisions: Vec<MatchDecision> = products
        .par_iter()
        .map(|p| {
            rank_candidates(p, candidates, None, config)
                .iter()
                .map(|r| to_decision(p, r, config))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect();

    let summary = compute_match_summary(products.len(), candidates.len(), &decisions);
    log::info!(
        "matched {} products against {} candidates: {} auto, {} pending, {} rejected",
        products.len(),
        candidates.len(),
        summary.auto_matched,
        summary.pending,
        summary.rejected
    );

    MatchRun { summary, decisions }
}

/// Single-product pass: best candidate above the lower single-check floor,
/// with the stricter auto-approval predicate applied.
pub fn check_single(
    internal: &InternalProduct,
    candidates: &[CandidateProduct],
    config: &ReconConfig,
) -> Option<SingleCheck> {
    let mut best: Option<RankedCandidate> = None;
    for c in candidates {
        let s = score(internal, c, config);
        if s.score < config.thresholds.single_min_score {
            continue;
        }
        if best.as_ref().map_or(true, |b| s.score > b.score.score) {
            best = Some(RankedCandidate {
                candidate: c.clone(),
                score: s,
            });
        }
    }

    let best = best?;
    let auto_approve = is_auto_approval_candidate(&best.score, &config.thresholds);
    log::debug!(
        "single check {}: best {} at {:.3} (auto_approve={auto_approve})",
        internal.id,
        best.candidate.id,
        best.score.score
    );
    Some(SingleCheck {
        internal_id: internal.id.clone(),
        best,
        auto_approve,
    })
}
