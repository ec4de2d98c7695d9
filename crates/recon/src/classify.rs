//! Score → status classification.
//!
//! Two independent policies share one scorer:
//! - [`classify_by_score`] drives the bulk matching pass (auto / review / reject tiers).
//! - [`is_auto_approval_candidate`] gates auto-approval in the single-product
//!   check, which additionally demands a hard brand or size agreement.

use crate::config::ThresholdConfig;
use crate::model::{MatchScore, MatchStatus};

pub fn classify_by_score(score: f64, thresholds: &ThresholdConfig) -> MatchStatus {
    if score >= thresholds.auto_match {
        MatchStatus::AutoMatched
    } else if score >= thresholds.review {
        MatchStatus::Pending
    } else {
        MatchStatus::Rejected
    }
}

/// High score alone is not enough: brand must match exactly or sizes must agree.
pub fn is_auto_approval_candidate(score: &MatchScore, thresholds: &ThresholdConfig) -> bool {
    score.score >= thresholds.auto_match
        && (score.components.brand >= 1.0 || score.components.size >= 1.0)
}
