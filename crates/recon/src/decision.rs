//! Match decision lifecycle: re-runs, human approval and rejection.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::ReconError;
use crate::model::{MatchDecision, ReviewOverride};

type PairKey = (String, String);

/// Counts from merging one matching run into a [`DecisionBook`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub inserted: usize,
    pub rescored: usize,
    /// Rescored decisions whose review override was kept.
    pub reviews_preserved: usize,
}

/// All decisions, keyed by (internal_id, candidate_id).
///
/// A candidate is approved for at most one internal product; any number of
/// unreviewed suggestions may coexist.
#[derive(Debug, Clone, Default)]
pub struct DecisionBook {
    decisions: BTreeMap<PairKey, MatchDecision>,
}

impl DecisionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load previously stored decisions. Later entries for the same pair win.
    /// A second approval of one candidate for a different product is refused.
    pub fn from_decisions(
        decisions: impl IntoIterator<Item = MatchDecision>,
    ) -> Result<Self, ReconError> {
        let mut book = Self::new();
        for d in decisions {
            if d.review == Some(ReviewOverride::Approved) {
                book.check_approvable(&d.internal_id, &d.candidate_id)?;
            }
            book.decisions
                .insert((d.internal_id.clone(), d.candidate_id.clone()), d);
        }
        Ok(book)
    }

    /// Merge a fresh run. Score, components and derived status are replaced;
    /// review overrides survive. Pairs absent from the run are left alone.
    pub fn merge_run(&mut self, fresh: impl IntoIterator<Item = MatchDecision>) -> MergeStats {
        let mut stats = MergeStats::default();
        for d in fresh {
            let key = (d.internal_id.clone(), d.candidate_id.clone());
            match self.decisions.get_mut(&key) {
                Some(existing) => {
                    existing.score = d.score;
                    existing.components = d.components;
                    existing.status = d.status;
                    if existing.review.is_some() {
                        stats.reviews_preserved += 1;
                    }
                    stats.rescored += 1;
                }
                None => {
                    self.decisions.insert(key, MatchDecision { review: None, ..d });
                    stats.inserted += 1;
                }
            }
        }
        stats
    }

    pub fn get(&self, internal_id: &str, candidate_id: &str) -> Option<&MatchDecision> {
        self.decisions
            .get(&(internal_id.to_string(), candidate_id.to_string()))
    }

    /// The internal product a candidate is approved for, if any.
    pub fn approved_for_candidate(&self, candidate_id: &str) -> Option<&str> {
        self.decisions
            .values()
            .find(|d| d.candidate_id == candidate_id && d.review == Some(ReviewOverride::Approved))
            .map(|d| d.internal_id.as_str())
    }

    fn check_approvable(&self, internal_id: &str, candidate_id: &str) -> Result<(), ReconError> {
        match self.approved_for_candidate(candidate_id) {
            Some(other) if other != internal_id => Err(ReconError::CandidateAlreadyApproved {
                candidate_id: candidate_id.to_string(),
                approved_for: other.to_string(),
            }),
            _ => Ok(()),
        }
    }

    pub fn approve(&mut self, internal_id: &str, candidate_id: &str) -> Result<(), ReconError> {
        self.check_approvable(internal_id, candidate_id)?;
        self.set_review(internal_id, candidate_id, ReviewOverride::Approved)
    }

    pub fn reject(&mut self, internal_id: &str, candidate_id: &str) -> Result<(), ReconError> {
        self.set_review(internal_id, candidate_id, ReviewOverride::Rejected)
    }

    fn set_review(
        &mut self,
        internal_id: &str,
        candidate_id: &str,
        review: ReviewOverride,
    ) -> Result<(), ReconError> {
        let key = (internal_id.to_string(), candidate_id.to_string());
        let decision = self
            .decisions
            .get_mut(&key)
            .ok_or_else(|| ReconError::UnknownDecision {
                internal_id: internal_id.to_string(),
                candidate_id: candidate_id.to_string(),
            })?;
        decision.review = Some(review);
        log::debug!("review {internal_id}/{candidate_id}: {review:?}");
        Ok(())
    }

    /// Decisions sorted by (internal_id, candidate_id).
    pub fn decisions(&self) -> impl Iterator<Item = &MatchDecision> {
        self.decisions.values()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}
