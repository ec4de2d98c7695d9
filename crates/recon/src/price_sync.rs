//! Price reconciliation: promotion vs. genuine price change.
//!
//! Per product the state is either `no_price_set` or `has_price`. An observed
//! price that drops more than the promotion threshold below the catalog's
//! regular price is a promotion: the regular price stays, and the open
//! history record is replaced by one carrying the promo price. Anything else
//! beyond the negligible-change floor is a genuine price change.
//!
//! The engine never persists. It returns mutation requests; the caller
//! applies them (see [`apply_transitions`]) and decides what partial success
//! means.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::config::PriceSyncConfig;
use crate::model::{CatalogPrice, PriceHistoryRecord, PriceObservation, PriceSignal};
use crate::normalize::sku_key;
use crate::store::{PriceStore, StoreError};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceChangeKind {
    /// Catalog regular price is replaced.
    PriceChange,
    /// Temporary drop; regular price untouched.
    Promotion,
    /// Observed price is back at the regular price; promo cleared.
    PromotionEnded,
}

impl std::fmt::Display for PriceChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PriceChange => write!(f, "price_change"),
            Self::Promotion => write!(f, "promotion"),
            Self::PromotionEnded => write!(f, "promotion_ended"),
        }
    }
}

/// A side effect for the persistence layer to apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PriceMutation {
    UpdateCatalogPrice {
        product_id: String,
        old_price: Option<f64>,
        new_price: f64,
    },
    CloseHistory {
        product_id: String,
        valid_to: NaiveDate,
    },
    OpenHistory {
        record: PriceHistoryRecord,
    },
    InsertObservation {
        observation: PriceObservation,
    },
}

impl PriceMutation {
    pub fn op(&self) -> &'static str {
        match self {
            Self::UpdateCatalogPrice { .. } => "update_catalog_price",
            Self::CloseHistory { .. } => "close_history",
            Self::OpenHistory { .. } => "open_history",
            Self::InsertObservation { .. } => "insert_observation",
        }
    }
}

/// The classified outcome for one observed price, with its mutations in
/// application order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTransition {
    pub product_id: String,
    pub sku: String,
    pub kind: PriceChangeKind,
    pub old_price: Option<f64>,
    pub observed_price: f64,
    pub drop_percent: f64,
    pub mutations: Vec<PriceMutation>,
}

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum PriceSyncError {
    #[error("sku '{sku}': observed price {price} is not a positive number")]
    InvalidPrice { sku: String, price: f64 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncCounters {
    pub signals: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub prices_updated: usize,
    pub promotions_detected: usize,
    pub promotions_ended: usize,
    pub unchanged: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub counters: SyncCounters,
    pub transitions: Vec<PriceTransition>,
    /// Signals whose SKU is not in the catalog, kept for later mapping.
    pub unmatched: Vec<PriceSignal>,
    pub errors: Vec<PriceSyncError>,
}

impl SyncReport {
    /// All mutations, transition by transition.
    pub fn mutations(&self) -> impl Iterator<Item = &PriceMutation> {
        self.transitions.iter().flat_map(|t| t.mutations.iter())
    }
}

// ---------------------------------------------------------------------------
// Single product
// ---------------------------------------------------------------------------

/// Relative drop from `old` to `new`; 0 when `old` is not positive.
pub fn drop_percent(old_price: f64, new_price: f64) -> f64 {
    if old_price <= 0.0 {
        return 0.0;
    }
    (old_price - new_price) / old_price
}

/// Classify one observed price against a product's current state.
///
/// `Ok(None)` means nothing to do: the change is below the negligible floor,
/// or an ongoing promotion is observed again at the same price.
pub fn evaluate_price(
    current: &CatalogPrice,
    observed: f64,
    source: &str,
    observed_on: NaiveDate,
    today: NaiveDate,
    config: &PriceSyncConfig,
) -> Result<Option<PriceTransition>, PriceSyncError> {
    if !observed.is_finite() || observed <= 0.0 {
        return Err(PriceSyncError::InvalidPrice {
            sku: current.sku.clone(),
            price: observed,
        });
    }

    let floor = config.negligible_delta;
    let old = current.regular_price.filter(|p| *p > 0.0);

    let Some(old_price) = old else {
        return Ok(Some(build_transition(
            current,
            PriceChangeKind::PriceChange,
            observed,
            source,
            observed_on,
            today,
        )));
    };

    let kind = if let Some(promo) = current.active_promo {
        if (observed - promo).abs() < floor {
            return Ok(None);
        }
        if (observed - old_price).abs() < floor {
            PriceChangeKind::PromotionEnded
        } else {
            classify_change(old_price, observed, config)
        }
    } else {
        if (observed - old_price).abs() < floor {
            return Ok(None);
        }
        classify_change(old_price, observed, config)
    };

    Ok(Some(build_transition(current, kind, observed, source, observed_on, today)))
}

fn classify_change(old_price: f64, observed: f64, config: &PriceSyncConfig) -> PriceChangeKind {
    if drop_percent(old_price, observed) > config.promo_threshold {
        PriceChangeKind::Promotion
    } else {
        PriceChangeKind::PriceChange
    }
}

fn build_transition(
    current: &CatalogPrice,
    kind: PriceChangeKind,
    observed: f64,
    source: &str,
    observed_on: NaiveDate,
    today: NaiveDate,
) -> PriceTransition {
    let product_id = current.product_id.clone();
    let old_price = current.regular_price.filter(|p| *p > 0.0);
    let mut mutations = Vec::with_capacity(4);

    let (regular_price, promo_price) = match kind {
        PriceChangeKind::PriceChange => {
            mutations.push(PriceMutation::UpdateCatalogPrice {
                product_id: product_id.clone(),
                old_price,
                new_price: observed,
            });
            (observed, None)
        }
        // Both only arise from `has_price`.
        PriceChangeKind::Promotion => (old_price.unwrap_or(observed), Some(observed)),
        PriceChangeKind::PromotionEnded => (old_price.unwrap_or(observed), None),
    };

    if old_price.is_some() {
        mutations.push(PriceMutation::CloseHistory {
            product_id: product_id.clone(),
            valid_to: today,
        });
    }
    mutations.push(PriceMutation::OpenHistory {
        record: PriceHistoryRecord {
            product_id: product_id.clone(),
            valid_from: today,
            valid_to: None,
            regular_price,
            promo_price,
            cost_price: current.cost_price,
        },
    });
    mutations.push(PriceMutation::InsertObservation {
        observation: PriceObservation {
            product_id: product_id.clone(),
            source: source.to_string(),
            date: observed_on,
            price: observed,
            is_promo: kind == PriceChangeKind::Promotion,
        },
    });

    PriceTransition {
        product_id,
        sku: current.sku.clone(),
        kind,
        old_price,
        observed_price: observed,
        drop_percent: old_price.map_or(0.0, |old| drop_percent(old, observed)),
        mutations,
    }
}

/// Fold a transition back into the working state so later signals for the
/// same product see it.
fn advance(state: &mut CatalogPrice, transition: &PriceTransition) {
    match transition.kind {
        PriceChangeKind::PriceChange => {
            state.regular_price = Some(transition.observed_price);
            state.active_promo = None;
        }
        PriceChangeKind::Promotion => state.active_promo = Some(transition.observed_price),
        PriceChangeKind::PromotionEnded => state.active_promo = None,
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// Reconcile a batch of observed prices against the catalog.
///
/// Best-effort: an invalid signal is recorded in `errors` and the batch
/// continues. Unknown SKUs go to `unmatched`.
pub fn sync_prices(
    catalog: &[CatalogPrice],
    signals: &[PriceSignal],
    today: NaiveDate,
    config: &PriceSyncConfig,
) -> SyncReport {
    let mut state: HashMap<String, CatalogPrice> = catalog
        .iter()
        .map(|c| (sku_key(&c.sku), c.clone()))
        .collect();

    let mut report = SyncReport::default();
    report.counters.signals = signals.len();

    for signal in signals {
        let Some(current) = state.get_mut(&sku_key(&signal.sku)) else {
            log::debug!("unmatched sku '{}' from {}", signal.sku, signal.source);
            report.counters.unmatched += 1;
            report.unmatched.push(signal.clone());
            continue;
        };
        report.counters.matched += 1;

        match evaluate_price(current, signal.price, &signal.source, signal.date, today, config) {
            Ok(Some(transition)) => {
                log::debug!(
                    "{} {}: {:?} -> {:.2} ({})",
                    transition.sku,
                    transition.kind,
                    transition.old_price,
                    transition.observed_price,
                    signal.source
                );
                match transition.kind {
                    PriceChangeKind::PriceChange => report.counters.prices_updated += 1,
                    PriceChangeKind::Promotion => report.counters.promotions_detected += 1,
                    PriceChangeKind::PromotionEnded => report.counters.promotions_ended += 1,
                }
                advance(current, &transition);
                report.transitions.push(transition);
            }
            Ok(None) => report.counters.unchanged += 1,
            Err(err) => {
                log::warn!("{err}");
                report.counters.errors += 1;
                report.errors.push(err);
            }
        }
    }

    log::info!(
        "price sync: {} signals, {} matched, {} unmatched, {} updated, {} promotions, {} errors",
        report.counters.signals,
        report.counters.matched,
        report.counters.unmatched,
        report.counters.prices_updated,
        report.counters.promotions_detected,
        report.counters.errors
    );
    report
}

// ---------------------------------------------------------------------------
// Applying
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplyError {
    pub product_id: String,
    pub op: &'static str,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplyReport {
    pub transitions_applied: usize,
    pub mutations_applied: usize,
    pub errors: Vec<ApplyError>,
}

/// Apply transitions to a store. A failing mutation stops the rest of its own
/// transition only; the error is recorded and the batch moves on.
pub fn apply_transitions<S: PriceStore + ?Sized>(
    store: &mut S,
    transitions: &[PriceTransition],
) -> ApplyReport {
    let mut report = ApplyReport::default();
    for transition in transitions {
        let outcome: Result<(), (&'static str, StoreError)> = transition
            .mutations
            .iter()
            .try_for_each(|m| {
                store.apply(m).map_err(|e| (m.op(), e))?;
                report.mutations_applied += 1;
                Ok(())
            });
        match outcome {
            Ok(()) => report.transitions_applied += 1,
            Err((op, err)) => {
                log::warn!("{}: {op} failed: {err}", transition.product_id);
                report.errors.push(ApplyError {
                    product_id: transition.product_id.clone(),
                    op,
                    error: err.to_string(),
                });
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn priced(sku: &str, price: Option<f64>) -> CatalogPrice {
        CatalogPrice {
            product_id: format!("p_{sku}"),
            sku: sku.into(),
            regular_price: price,
            cost_price: Some(5.0),
            active_promo: None,
        }
    }

    fn eval(current: &CatalogPrice, observed: f64) -> Option<PriceTransition> {
        evaluate_price(current, observed, "monitor", day(2), day(3), &PriceSyncConfig::default()).unwrap()
    }

    fn opened(t: &PriceTransition) -> &PriceHistoryRecord {
        t.mutations
            .iter()
            .find_map(|m| match m {
                PriceMutation::OpenHistory { record } => Some(record),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn big_drop_is_promotion() {
        let t = eval(&priced("A", Some(37.0)), 17.0).unwrap();
        assert_eq!(t.kind, PriceChangeKind::Promotion);
        assert!(t.drop_percent > 0.5);
        assert!(!t.mutations.iter().any(|m| matches!(m, PriceMutation::UpdateCatalogPrice { .. })));
        let record = opened(&t);
        assert_eq!(record.regular_price, 37.0);
        assert_eq!(record.promo_price, Some(17.0));
        assert_eq!(record.valid_from, day(3));
        assert_eq!(record.cost_price, Some(5.0));
        assert!(t.mutations.contains(&PriceMutation::CloseHistory {
            product_id: "p_A".into(),
            valid_to: day(3),
        }));
    }

    #[test]
    fn small_rise_is_price_change() {
        let t = eval(&priced("A", Some(10.0)), 10.5).unwrap();
        assert_eq!(t.kind, PriceChangeKind::PriceChange);
        assert_eq!(
            t.mutations[0],
            PriceMutation::UpdateCatalogPrice {
                product_id: "p_A".into(),
                old_price: Some(10.0),
                new_price: 10.5,
            }
        );
        assert_eq!(t.mutations[1].op(), "close_history");
        let record = opened(&t);
        assert_eq!(record.regular_price, 10.5);
        assert_eq!(record.promo_price, None);
    }

    #[test]
    fn mild_drop_is_price_change() {
        // exactly 20% is not above the threshold
        let t = eval(&priced("A", Some(10.0)), 8.0).unwrap();
        assert_eq!(t.kind, PriceChangeKind::PriceChange);
    }

    #[test]
    fn negligible_delta_emits_nothing() {
        assert!(eval(&priced("A", Some(10.0)), 10.003).is_none());
    }

    #[test]
    fn unset_price_is_set_without_close() {
        let t = eval(&priced("A", None), 4.2).unwrap();
        assert_eq!(t.kind, PriceChangeKind::PriceChange);
        assert_eq!(t.old_price, None);
        assert_eq!(t.drop_percent, 0.0);
        let ops: Vec<_> = t.mutations.iter().map(PriceMutation::op).collect();
        assert_eq!(ops, vec!["update_catalog_price", "open_history", "insert_observation"]);

        // zero counts as unset
        let t = eval(&priced("A", Some(0.0)), 1.0).unwrap();
        assert_eq!(t.kind, PriceChangeKind::PriceChange);
    }

    #[test]
    fn observation_flags_promo() {
        let t = eval(&priced("A", Some(37.0)), 17.0).unwrap();
        let obs = t
            .mutations
            .iter()
            .find_map(|m| match m {
                PriceMutation::InsertObservation { observation } => Some(observation),
                _ => None,
            })
            .unwrap();
        assert!(obs.is_promo);
        assert_eq!(obs.date, day(2));
        assert_eq!(obs.source, "monitor");
    }

    #[test]
    fn ongoing_promotion_is_not_rewritten() {
        let mut state = priced("A", Some(37.0));
        state.active_promo = Some(17.0);
        assert!(eval(&state, 17.0).is_none());
    }

    #[test]
    fn promotion_ends_when_price_returns() {
        let mut state = priced("A", Some(37.0));
        state.active_promo = Some(17.0);
        let t = eval(&state, 37.0).unwrap();
        assert_eq!(t.kind, PriceChangeKind::PromotionEnded);
        let record = opened(&t);
        assert_eq!(record.regular_price, 37.0);
        assert_eq!(record.promo_price, None);
        assert!(!t.mutations.iter().any(|m| m.op() == "update_catalog_price"));
    }

    #[test]
    fn invalid_price_is_an_error() {
        let config = PriceSyncConfig::default();
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = evaluate_price(&priced("A", Some(1.0)), bad, "m", day(1), day(1), &config);
            assert!(err.is_err());
        }
    }

    #[test]
    fn custom_threshold() {
        let config = PriceSyncConfig {
            promo_threshold: 0.5,
            negligible_delta: 0.005,
        };
        let t = evaluate_price(&priced("A", Some(10.0)), 7.0, "m", day(1), day(1), &config)
            .unwrap()
            .unwrap();
        assert_eq!(t.kind, PriceChangeKind::PriceChange);
    }

    fn signal(sku: &str, price: f64) -> PriceSignal {
        PriceSignal {
            sku: sku.into(),
            price,
            source: "monitor".into(),
            date: day(2),
        }
    }

    #[test]
    fn batch_counts_and_continues_past_errors() {
        let catalog = vec![priced("A", Some(37.0)), priced("B", Some(10.0)), priced("C", Some(10.0))];
        let signals = vec![
            signal("A", 17.0),
            signal("b", 10.5),
            signal("C", -3.0),
            signal("C", 10.001),
            signal("ZZZ", 1.0),
        ];
        let report = sync_prices(&catalog, &signals, day(3), &PriceSyncConfig::default());
        let c = &report.counters;
        assert_eq!(c.signals, 5);
        assert_eq!(c.matched, 4);
        assert_eq!(c.unmatched, 1);
        assert_eq!(c.promotions_detected, 1);
        assert_eq!(c.prices_updated, 1);
        assert_eq!(c.errors, 1);
        assert_eq!(c.unchanged, 1);
        assert_eq!(report.transitions.len(), 2);
        assert_eq!(report.unmatched[0].sku, "ZZZ");
        assert_eq!(report.mutations().count(), 7);
    }

    #[test]
    fn batch_sees_earlier_signal_for_same_sku() {
        let catalog = vec![priced("A", Some(37.0))];
        let signals = vec![signal("A", 17.0), signal("A", 17.0), signal("A", 37.0)];
        let report = sync_prices(&catalog, &signals, day(3), &PriceSyncConfig::default());
        let kinds: Vec<_> = report.transitions.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![PriceChangeKind::Promotion, PriceChangeKind::PromotionEnded]);
        assert_eq!(report.counters.unchanged, 1);
    }
}
