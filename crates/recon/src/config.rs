use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Engine tunables. Every section is optional; missing values fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default)]
    pub weights: WeightConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub attributes: AttributeConfig,
    #[serde(default)]
    pub price_sync: PriceSyncConfig,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Composite score weights. Must sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeightConfig {
    pub name: f64,
    pub brand: f64,
    pub size: f64,
    pub category: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            name: 0.40,
            brand: 0.25,
            size: 0.20,
            category: 0.15,
        }
    }
}

impl WeightConfig {
    pub fn total(&self) -> f64 {
        self.name + self.brand + self.size + self.category
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdConfig {
    /// Score at or above which a match is accepted without review.
    pub auto_match: f64,
    /// Score at or above which a match is queued for review.
    pub review: f64,
    /// Batch matcher drops candidates scoring below this.
    pub batch_min_score: f64,
    /// Single-product check ignores candidates scoring below this.
    pub single_min_score: f64,
    /// Batch matcher result limit when the caller gives none.
    pub top_n: usize,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            auto_match: 0.85,
            review: 0.60,
            batch_min_score: 0.5,
            single_min_score: 0.3,
            top_n: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttributeConfig {
    /// Score for an attribute missing on either side.
    pub neutral: f64,
    /// Score when one normalized value contains the other.
    pub containment: f64,
    /// Fuzzy brand similarity must exceed this to count at all.
    pub brand_fuzzy_floor: f64,
    /// Relative size gap treated as identical (0.05 = 5%).
    pub size_tolerance: f64,
}

impl Default for AttributeConfig {
    fn default() -> Self {
        Self {
            neutral: 0.5,
            containment: 0.8,
            brand_fuzzy_floor: 0.7,
            size_tolerance: 0.05,
        }
    }
}

// ---------------------------------------------------------------------------
// Price sync
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriceSyncConfig {
    /// Relative drop above which an observed price is treated as a promotion.
    pub promo_threshold: f64,
    /// Absolute deltas below this (currency units) are ignored.
    pub negligible_delta: f64,
}

impl Default for PriceSyncConfig {
    fn default() -> Self {
        Self {
            promo_threshold: 0.20,
            negligible_delta: 0.005,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let w = &self.weights;
        for (field, value) in [
            ("name", w.name),
            ("brand", w.brand),
            ("size", w.size),
            ("category", w.category),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ReconError::ConfigValidation(format!(
                    "weights.{field} must be within [0, 1], got {value}"
                )));
            }
        }
        if (w.total() - 1.0).abs() > 0.001 {
            return Err(ReconError::ConfigValidation(format!(
                "weights must sum to 1.0, got {:.3}",
                w.total()
            )));
        }

        let t = &self.thresholds;
        if !(0.0 <= t.review && t.review <= t.auto_match && t.auto_match <= 1.0) {
            return Err(ReconError::ConfigValidation(format!(
                "thresholds must satisfy 0 <= review <= auto_match <= 1, got review={} auto_match={}",
                t.review, t.auto_match
            )));
        }
        for (field, value) in [
            ("batch_min_score", t.batch_min_score),
            ("single_min_score", t.single_min_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ReconError::ConfigValidation(format!(
                    "thresholds.{field} must be within [0, 1], got {value}"
                )));
            }
        }
        if t.top_n == 0 {
            return Err(ReconError::ConfigValidation(
                "thresholds.top_n must be at least 1".into(),
            ));
        }

        let a = &self.attributes;
        for (field, value) in [
            ("neutral", a.neutral),
            ("containment", a.containment),
            ("brand_fuzzy_floor", a.brand_fuzzy_floor),
            ("size_tolerance", a.size_tolerance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ReconError::ConfigValidation(format!(
                    "attributes.{field} must be within [0, 1], got {value}"
                )));
            }
        }

        let p = &self.price_sync;
        if !(p.promo_threshold > 0.0 && p.promo_threshold < 1.0) {
            return Err(ReconError::ConfigValidation(format!(
                "price_sync.promo_threshold must be within (0, 1), got {}",
                p.promo_threshold
            )));
        }
        if !(p.negligible_delta >= 0.0 && p.negligible_delta.is_finite()) {
            return Err(ReconError::ConfigValidation(format!(
                "price_sync.negligible_delta must be a non-negative number, got {}",
                p.negligible_delta
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
