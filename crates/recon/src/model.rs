use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// A catalog product. Always the left side of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalProduct {
    pub id: String,
    pub sku: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Free-text size/volume/weight, e.g. "500 ml" or "6x330ml".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
}

impl InternalProduct {
    /// Category used for scoring: the category, or the subcategory when no
    /// category is recorded.
    pub fn scoring_category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or(self.subcategory.as_deref())
    }
}

/// A competitor or monitoring-feed product that may denote a catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProduct {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_price: Option<f64>,
    /// Site or feed identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Stable SKU on the external side; later observations supersede earlier ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_sku: Option<String>,
}

// ---------------------------------------------------------------------------
// Match scoring
// ---------------------------------------------------------------------------

/// Per-attribute similarities, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchComponents {
    pub name: f64,
    pub brand: f64,
    pub size: f64,
    pub category: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    /// Weighted composite, rounded to 3 decimals.
    pub score: f64,
    pub components: MatchComponents,
}

// ---------------------------------------------------------------------------
// Match decisions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Rejected,
    Pending,
    AutoMatched,
}

impl MatchStatus {
    /// Confidence rank: rejected < pending < auto_matched.
    pub fn rank(self) -> u8 {
        match self {
            Self::Rejected => 0,
            Self::Pending => 1,
            Self::AutoMatched => 2,
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected => write!(f, "rejected"),
            Self::Pending => write!(f, "pending"),
            Self::AutoMatched => write!(f, "auto_matched"),
        }
    }
}

/// Human review outcome. Supersedes the derived status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOverride {
    Approved,
    Rejected,
}

/// What a decision resolves to once review overrides are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveStatus {
    AutoMatched,
    Pending,
    Rejected,
    Approved,
    ReviewRejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDecision {
    pub internal_id: String,
    pub candidate_id: String,
    pub score: f64,
    pub components: MatchComponents,
    pub status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewOverride>,
}

impl MatchDecision {
    pub fn effective_status(&self) -> EffectiveStatus {
        match (self.review, self.status) {
            (Some(ReviewOverride::Approved), _) => EffectiveStatus::Approved,
            (Some(ReviewOverride::Rejected), _) => EffectiveStatus::ReviewRejected,
            (None, MatchStatus::AutoMatched) => EffectiveStatus::AutoMatched,
            (None, MatchStatus::Pending) => EffectiveStatus::Pending,
            (None, MatchStatus::Rejected) => EffectiveStatus::Rejected,
        }
    }
}

// ---------------------------------------------------------------------------
// Prices
// ---------------------------------------------------------------------------

/// One observed price point. Keyed by (product_id, source, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub product_id: String,
    pub source: String,
    pub date: NaiveDate,
    pub price: f64,
    pub is_promo: bool,
}

impl PriceObservation {
    pub fn key(&self) -> (&str, &str, NaiveDate) {
        (&self.product_id, &self.source, self.date)
    }
}

/// Validity interval for a product's regular price. `valid_to = None` is the
/// current record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryRecord {
    pub product_id: String,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    pub regular_price: f64,
    pub promo_price: Option<f64>,
    pub cost_price: Option<f64>,
}

impl PriceHistoryRecord {
    pub fn is_open(&self) -> bool {
        self.valid_to.is_none()
    }
}

/// Engine-side view of one catalog product's pricing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPrice {
    pub product_id: String,
    pub sku: String,
    /// `None` (or a non-positive value) means no price has been set yet.
    #[serde(default)]
    pub regular_price: Option<f64>,
    #[serde(default)]
    pub cost_price: Option<f64>,
    /// Promo price carried by the currently open history record, if any.
    #[serde(default)]
    pub active_promo: Option<f64>,
}

/// A newly observed price for a catalog SKU, as read from a monitoring feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSignal {
    pub sku: String,
    pub price: f64,
    pub source: String,
    pub date: NaiveDate,
}
