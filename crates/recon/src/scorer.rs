//! Attribute scorers and the weighted match score.

use crate::config::{AttributeConfig, ReconConfig};
use crate::model::{CandidateProduct, InternalProduct, MatchComponents, MatchScore};
use crate::normalize::{canonical_brand, normalize_text};
use crate::similarity::{edit_similarity, token_similarity};
use crate::size::extract_size;

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Name similarity: the better of edit and token similarity on normalized names.
pub fn name_score(a: &str, b: &str) -> f64 {
    let a = normalize_text(a);
    let b = normalize_text(b);
    edit_similarity(&a, &b).max(token_similarity(&a, &b))
}

pub fn brand_score(a: Option<&str>, b: Option<&str>, attrs: &AttributeConfig) -> f64 {
    let (Some(a), Some(b)) = (present(a), present(b)) else {
        return attrs.neutral;
    };
    let a = canonical_brand(a);
    let b = canonical_brand(b);
    if a.is_empty() || b.is_empty() {
        return attrs.neutral;
    }
    if a == b {
        return 1.0;
    }
    if a.contains(&b) || b.contains(&a) {
        return attrs.containment;
    }
    let sim = edit_similarity(&a, &b);
    if sim > attrs.brand_fuzzy_floor {
        sim
    } else {
        0.0
    }
}

pub fn size_score(a: Option<&str>, b: Option<&str>, attrs: &AttributeConfig) -> f64 {
    let (Some(a), Some(b)) = (a.and_then(extract_size), b.and_then(extract_size)) else {
        return attrs.neutral;
    };
    let (smaller, larger) = if a <= b { (a, b) } else { (b, a) };
    if larger <= 0.0 {
        return attrs.neutral;
    }
    if smaller == larger || (larger - smaller) / larger <= attrs.size_tolerance {
        return 1.0;
    }
    (smaller / larger).max(0.0)
}

pub fn category_score(a: Option<&str>, b: Option<&str>, attrs: &AttributeConfig) -> f64 {
    let (Some(a), Some(b)) = (present(a), present(b)) else {
        return attrs.neutral;
    };
    let a = normalize_text(a);
    let b = normalize_text(b);
    if a.is_empty() || b.is_empty() {
        return attrs.neutral;
    }
    if a == b {
        return 1.0;
    }
    if a.contains(&b) || b.contains(&a) {
        return attrs.containment;
    }
    token_similarity(&a, &b)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Score one (internal product, candidate) pair.
pub fn score(
    internal: &InternalProduct,
    candidate: &CandidateProduct,
    config: &ReconConfig,
) -> MatchScore {
    let attrs = &config.attributes;
    let components = MatchComponents {
        name: name_score(&internal.name, &candidate.name),
        brand: brand_score(internal.brand.as_deref(), candidate.brand.as_deref(), attrs),
        size: size_score(internal.size.as_deref(), candidate.size.as_deref(), attrs),
        category: category_score(
            internal.scoring_category(),
            candidate.category.as_deref(),
            attrs,
        ),
    };

    let w = &config.weights;
    let weighted = w.name * components.name
        + w.brand * components.brand
        + w.size * components.size
        + w.category * components.category;

    MatchScore {
        score: round3(weighted.clamp(0.0, 1.0)),
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs() -> AttributeConfig {
        AttributeConfig::default()
    }

    fn internal(name: &str) -> InternalProduct {
        InternalProduct {
            id: "p1".into(),
            sku: "SKU-1".into(),
            name: name.into(),
            brand: Some("Coca-Cola".into()),
            category: Some("Napoje".into()),
            subcategory: Some("Napoje gazowane".into()),
            size: Some("500ml".into()),
            barcode: None,
        }
    }

    fn candidate(name: &str, brand: Option<&str>, size: Option<&str>) -> CandidateProduct {
        CandidateProduct {
            id: "c1".into(),
            name: name.into(),
            brand: brand.map(Into::into),
            category: Some("Napoje".into()),
            size: size.map(Into::into),
            price: None,
            promo_price: None,
            source: None,
            url: None,
            external_sku: None,
        }
    }

    #[test]
    fn brand_exact_alias_and_missing() {
        let a = attrs();
        assert_eq!(brand_score(Some("Coca-Cola"), Some("COCACOLA"), &a), 1.0);
        assert_eq!(brand_score(Some("P&G"), Some("Procter & Gamble"), &a), 1.0);
        assert_eq!(brand_score(Some("Tymbark"), None, &a), 0.5);
        assert_eq!(brand_score(None, None, &a), 0.5);
        assert_eq!(brand_score(Some(" "), Some("Tymbark"), &a), 0.5);
    }

    #[test]
    fn brand_containment_and_fuzzy() {
        let a = attrs();
        assert_eq!(brand_score(Some("Tymbark"), Some("Tymbark Vitamini"), &a), 0.8);
        // one typo over 7 chars ~ 0.857 > 0.7
        let fuzzy = brand_score(Some("Tymbark"), Some("Tymbakr"), &a);
        assert!(fuzzy > 0.7 && fuzzy < 1.0);
        assert_eq!(brand_score(Some("Tymbark"), Some("Hortex"), &a), 0.0);
    }

    #[test]
    fn size_tolerance_and_decay() {
        let a = attrs();
        assert_eq!(size_score(Some("500ml"), Some("0,5l"), &a), 1.0);
        assert_eq!(size_score(Some("1000g"), Some("980 g"), &a), 1.0);
        assert!((size_score(Some("500ml"), Some("1l"), &a) - 0.5).abs() < 1e-9);
        assert_eq!(size_score(Some("500ml"), Some("duża"), &a), 0.5);
        assert_eq!(size_score(None, Some("1l"), &a), 0.5);
    }

    #[test]
    fn category_rules() {
        let a = attrs();
        assert_eq!(category_score(Some("Napoje"), Some("napoje"), &a), 1.0);
        assert_eq!(category_score(Some("Napoje gazowane"), Some("Napoje"), &a), 0.8);
        assert_eq!(category_score(Some("Soki owocowe"), Some("Nektary owocowe"), &a), 1.0 / 3.0);
        assert_eq!(category_score(None, Some("Napoje"), &a), 0.5);
    }

    #[test]
    fn identical_product_scores_one() {
        let config = ReconConfig::default();
        let p = internal("Coca-Cola Zero 500ml");
        let c = candidate("Coca-Cola Zero 500ml", Some("Coca-Cola"), Some("500ml"));
        let s = score(&p, &c, &config);
        assert_eq!(s.score, 1.0);
        assert_eq!(s.components.name, 1.0);
    }

    #[test]
    fn different_pack_size_is_penalized() {
        let config = ReconConfig::default();
        let p = internal("Coca-Cola Zero");
        let same = score(&p, &candidate("Coca-Cola Zero", Some("Coca-Cola"), Some("500ml")), &config);
        let bigger = score(&p, &candidate("Coca-Cola Zero", Some("Coca-Cola"), Some("2l")), &config);
        assert!(same.score > bigger.score);
        assert_eq!(bigger.components.size, 0.25);
    }

    #[test]
    fn score_is_rounded_to_three_decimals() {
        let config = ReconConfig::default();
        let p = internal("Sok jabłkowy");
        let c = candidate("Sok jablkowy tloczony", Some("Hortex"), None);
        let s = score(&p, &c, &config);
        assert_eq!(s.score, (s.score * 1000.0).round() / 1000.0);
    }

    #[test]
    fn subcategory_used_when_category_missing() {
        let config = ReconConfig::default();
        let mut p = internal("Coca-Cola Zero");
        p.category = None;
        p.subcategory = Some("Napoje".into());
        let s = score(&p, &candidate("Coca-Cola Zero", None, None), &config);
        assert_eq!(s.components.category, 1.0);
    }
}
