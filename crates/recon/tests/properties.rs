// Property-based tests for matching, import and price reconciliation.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashMap;

use chrono::NaiveDate;
use proptest::prelude::*;
use shelfwise_recon::classify::classify_by_score;
use shelfwise_recon::config::{PriceSyncConfig, ReconConfig, ThresholdConfig};
use shelfwise_recon::decision::DecisionBook;
use shelfwise_recon::etl::{classify_rows, detect_feed, FeedKind};
use shelfwise_recon::matcher::{match_catalog, rank_candidates};
use shelfwise_recon::model::{
    CandidateProduct, CatalogPrice, InternalProduct, MatchComponents, MatchDecision, MatchStatus,
    PriceSignal,
};
use shelfwise_recon::price_sync::{apply_transitions, evaluate_price, sync_prices, PriceChangeKind, PriceMutation};
use shelfwise_recon::scorer::score;
use shelfwise_recon::similarity::edit_similarity;
use shelfwise_recon::size::extract_size;
use shelfwise_recon::store::MemoryStore;
use shelfwise_recon::table::{CellValue, RawRow};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

fn config_64() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(64),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Vowel-free words: never a noise word, never shorter than 2 characters.
fn arb_word() -> impl Strategy<Value = String> {
    "[bcdfghjklmnprstwz]{2,8}"
}

fn arb_phrase(max_words: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(arb_word(), 1..=max_words).prop_map(|w| w.join(" "))
}

fn arb_size() -> impl Strategy<Value = String> {
    (1u32..2000, prop::sample::select(vec!["ml", "l", "g", "kg"]))
        .prop_map(|(n, unit)| format!("{n}{unit}"))
}

fn arb_product() -> impl Strategy<Value = InternalProduct> {
    (arb_phrase(4), arb_word(), arb_size(), arb_phrase(2)).prop_map(|(name, brand, size, category)| {
        InternalProduct {
            id: format!("p_{name}"),
            sku: name.clone(),
            name,
            brand: Some(brand),
            category: Some(category),
            subcategory: None,
            size: Some(size),
            barcode: None,
        }
    })
}

fn arb_candidate() -> impl Strategy<Value = CandidateProduct> {
    (
        arb_phrase(4),
        prop::option::of(arb_word()),
        prop::option::of(arb_size()),
        prop::option::of(arb_phrase(2)),
    )
        .prop_map(|(name, brand, size, category)| CandidateProduct {
            id: format!("c_{name}"),
            name,
            brand,
            category,
            size,
            price: None,
            promo_price: None,
            source: Some("rival".into()),
            url: None,
            external_sku: None,
        })
}

fn as_candidate(p: &InternalProduct) -> CandidateProduct {
    CandidateProduct {
        id: format!("self_{}", p.id),
        name: p.name.clone(),
        brand: p.brand.clone(),
        category: p.category.clone(),
        size: p.size.clone(),
        price: None,
        promo_price: None,
        source: None,
        url: None,
        external_sku: None,
    }
}

fn arb_price() -> impl Strategy<Value = f64> {
    (100u32..100_000).prop_map(|cents| cents as f64 / 100.0)
}

// ---------------------------------------------------------------------------
// Similarity and scoring
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn edit_similarity_identity_and_empty(s in "\\PC{1,24}") {
        prop_assert_eq!(edit_similarity(&s, &s), 1.0);
        prop_assert_eq!(edit_similarity(&s, ""), 0.0);
        prop_assert_eq!(edit_similarity("", &s), 0.0);
    }

    #[test]
    fn edit_similarity_bounded(a in "\\PC{0,16}", b in "\\PC{0,16}") {
        let sim = edit_similarity(&a, &b);
        prop_assert!((0.0..=1.0).contains(&sim), "{} out of range", sim);
    }

    #[test]
    fn self_match_auto_matches(p in arb_product()) {
        let config = ReconConfig::default();
        let s = score(&p, &as_candidate(&p), &config);
        prop_assert!(s.score >= config.thresholds.auto_match, "self score {} for {:?}", s.score, p);
        prop_assert_eq!(
            classify_by_score(s.score, &config.thresholds),
            MatchStatus::AutoMatched
        );
    }

    #[test]
    fn score_bounded_and_rounded(p in arb_product(), c in arb_candidate()) {
        let s = score(&p, &c, &ReconConfig::default());
        prop_assert!((0.0..=1.0).contains(&s.score));
        prop_assert!(((s.score * 1000.0).round() - s.score * 1000.0).abs() < 1e-6);
    }

    #[test]
    fn classification_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
        let t = ThresholdConfig::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(classify_by_score(lo, &t).rank() <= classify_by_score(hi, &t).rank());
    }

    #[test]
    fn multipack_sizes_multiply(count in 1u32..48, volume in 1u32..2000) {
        let text = format!("{count}x{volume}ml");
        prop_assert_eq!(extract_size(&text), Some(f64::from(count * volume)));
    }
}

#[test]
fn size_examples() {
    assert_eq!(extract_size("6x330ml"), Some(1980.0));
    assert_eq!(extract_size("1.5L"), Some(1500.0));
    assert_eq!(extract_size("250g"), Some(250.0));
}

// ---------------------------------------------------------------------------
// Batch matcher
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_64())]

    #[test]
    fn ranking_bounded_by_limit_and_floor(
        p in arb_product(),
        candidates in prop::collection::vec(arb_candidate(), 0..30),
        top in 1usize..8,
    ) {
        let config = ReconConfig::default();
        let mut pool = candidates;
        pool.push(as_candidate(&p));

        let ranked = rank_candidates(&p, &pool, Some(top), &config);
        prop_assert!(ranked.len() <= top);
        prop_assert!(!ranked.is_empty(), "self candidate must survive");
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].score.score >= pair[1].score.score);
        }
        for r in &ranked {
            prop_assert!(r.score.score >= config.thresholds.batch_min_score);
        }
    }

    #[test]
    fn batch_matcher_idempotent(
        products in prop::collection::vec(arb_product(), 1..6),
        candidates in prop::collection::vec(arb_candidate(), 0..20),
    ) {
        let config = ReconConfig::default();
        let first = match_catalog(&products, &candidates, &config);
        let second = match_catalog(&products, &candidates, &config);
        prop_assert_eq!(&first.decisions, &second.decisions);
        prop_assert_eq!(&first.summary, &second.summary);

        for p in &products {
            let n = first.decisions.iter().filter(|d| d.internal_id == p.id).count();
            prop_assert!(n <= config.thresholds.top_n);
        }
    }
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

fn pending(internal: &str, candidate: &str) -> MatchDecision {
    MatchDecision {
        internal_id: internal.into(),
        candidate_id: candidate.into(),
        score: 0.7,
        components: MatchComponents {
            name: 0.7,
            brand: 0.7,
            size: 0.7,
            category: 0.7,
        },
        status: MatchStatus::Pending,
        review: None,
    }
}

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn candidate_approved_at_most_once(
        ops in prop::collection::vec((0usize..4, 0usize..3, any::<bool>()), 0..40),
    ) {
        let mut book = DecisionBook::new();
        let mut all = Vec::new();
        for p in 0..4 {
            for c in 0..3 {
                all.push(pending(&format!("p{p}"), &format!("c{c}")));
            }
        }
        book.merge_run(all);

        for (p, c, approve) in ops {
            let (p, c) = (format!("p{p}"), format!("c{c}"));
            let _ = if approve { book.approve(&p, &c) } else { book.reject(&p, &c) };
        }

        let mut approvals: HashMap<&str, usize> = HashMap::new();
        for d in book.decisions() {
            if d.review == Some(shelfwise_recon::model::ReviewOverride::Approved) {
                *approvals.entry(d.candidate_id.as_str()).or_default() += 1;
            }
        }
        prop_assert!(approvals.values().all(|n| *n <= 1), "{:?}", approvals);
    }
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

fn arb_header_spelling(base: &'static str) -> impl Strategy<Value = String> {
    (any::<bool>(), any::<bool>()).prop_map(move |(upper, spaces)| {
        let s = if spaces { base.replace('_', " ") } else { base.to_string() };
        if upper {
            s.to_uppercase()
        } else {
            s
        }
    })
}

#[test]
fn product_headers_never_sales_or_unknown() {
    let headers: Vec<String> = ["SKU", "Product_Name", "Cost_Price", "Current_Price"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(detect_feed(&headers), Some(FeedKind::Product));
}

#[test]
fn monitoring_headers_win_over_brand() {
    let headers: Vec<String> = ["My Price", "My Position", "Product Code", "Minimum Price", "Brand"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(detect_feed(&headers), Some(FeedKind::Monitoring));
}

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn product_detection_ignores_header_spelling(
        sku in arb_header_spelling("SKU"),
        name in arb_header_spelling("Product_Name"),
        price in arb_header_spelling("Current_Price"),
    ) {
        prop_assert_eq!(detect_feed(&[sku, name, price]), Some(FeedKind::Product));
    }

    #[test]
    fn import_summary_accounts_for_every_row(
        cells in prop::collection::vec(
            (
                prop::option::of("[A-Z][0-9]{2,4}"),
                prop::option::of("[a-z]{3,10}"),
                prop::option::of(prop_oneof!["[0-9]{1,3},[0-9]{2}", "abc", "".prop_map(String::from)]),
            ),
            0..40,
        ),
    ) {
        let headers: Vec<String> = vec!["SKU".into(), "Product_Name".into(), "Current_Price".into()];
        let rows: Vec<RawRow> = cells
            .iter()
            .map(|(sku, name, price)| {
                let mut row = RawRow::new();
                row.insert("SKU".into(), CellValue::from(sku.as_deref().unwrap_or("")));
                row.insert("Product_Name".into(), CellValue::from(name.as_deref().unwrap_or("")));
                row.insert("Current_Price".into(), CellValue::from(price.as_deref().unwrap_or("")));
                row
            })
            .collect();

        let outcome = classify_rows(&headers, &rows);
        prop_assert_eq!(outcome.kind(), Some(FeedKind::Product));
        let summary = outcome.summary().unwrap();
        prop_assert_eq!(summary.total_rows, rows.len());
        prop_assert_eq!(summary.total_rows, summary.valid_rows + summary.skipped_total());
    }
}

// ---------------------------------------------------------------------------
// Price reconciliation
// ---------------------------------------------------------------------------

fn catalog_price(sku: &str, regular: Option<f64>) -> CatalogPrice {
    CatalogPrice {
        product_id: format!("p_{sku}"),
        sku: sku.into(),
        regular_price: regular,
        cost_price: None,
        active_promo: None,
    }
}

#[test]
fn price_examples() {
    let config = PriceSyncConfig::default();
    let eval = |old: f64, new: f64| {
        evaluate_price(&catalog_price("A", Some(old)), new, "m", day(1), day(2), &config).unwrap()
    };

    let promo = eval(37.0, 17.0).unwrap();
    assert_eq!(promo.kind, PriceChangeKind::Promotion);
    assert!(promo.mutations.iter().any(|m| matches!(
        m,
        PriceMutation::OpenHistory { record } if record.regular_price == 37.0 && record.promo_price == Some(17.0)
    )));

    let change = eval(10.0, 10.5).unwrap();
    assert_eq!(change.kind, PriceChangeKind::PriceChange);
    assert!(change.mutations.iter().any(|m| matches!(
        m,
        PriceMutation::OpenHistory { record } if record.regular_price == 10.5 && record.promo_price.is_none()
    )));

    assert!(eval(10.000, 10.003).is_none());
}

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn deep_drop_keeps_regular_price(old in arb_price(), drop in 0.21f64..0.95) {
        let observed = old * (1.0 - drop);
        let t = evaluate_price(
            &catalog_price("A", Some(old)), observed, "m", day(1), day(2), &PriceSyncConfig::default(),
        ).unwrap().unwrap();
        prop_assert_eq!(t.kind, PriceChangeKind::Promotion);
        let updates = t.mutations.iter().filter(|m| matches!(m, PriceMutation::UpdateCatalogPrice { .. })).count();
        prop_assert_eq!(updates, 0);
    }

    #[test]
    fn negligible_delta_is_silent(old in arb_price(), delta in -0.0049f64..0.0049) {
        let out = evaluate_price(
            &catalog_price("A", Some(old)), old + delta, "m", day(1), day(2), &PriceSyncConfig::default(),
        ).unwrap();
        prop_assert!(out.is_none());
    }

    #[test]
    fn sync_counters_balance(
        catalog in prop::collection::vec((0u8..10, prop::option::of(arb_price())), 0..10),
        signals in prop::collection::vec((0u8..14, prop_oneof![arb_price(), Just(-1.0), Just(0.0)]), 0..30),
    ) {
        let mut seen = std::collections::HashSet::new();
        let catalog: Vec<CatalogPrice> = catalog
            .into_iter()
            .filter(|(id, _)| seen.insert(*id))
            .map(|(id, price)| catalog_price(&format!("S{id}"), price))
            .collect();
        let signals: Vec<PriceSignal> = signals
            .into_iter()
            .map(|(id, price)| PriceSignal { sku: format!("s{id}"), price, source: "m".into(), date: day(1) })
            .collect();

        let report = sync_prices(&catalog, &signals, day(2), &PriceSyncConfig::default());
        let c = &report.counters;
        prop_assert_eq!(c.signals, signals.len());
        prop_assert_eq!(c.matched + c.unmatched, c.signals);
        prop_assert_eq!(
            c.prices_updated + c.promotions_detected + c.promotions_ended + c.unchanged + c.errors,
            c.matched
        );
        prop_assert_eq!(report.errors.len(), c.errors);

        // Applying keeps at most one open record per product.
        let mut store = MemoryStore::from_catalog(catalog.clone(), day(1));
        let applied = apply_transitions(&mut store, &report.transitions);
        prop_assert!(applied.errors.is_empty(), "{:?}", applied.errors);
        for p in &catalog {
            prop_assert!(store.history_for(&p.product_id).filter(|r| r.is_open()).count() <= 1);
        }
    }
}
