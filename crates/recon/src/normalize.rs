//! Text normalization for product names, brands and categories.

use regex::Regex;
use std::sync::LazyLock;

/// Every run of characters that is neither a letter nor a digit.
/// Unicode-aware, so locale diacritics survive.
static RE_NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("Invalid regex"));

/// Marketing noise dropped from names before comparison.
const NOISE_WORDS: &[&str] = &[
    "promo",
    "promocja",
    "nowosc",
    "nowość",
    "new",
    "sale",
    "oferta",
    "hit",
    "gratis",
    "bestseller",
    "limited",
    "edycja",
    "edition",
    "super",
    "mega",
    "okazja",
];

/// Spelling variants mapped to one canonical brand. Keys are compact
/// (see [`brand_key`]), so one-letter parts such as the `p` and `g` of
/// "P&G" still count.
const BRAND_ALIASES: &[(&str, &str)] = &[
    ("cocacola", "coca cola"),
    ("coke", "coca cola"),
    ("droetker", "dr oetker"),
    ("oetker", "dr oetker"),
    ("loreal", "loreal"),
    ("loréal", "loreal"),
    ("lorealparis", "loreal"),
    ("loréalparis", "loreal"),
    ("nestlé", "nestle"),
    ("pg", "procter gamble"),
    ("pandg", "procter gamble"),
    ("proctergamble", "procter gamble"),
    ("procterandgamble", "procter gamble"),
    ("wedel", "e wedel"),
    ("ewedel", "e wedel"),
    ("pepsico", "pepsi"),
    ("pepsicola", "pepsi"),
    ("markawlasna", "private label"),
    ("markawłasna", "private label"),
    ("ownbrand", "private label"),
];

/// Lowercase, collapse punctuation to single spaces, drop tokens shorter
/// than 2 characters and marketing noise, re-join with single spaces.
pub fn normalize_text(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let spaced = RE_NON_ALNUM.replace_all(&lower, " ");
    spaced
        .split_whitespace()
        .filter(|token| token.chars().count() >= 2)
        .filter(|token| !NOISE_WORDS.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Same as [`normalize_text`], treating `None` as empty.
pub fn normalize_opt(raw: Option<&str>) -> String {
    raw.map(normalize_text).unwrap_or_default()
}

/// Lowercase letters and digits only: `"P&G"` → `"pg"`, `"Dr. Oetker"` → `"droetker"`.
fn brand_key(raw: &str) -> String {
    RE_NON_ALNUM.replace_all(&raw.to_lowercase(), "").into_owned()
}

/// Normalize a brand and map known spelling variants to their canonical form.
pub fn canonical_brand(raw: &str) -> String {
    let key = brand_key(raw);
    BRAND_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or_else(|| normalize_text(raw))
}

/// Lookup key for SKUs: trimmed, case-insensitive.
pub(crate) fn sku_key(sku: &str) -> String {
    sku.trim().to_lowercase()
}
