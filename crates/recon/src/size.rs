//! Size extraction: volume/weight tokens to a canonical ml-or-gram scalar.
//!
//! Patterns are tried in priority order and the first hit wins. Compound
//! strings carrying several sizes ("2x1l + 500ml gratis") may misparse;
//! callers treat the result as a hint, not a fact.

use regex::Regex;
use std::sync::LazyLock;

const NUM: &str = r"(\d+(?:[.,]\d+)?)";

struct SizePattern {
    regex: Regex,
    /// Multiplier to ml/g for the unit.
    factor: f64,
    /// Pattern has a leading pack-count capture.
    multipack: bool,
}

/// Multipacks go first: `6x330ml` also contains the bare token `330ml`.
static PATTERNS: LazyLock<Vec<SizePattern>> = LazyLock::new(|| {
    let build = |pattern: String, factor: f64, multipack: bool| SizePattern {
        regex: Regex::new(&pattern).expect("Invalid regex"),
        factor,
        multipack,
    };
    vec![
        build(format!(r"(\d+)\s*[x×*]\s*{NUM}\s*ml\b"), 1.0, true),
        build(format!(r"(\d+)\s*[x×*]\s*{NUM}\s*l\b"), 1000.0, true),
        build(format!(r"{NUM}\s*(?:l|ltr|litr[a-z]*)\b"), 1000.0, false),
        build(format!(r"{NUM}\s*ml\b"), 1.0, false),
        build(format!(r"{NUM}\s*kg\b"), 1000.0, false),
        build(format!(r"{NUM}\s*(?:g|gr)\b"), 1.0, false),
    ]
});

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse::<f64>().ok()
}

/// Extract a size in milliliters (volumes) or grams (weights).
pub fn extract_size(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();
    for pattern in PATTERNS.iter() {
        let Some(caps) = pattern.regex.captures(&lower) else {
            continue;
        };
        let value = if pattern.multipack {
            let count = parse_number(caps.get(1)?.as_str())?;
            let unit = parse_number(caps.get(2)?.as_str())?;
            count * unit
        } else {
            parse_number(caps.get(1)?.as_str())?
        };
        return Some(value * pattern.factor);
    }
    None
}
