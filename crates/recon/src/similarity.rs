use std::collections::HashSet;

/// `1 - levenshtein / max(len)` over chars. Identical strings score 1,
/// an empty side scores 0.
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    let distance = strsim::levenshtein(a, b);
    1.0 - distance as f64 / max_len as f64
}

fn token_set(s: &str) -> HashSet<&str> {
    s.split_whitespace()
        .filter(|token| token.chars().count() > 1)
        .collect()
}

/// Jaccard coefficient over whitespace token sets. Single-character tokens
/// are ignored; an empty union scores 0.
pub fn token_similarity(a: &str, b: &str) -> f64 {
    let left = token_set(a);
    let right = token_set(b);
    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = left.intersection(&right).count();
    intersection as f64 / union as f64
}
