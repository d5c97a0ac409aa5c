//! Text similarity matching
//!
//! Word-set similarity used by the clipboard correlator to decide whether a
//! pasted text originated from an earlier in-session copy.

use std::collections::HashSet;

/// Compute the similarity between two text blocks as a value in [0, 1].
///
/// Formula: Jaccard coefficient `|intersection| / |union|` over the
/// lower-cased word sets of both inputs (duplicates collapsed). Words are
/// split on non-word characters (anything that is not alphanumeric or `_`).
///
/// Empty input on either side yields 0; identical strings yield 1; two
/// inputs whose token sets are both empty (e.g. punctuation-only) yield 0.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let words_a = tokenize(a);
    let words_b = tokenize(b);

    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }

    let intersection = words_a.intersection(&words_b).count();
    intersection as f64 / union as f64
}

/// Split a text into its set of lower-cased words.
fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}
