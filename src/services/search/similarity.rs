//! Token-set/token-sort/partial "ratio" functions, rebuilt from `strsim`
//! primitives over sorted/deduped token multisets in the shape of
//! `Kluzko-miru`'s `similarity_strategy.rs` (no rapidfuzz port exists in
//! the corpus, so these are approximations, not a literal port).

use std::collections::BTreeSet;

/// Lowercases, strips punctuation, and collapses whitespace so two
/// differently-formatted titles compare fairly.
#[must_use]
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    out.trim_end().to_string()
}

fn tokenize(s: &str) -> Vec<String> {
    normalize(s).split_whitespace().map(str::to_string).collect()
}

/// A plain similarity ratio in `0.0..=100.0`, via normalized Levenshtein.
#[must_use]
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Sorts each string's tokens before comparing, so word order doesn't
/// matter.
#[must_use]
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let mut ta = tokenize(a);
    let mut tb = tokenize(b);
    ta.sort();
    tb.sort();
    ratio(&ta.join(" "), &tb.join(" "))
}

/// The rapidfuzz token-set-ratio construction: compare the shared-token
/// intersection against each side's full token set, take the best of the
/// three pairings.
#[must_use]
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let ta: BTreeSet<String> = tokenize(a).into_iter().collect();
    let tb: BTreeSet<String> = tokenize(b).into_iter().collect();

    let intersection: Vec<&String> = ta.intersection(&tb).collect();
    let diff_a: Vec<&String> = ta.difference(&tb).collect();
    let diff_b: Vec<&String> = tb.difference(&ta).collect();

    let sect = intersection.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" ");
    let sect_and_a = join_nonempty(&sect, &diff_a.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" "));
    let sect_and_b = join_nonempty(&sect, &diff_b.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" "));

    ratio(&sect, &sect_and_a).max(ratio(&sect, &sect_and_b)).max(ratio(&sect_and_a, &sect_and_b))
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => String::new(),
        (true, false) => b.to_string(),
        (false, true) => a.to_string(),
        (false, false) => format!("{a} {b}"),
    }
}

/// Best alignment of the shorter string against a sliding window of the
/// longer one; approximates rapidfuzz's `partial_ratio`.
#[must_use]
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let na = normalize(a);
    let nb = normalize(b);
    let (shorter, longer) = if na.len() <= nb.len() { (na, nb) } else { (nb, na) };

    if shorter.is_empty() {
        return if longer.is_empty() { 100.0 } else { 0.0 };
    }
    if shorter.len() >= longer.len() {
        return ratio(&shorter, &longer);
    }

    let longer_chars: Vec<char> = longer.chars().collect();
    let window = shorter.chars().count();
    let mut best = 0.0_f64;
    for start in 0..=(longer_chars.len() - window) {
        let slice: String = longer_chars[start..start + window].iter().collect();
        best = best.max(ratio(&shorter, &slice));
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_titles_score_100() {
        assert!((token_set_ratio("Attack on Titan", "Attack on Titan") - 100.0).abs() < 1e-9);
    }

    #[test]
    fn token_sort_ignores_word_order() {
        let r = token_sort_ratio("Final Attack on Titan", "Attack on Titan Final");
        assert!(r > 99.0, "expected near-100, got {r}");
    }

    #[test]
    fn token_set_handles_extra_words_on_one_side() {
        let r = token_set_ratio("Attack on Titan", "Attack on Titan The Final Season");
        assert!(r > 70.0, "expected a high overlap score, got {r}");
    }

    #[test]
    fn partial_ratio_finds_substring_match() {
        let r = partial_ratio("Titan", "Attack on Titan Final Season");
        assert!(r > 90.0, "expected near-100, got {r}");
    }

    #[test]
    fn unrelated_titles_score_low() {
        let r = token_set_ratio("Attack on Titan", "My Hero Academia");
        assert!(r < 40.0, "expected a low score, got {r}");
    }
}
