//! Stage 8 of the unified search pipeline: the lexicographic scoring
//! ladder (spec §4.4), plus the favorited-source override (stage 9).

use crate::constants::search::FAVORITED_OVERRIDE_THRESHOLD;
use crate::models::{AliasSet, MediaType, ParsedQuery, ProviderSearchResult};
use crate::services::search::similarity::{token_set_ratio, token_sort_ratio};

/// A ranked candidate: the original result plus its computed score.
#[derive(Debug, Clone)]
pub struct ScoredResult {
    pub result: ProviderSearchResult,
    pub score: i64,
    pub provider_order: usize,
}

#[must_use]
pub fn score_candidate(
    query: &ParsedQuery,
    db_year: Option<i32>,
    candidate: &ProviderSearchResult,
    provider_order: usize,
) -> i64 {
    let mut score: i64 = 0;

    let normalized_query = super::similarity::normalize(&query.title);
    let normalized_candidate = super::similarity::normalize(&candidate.title);

    let exact_match = normalized_query == normalized_candidate;
    if exact_match {
        score += 10_000;
    }

    let punct_normalized_query = normalized_query.replace(' ', "");
    let punct_normalized_candidate = normalized_candidate.replace(' ', "");
    if !exact_match && punct_normalized_query == punct_normalized_candidate {
        score += 5_000;
    }

    let sort_ratio = token_sort_ratio(&query.title, &candidate.title);
    let length_diff = (query.title.chars().count() as i64 - candidate.title.chars().count() as i64).abs();

    if sort_ratio > 98.0 && length_diff <= 10 {
        score += 2_000;
    } else if sort_ratio > 95.0 && length_diff <= 20 {
        score += 1_000;
    }

    if exact_match
        && let (Some(dy), Some(cy)) = (db_year, candidate.year)
        && dy - cy >= 3
    {
        score += 800;
    }

    let years_match = matches!((db_year, candidate.year), (Some(a), Some(b)) if a == b);
    if years_match {
        score += 500;
    }

    if candidate.media_type == MediaType::TvSeries && query.season.is_some() && query.season == candidate.season {
        score += 100;
    }

    let set_ratio = token_set_ratio(&query.title, &candidate.title);
    if set_ratio >= 85.0 {
        score += set_ratio as i64;
    }

    score -= length_diff;

    if let (Some(dy), Some(cy)) = (db_year, candidate.year)
        && dy != cy
    {
        score -= 500;
    }

    score -= provider_order as i64;

    score
}

/// Ranks every candidate, applies the favorited-source override, and
/// returns the list sorted best-first.
#[must_use]
pub fn rank_candidates(
    query: &ParsedQuery,
    db_year: Option<i32>,
    candidates: Vec<(ProviderSearchResult, usize, bool)>,
) -> Vec<ScoredResult> {
    let mut scored: Vec<ScoredResult> = candidates
        .into_iter()
        .map(|(result, provider_order, is_favorited)| {
            let base_score = score_candidate(query, db_year, &result, provider_order);
            let favorited_wins = is_favorited
                && matches!(result.media_type, MediaType::TvSeries | MediaType::Movie)
                && token_set_ratio(&query.title, &result.title) >= FAVORITED_OVERRIDE_THRESHOLD;
            let score = if favorited_wins { i64::MAX } else { base_score };
            ScoredResult { result, score, provider_order }
        })
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score).then(a.provider_order.cmp(&b.provider_order)));
    scored
}

/// Alias/title filtering (stage 6): keeps a candidate if its title is
/// similar enough to the parsed title or to any alias in the expansion
/// set.
#[must_use]
pub fn passes_alias_filter(candidate_title: &str, query_title: &str, aliases: &[String], threshold: f64) -> bool {
    if token_set_ratio(candidate_title, query_title) >= threshold {
        return true;
    }
    aliases.iter().any(|alias| token_set_ratio(candidate_title, alias) >= threshold)
}

/// Stage 4: corrects an apparent `tv_series` misclassification when the
/// title contains a theatrical-release marker.
#[must_use]
pub fn correct_media_type(title: &str, media_type: MediaType) -> MediaType {
    if media_type == MediaType::TvSeries {
        let lower = title.to_lowercase();
        if lower.contains("剧场版") || lower.contains("劇場版") || lower.contains("movie") || lower.contains("映画") {
            return MediaType::Movie;
        }
    }
    media_type
}

#[must_use]
pub fn alias_set_as_vec(aliases: &AliasSet) -> Vec<String> {
    aliases.all().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, provider: &str, year: Option<i32>) -> ProviderSearchResult {
        ProviderSearchResult {
            provider: provider.to_string(),
            media_id: "1".to_string(),
            title: title.to_string(),
            media_type: MediaType::TvSeries,
            season: None,
            year,
            episode_count: None,
            image_url: None,
            current_episode_index: None,
        }
    }

    #[test]
    fn exact_match_outranks_provider_order_penalty() {
        let query = ParsedQuery { title: "Demo".to_string(), season: None, episode: None, is_movie_hint: false };
        let candidates = vec![
            (result("Demo Extended", "A", None), 1, false),
            (result("Demo", "B", None), 5, false),
        ];
        let ranked = rank_candidates(&query, None, candidates);
        assert_eq!(ranked[0].result.provider, "B");
    }

    #[test]
    fn favorited_source_overrides_score() {
        let query = ParsedQuery { title: "Demo".to_string(), season: None, episode: None, is_movie_hint: false };
        let candidates = vec![
            (result("Demo", "A", None), 0, false),
            (result("Demo Show", "B", None), 9, true),
        ];
        let ranked = rank_candidates(&query, None, candidates);
        assert_eq!(ranked[0].result.provider, "B");
    }

    #[test]
    fn corrects_theatrical_release_type() {
        let corrected = correct_media_type("Demo 劇場版", MediaType::TvSeries);
        assert_eq!(corrected, MediaType::Movie);
    }
}
