//! The unified search pipeline (spec §4.4): parse → alias expansion /
//! fan-out search (concurrent) → type correction → season filter → alias
//! filter → optional AI disambiguation → traditional ranking →
//! favorited-source override → fallback ladder.

pub mod alias;
pub mod parse;
pub mod rank;
pub mod similarity;

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::clients::{AiMatcher, MetadataSourceRegistry, ScraperRegistry};
use crate::constants::search::{STRICT_TITLE_FILTER_THRESHOLD, TITLE_FILTER_THRESHOLD};
use crate::db::Store;
use crate::models::{MediaType, ParsedQuery, ProviderSearchResult, SearchOptions};
use crate::services::rate_limiter::RateLimiter;

pub use parse::parse_query;
pub use rank::{ScoredResult, correct_media_type, rank_candidates, score_candidate};
pub use similarity::{partial_ratio, token_set_ratio, token_sort_ratio};

pub struct UnifiedSearchService {
    store: Store,
    scrapers: ScraperRegistry,
    metadata_sources: MetadataSourceRegistry,
    rate_limiter: Arc<dyn RateLimiter>,
    ai_matcher: Option<Arc<dyn AiMatcher>>,
    ai_fallback_enabled: bool,
    fallback_ladder_enabled: bool,
    provider_display_order: Vec<String>,
}

impl UnifiedSearchService {
    #[must_use]
    pub fn new(
        store: Store,
        scrapers: ScraperRegistry,
        metadata_sources: MetadataSourceRegistry,
        rate_limiter: Arc<dyn RateLimiter>,
        ai_matcher: Option<Arc<dyn AiMatcher>>,
        ai_fallback_enabled: bool,
        fallback_ladder_enabled: bool,
        provider_display_order: Vec<String>,
    ) -> Self {
        Self {
            store,
            scrapers,
            metadata_sources,
            rate_limiter,
            ai_matcher,
            ai_fallback_enabled,
            fallback_ladder_enabled,
            provider_display_order,
        }
    }

    fn provider_order(&self, provider: &str) -> usize {
        self.provider_display_order.iter().position(|p| p == provider).unwrap_or(self.provider_display_order.len())
    }

    /// Stage 3: calls every registered scraper concurrently, budgeted by
    /// the rate limiter.
    async fn fan_out_search(&self, term: &str, query: &ParsedQuery, max_results: usize) -> Vec<ProviderSearchResult> {
        let episode_info = if query.season.is_some() || query.episode.is_some() {
            Some(crate::models::EpisodeInfoHint { season: query.season, episode: query.episode })
        } else {
            None
        };

        let futures = self.scrapers.all().into_iter().map(|scraper| {
            let term = term.to_string();
            let episode_info = episode_info.clone();
            let rate_limiter = Arc::clone(&self.rate_limiter);
            async move {
                let provider = scraper.provider_name().to_string();
                if rate_limiter.check(&provider).await.is_err() {
                    debug!(provider, "skipping search, rate limited");
                    return Vec::new();
                }
                let start = Instant::now();
                let results = scraper.search(&term, episode_info.as_ref(), max_results).await;
                let elapsed = start.elapsed();
                match results {
                    Ok(results) => {
                        let _ = rate_limiter.increment(&provider).await;
                        info!(provider, count = results.len(), elapsed_ms = elapsed.as_millis() as u64, "search source completed");
                        results
                    }
                    Err(e) => {
                        warn!(provider, error = %e, "search source failed");
                        Vec::new()
                    }
                }
            }
        });

        futures::future::join_all(futures).await.into_iter().flatten().collect()
    }

    /// Runs the full pipeline, returning an ordered list of candidates.
    pub async fn unified_search(&self, term: &str, options: &SearchOptions) -> anyhow::Result<Vec<ProviderSearchResult>> {
        let query = parse_query(term);

        let aliases = if options.use_alias_expansion {
            let (aliases, results) = tokio::join!(
                alias::expand_aliases(
                    &self.store,
                    &self.metadata_sources,
                    &query.title,
                    &options.custom_aliases,
                    options.alias_similarity_threshold
                ),
                self.fan_out_search(term, &query, options.max_results_per_source)
            );
            return self.finish_pipeline(&query, results, &aliases, options).await;
        } else {
            options.custom_aliases.clone()
        };

        let results = self.fan_out_search(term, &query, options.max_results_per_source).await;
        self.finish_pipeline(&query, results, &aliases, options).await
    }

    async fn finish_pipeline(
        &self,
        query: &ParsedQuery,
        results: Vec<ProviderSearchResult>,
        aliases: &[String],
        options: &SearchOptions,
    ) -> anyhow::Result<Vec<ProviderSearchResult>> {
        // Stage 4: type correction.
        let results: Vec<ProviderSearchResult> = results
            .into_iter()
            .map(|mut r| {
                r.media_type = correct_media_type(&r.title, r.media_type);
                r
            })
            .collect();

        // Stage 5: season filtering.
        let results: Vec<ProviderSearchResult> = results
            .into_iter()
            .filter(|r| {
                if query.season.is_none() || query.is_movie_hint {
                    return true;
                }
                r.media_type == MediaType::TvSeries && r.season == query.season
            })
            .collect();

        // Stage 6: alias/title filtering.
        let threshold = if options.strict_filtering { STRICT_TITLE_FILTER_THRESHOLD } else { TITLE_FILTER_THRESHOLD };
        let results: Vec<ProviderSearchResult> = results
            .into_iter()
            .filter(|r| {
                if options.use_alias_filtering
                    && rank::passes_alias_filter(&r.title, &query.title, aliases, options.alias_similarity_threshold)
                {
                    return true;
                }
                if options.use_title_filtering {
                    return partial_ratio(&r.title, &query.title) >= threshold;
                }
                !options.use_alias_filtering && !options.use_title_filtering
            })
            .collect();

        // Stage 9 inputs: favorited flag + provider order per candidate.
        let mut annotated = Vec::with_capacity(results.len());
        for r in results {
            let is_favorited = self
                .store
                .find_source_by_provider_media(&r.provider, &r.media_id)
                .await
                .ok()
                .flatten()
                .is_some_and(|(source, _)| source.is_favorited);
            let order = self.provider_order(&r.provider);
            annotated.push((r, order, is_favorited));
        }

        // Stage 7: optional AI disambiguation.
        if let Some(ai_matcher) = &self.ai_matcher {
            let candidates: Vec<ProviderSearchResult> = annotated.iter().map(|(r, _, _)| r.clone()).collect();
            let favorited: Vec<bool> = annotated.iter().map(|(_, _, f)| *f).collect();
            match ai_matcher.select_best_match(&query.title, &candidates, &favorited).await {
                Ok(Some(idx)) if idx < candidates.len() => return Ok(vec![candidates[idx].clone()]),
                Ok(_) => {
                    if !self.ai_fallback_enabled {
                        return Ok(Vec::new());
                    }
                }
                Err(e) => {
                    warn!(error = %e, "AI matcher failed");
                    if !self.ai_fallback_enabled {
                        return Ok(Vec::new());
                    }
                }
            }
        }

        // Stage 8 + 9: traditional ranking with favorited override.
        let mut ranked = rank_candidates(query, None, annotated);

        if options.use_source_priority_sorting {
            ranked.sort_by(|a, b| a.provider_order.cmp(&b.provider_order).then(b.score.cmp(&a.score)));
        }

        // Stage 10: fallback ladder.
        if self.fallback_ladder_enabled && query.episode.is_some() {
            return Ok(self.fallback_ladder(query, ranked).await);
        }

        Ok(ranked.into_iter().map(|s| s.result).collect())
    }

    async fn fallback_ladder(&self, query: &ParsedQuery, ranked: Vec<ScoredResult>) -> Vec<ProviderSearchResult> {
        let Some(requested_episode) = query.episode else {
            return ranked.into_iter().map(|s| s.result).collect();
        };

        let mut accepted = Vec::new();
        for scored in ranked {
            let Some(scraper) = self.scrapers.get(&scored.result.provider) else { continue };
            if query.is_movie_hint && scored.result.media_type == MediaType::Movie {
                accepted.push(scored.result);
                continue;
            }
            match scraper.get_episodes(&scored.result.media_id, Some(scored.result.media_type)).await {
                Ok(episodes) => {
                    if episodes.iter().any(|e| e.episode_index == requested_episode) {
                        accepted.push(scored.result);
                    }
                }
                Err(e) => warn!(provider = %scored.result.provider, error = %e, "fallback ladder episode check failed"),
            }
        }
        accepted
    }
}
