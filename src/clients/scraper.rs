//! The scraper interface (spec §6), implemented by each provider and
//! consumed by the core through [`registry::ScraperRegistry`]. Individual
//! providers (Bilibili, Tencent, iQiyi, …) are explicitly out of scope
//! (spec §1) — this crate only defines the interface and a registry, the
//! idiomatic replacement for the original's duck-typed runtime lookup
//! (spec §9, Design Notes).

use async_trait::async_trait;

use crate::models::{Comment, EpisodeInfoHint, MediaType, ProviderEpisodeInfo, ProviderSearchResult};

#[async_trait]
pub trait Scraper: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn search(
        &self,
        term: &str,
        episode_info: Option<&EpisodeInfoHint>,
        max_results: usize,
    ) -> anyhow::Result<Vec<ProviderSearchResult>>;

    async fn get_episodes(
        &self,
        media_id: &str,
        media_type: Option<MediaType>,
    ) -> anyhow::Result<Vec<ProviderEpisodeInfo>>;

    async fn get_comments(&self, provider_episode_id: &str) -> anyhow::Result<Vec<Comment>>;

    /// Optional; used by URL-import. Default: unsupported.
    async fn get_info_from_url(&self, _url: &str) -> anyhow::Result<Option<ProviderSearchResult>> {
        Ok(None)
    }

    /// Proxy/health check endpoint, if the provider has one.
    fn test_url(&self) -> Option<&str> {
        None
    }

    /// Per-provider override of the rate limiter's quota; `None` defers to
    /// config (spec §4.2: "unset ⇒ unlimited").
    fn rate_limit_quota(&self) -> Option<i32> {
        None
    }
}
