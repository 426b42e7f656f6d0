//! The AI matcher is treated as a black box (spec §9, Design Notes): a
//! single `select_best_match` operation. Prompts and provider selection
//! are configuration, not contract.

use async_trait::async_trait;

use crate::models::ProviderSearchResult;

#[async_trait]
pub trait AiMatcher: Send + Sync {
    /// Returns the index of the chosen candidate, or `None` if the matcher
    /// declines to pick one. `favorited` flags which candidates (by index)
    /// are `is_favorited` sources, per spec §4.4 stage 7.
    async fn select_best_match(
        &self,
        query: &str,
        candidates: &[ProviderSearchResult],
        favorited: &[bool],
    ) -> anyhow::Result<Option<usize>>;
}
