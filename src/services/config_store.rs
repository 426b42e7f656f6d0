//! Dynamic, CLI-visible configuration (spec §6), backed by the
//! `config_kv` table. Static startup config ([`crate::config::Config`])
//! covers the server/db/observability layer; this store covers settings
//! an operator can change at runtime without a restart.

use crate::constants::cache::MIN_CACHE_TTL_SECONDS;
use crate::constants::search::DEFAULT_MAX_RESULTS_PER_SOURCE;
use crate::db::Store;

#[derive(Clone)]
pub struct ConfigStore {
    store: Store,
}

impl ConfigStore {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    async fn get_string(&self, key: &str) -> Option<String> {
        self.store.config_get(key).await.ok().flatten()
    }

    async fn get_i64(&self, key: &str, default: i64) -> i64 {
        self.get_string(key).await.and_then(|v| v.parse().ok()).unwrap_or(default)
    }

    async fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get_string(key).await.and_then(|v| v.parse().ok()).unwrap_or(default)
    }

    pub async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.store.config_set(key, value).await
    }

    pub async fn all(&self) -> anyhow::Result<Vec<(String, String)>> {
        self.store.config_all().await
    }

    // ---- cache TTLs -------------------------------------------------------

    pub async fn search_ttl_seconds(&self) -> i64 {
        self.get_i64("searchTtlSeconds", MIN_CACHE_TTL_SECONDS).max(MIN_CACHE_TTL_SECONDS)
    }

    pub async fn episodes_ttl_seconds(&self) -> i64 {
        self.get_i64("episodesTtlSeconds", MIN_CACHE_TTL_SECONDS).max(MIN_CACHE_TTL_SECONDS)
    }

    pub async fn base_info_ttl_seconds(&self) -> i64 {
        self.get_i64("baseInfoTtlSeconds", MIN_CACHE_TTL_SECONDS).max(MIN_CACHE_TTL_SECONDS)
    }

    pub async fn metadata_search_ttl_seconds(&self) -> i64 {
        self.get_i64("metadataSearchTtlSeconds", MIN_CACHE_TTL_SECONDS).max(MIN_CACHE_TTL_SECONDS)
    }

    // ---- search -------------------------------------------------------------

    pub async fn search_max_results_per_source(&self) -> usize {
        self.get_i64("searchMaxResultsPerSource", DEFAULT_MAX_RESULTS_PER_SOURCE as i64).max(1) as usize
    }

    // ---- danmaku output shaping ----------------------------------------------

    pub async fn custom_danmaku_path_enabled(&self) -> bool {
        self.get_bool("customDanmakuPathEnabled", false).await
    }

    pub async fn movie_danmaku_directory_path(&self) -> Option<String> {
        self.get_string("movieDanmakuDirectoryPath").await
    }

    pub async fn movie_danmaku_filename_template(&self) -> Option<String> {
        self.get_string("movieDanmakuFilenameTemplate").await
    }

    pub async fn tv_danmaku_directory_path(&self) -> Option<String> {
        self.get_string("tvDanmakuDirectoryPath").await
    }

    pub async fn tv_danmaku_filename_template(&self) -> Option<String> {
        self.get_string("tvDanmakuFilenameTemplate").await
    }

    /// `-1` means unlimited.
    pub async fn danmaku_output_limit_per_source(&self) -> i64 {
        self.get_i64("danmakuOutputLimitPerSource", -1).await
    }

    pub async fn danmaku_blacklist_enabled(&self) -> bool {
        self.get_bool("danmakuBlacklistEnabled", false).await
    }

    pub async fn danmaku_blacklist_patterns(&self) -> Vec<String> {
        self.get_string("danmakuBlacklistPatterns")
            .await
            .map(|v| v.split('|').map(str::to_string).collect())
            .unwrap_or_default()
    }

    // ---- fallback toggles -----------------------------------------------------

    pub async fn match_fallback_enabled(&self) -> bool {
        self.get_bool("matchFallbackEnabled", true).await
    }

    pub async fn search_fallback_enabled(&self) -> bool {
        self.get_bool("searchFallbackEnabled", true).await
    }

    pub async fn webhook_fallback_enabled(&self) -> bool {
        self.get_bool("webhookFallbackEnabled", true).await
    }

    pub async fn predownload_next_episode_enabled(&self) -> bool {
        self.get_bool("preDownloadNextEpisodeEnabled", false).await
    }

    // ---- AI matcher -----------------------------------------------------------

    pub async fn ai_match_enabled(&self) -> bool {
        self.get_bool("aiMatchEnabled", false).await
    }

    pub async fn ai_fallback_enabled(&self) -> bool {
        self.get_bool("aiFallbackEnabled", true).await
    }

    // ---- name conversion --------------------------------------------------------

    pub async fn name_conversion_enabled(&self) -> bool {
        self.get_bool("nameConversionEnabled", false).await
    }

    pub async fn name_conversion_source_priority(&self) -> Vec<String> {
        self.get_string("nameConversionSourcePriority")
            .await
            .and_then(|v| serde_json::from_str(&v).ok())
            .unwrap_or_default()
    }

    // ---- title recognition rules ------------------------------------------------

    pub async fn title_recognition_blocklist(&self) -> Vec<String> {
        self.get_string("titleRecognitionBlocklist")
            .await
            .map(|v| v.split('|').map(str::to_string).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    pub async fn title_recognition_replacements(&self) -> Vec<(String, String)> {
        self.get_string("titleRecognitionReplacements")
            .await
            .and_then(|v| serde_json::from_str(&v).ok())
            .unwrap_or_default()
    }

    pub async fn title_recognition_season_offset_rules(&self) -> Vec<crate::services::title_recognition::SeasonOffsetRule> {
        self.get_string("titleRecognitionSeasonOffsetRules")
            .await
            .map(|v| v.lines().filter_map(crate::services::title_recognition::parse_offset_rule).collect())
            .unwrap_or_default()
    }

    pub async fn title_recognition_provider_season_mappings(&self) -> Vec<crate::services::title_recognition::ProviderSeasonMapping> {
        self.get_string("titleRecognitionProviderSeasonMappings")
            .await
            .map(|v| v.lines().filter_map(crate::services::title_recognition::parse_provider_mapping).collect())
            .unwrap_or_default()
    }

    /// Assembles the full rule set in one call, for startup wiring.
    pub async fn title_recognition_rules(&self) -> crate::services::title_recognition::TitleRecognitionRules {
        crate::services::title_recognition::TitleRecognitionRules {
            blocklist: self.title_recognition_blocklist().await,
            replacements: self.title_recognition_replacements().await,
            season_offset_rules: self.title_recognition_season_offset_rules().await,
            provider_season_mappings: self.title_recognition_provider_season_mappings().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unset_keys_fall_back_to_defaults() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let config = ConfigStore::new(store);
        assert_eq!(config.search_max_results_per_source().await, DEFAULT_MAX_RESULTS_PER_SOURCE);
        assert!(config.match_fallback_enabled().await);
        assert_eq!(config.danmaku_output_limit_per_source().await, -1);
    }

    #[tokio::test]
    async fn set_values_override_defaults() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let config = ConfigStore::new(store);
        config.set("aiMatchEnabled", "true").await.unwrap();
        assert!(config.ai_match_enabled().await);
    }
}
