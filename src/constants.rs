//! Application-wide constants. Centralizes magic values used across
//! multiple modules, following the teacher's `constants.rs` layout.

/// Rate-limiter defaults (spec §4.2).
pub mod rate_limit {
    pub const GLOBAL_PERIOD_SECONDS: i64 = 3600;
    pub const FALLBACK_QUOTA: i32 = 50;
    pub const GLOBAL_KEY: &str = "__global__";
    pub const FALLBACK_MATCH_KEY: &str = "__fallback_match__";
    pub const FALLBACK_SEARCH_KEY: &str = "__fallback_search__";
}

/// Cache TTLs (seconds), matching the config-store keys in spec §6.
pub mod cache {
    pub const SEARCH_ALIAS_TTL_SECONDS: i64 = 3600;
    pub const MIN_CACHE_TTL_SECONDS: i64 = 10_800;
}

/// Danmaku artifact store defaults (spec §4.3).
pub mod artifact {
    pub const DEFAULT_MOVIE_TEMPLATE: &str = "${title}/${episodeId}.xml";
    pub const DEFAULT_TV_TEMPLATE: &str = "${animeId}/${episodeId}.xml";
    pub const DEFAULT_FONTSIZE: i32 = 25;
    pub const DEFAULT_COLOR: i64 = 16_777_215;
    pub const CHATSERVER: &str = "api.meguru.internal";
}

/// Search pipeline defaults (spec §4.4).
pub mod search {
    pub const DEFAULT_MAX_RESULTS_PER_SOURCE: usize = 30;
    pub const DEFAULT_ALIAS_SIMILARITY_THRESHOLD: f64 = 75.0;
    pub const FALLBACK_ALIAS_SIMILARITY_THRESHOLD: f64 = 70.0;
    pub const TITLE_FILTER_THRESHOLD: f64 = 85.0;
    pub const STRICT_TITLE_FILTER_THRESHOLD: f64 = 95.0;
    pub const FAVORITED_OVERRIDE_THRESHOLD: f64 = 70.0;
}

/// Task manager polling/debounce intervals (spec §4.5).
pub mod task_manager {
    use std::time::Duration;

    pub const PAUSED_TASK_SCAN_INTERVAL: Duration = Duration::from_secs(1);
    pub const PROGRESS_DEBOUNCE: Duration = Duration::from_millis(500);
}

/// Bulk stale-source refresh defaults (spec §4.6 supplement).
pub mod refresh {
    pub const DEFAULT_STALE_FAILURE_THRESHOLD: i32 = 3;
}
