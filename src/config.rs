use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub observability: ObservabilityConfig,

    pub auth: AuthConfig,

    pub rate_limiter: RateLimiterConfig,

    pub artifact_store: ArtifactStoreConfig,

    pub search: SearchConfig,

    pub providers: ProvidersConfig,

    pub webhook: WebhookConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            observability: ObservabilityConfig::default(),
            auth: AuthConfig::default(),
            rate_limiter: RateLimiterConfig::default(),
            artifact_store: ArtifactStoreConfig::default(),
            search: SearchConfig::default(),
            providers: ProvidersConfig::default(),
            webhook: WebhookConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    #[serde(default)]
    pub suppress_connection_errors: bool,

    /// Tokio multi-thread runtime worker count; 0 lets Tokio pick.
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/meguru.db".to_string(),
            log_level: "info".to_string(),
            suppress_connection_errors: false,
            worker_threads: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { enabled: true, port: 7890, cors_allowed_origins: vec!["*".to_string()] }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub metrics_port: Option<u16>,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = HashMap::new();
        labels.insert("app".to_string(), "meguru".to_string());

        Self {
            metrics_enabled: true,
            metrics_port: None,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

/// Single-admin auth (spec §1 Non-goals: no multi-user accounts).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,

    pub password: String,

    pub api_key: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "password".to_string(),
            api_key: "meguru_api_key".to_string(),
        }
    }
}

/// Static bootstrap for the rate limiter (spec §4.2). `provider_limits`
/// holds per-provider quotas; a provider absent from the map is
/// unlimited. Mirrors the Open Question's `RateLimiter`/
/// `RateLimiterDisabled` swap via `enabled`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimiterConfig {
    pub enabled: bool,

    pub global_limit: i32,

    pub provider_limits: HashMap<String, i32>,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self { enabled: true, global_limit: 5000, provider_limits: HashMap::new() }
    }
}

/// Static defaults for the danmaku artifact store (spec §4.3); overridable
/// per-episode by the dynamic config store's `customDanmakuPathEnabled`
/// family of keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactStoreConfig {
    pub root_dir: PathBuf,

    pub movie_template: String,

    pub tv_template: String,
}

impl Default for ArtifactStoreConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./danmaku"),
            movie_template: crate::constants::artifact::DEFAULT_MOVIE_TEMPLATE.to_string(),
            tv_template: crate::constants::artifact::DEFAULT_TV_TEMPLATE.to_string(),
        }
    }
}

/// Static bootstrap for the unified search pipeline (spec §4.4). The
/// per-call toggles (`use_alias_expansion`, …) live in
/// [`crate::models::SearchOptions`]; this section only carries what can't
/// reasonably be a per-call option: AI matcher credentials and the
/// provider display-order tiebreak.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub provider_display_order: Vec<String>,

    pub fallback_ladder_enabled: bool,

    pub ai: AiMatcherConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { provider_display_order: Vec::new(), fallback_ladder_enabled: true, ai: AiMatcherConfig::default() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiMatcherConfig {
    pub enabled: bool,

    pub fallback_enabled: bool,

    pub provider: String,

    pub api_key: String,

    pub base_url: String,

    pub model: String,
}

impl Default for AiMatcherConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            fallback_enabled: true,
            provider: "openai".to_string(),
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Which scraper/metadata-source implementations to register at startup,
/// and their base URLs. Individual providers are out of scope (spec §1);
/// this section only governs which reference implementations get wired
/// into the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub enabled_scrapers: Vec<String>,

    pub base_urls: HashMap<String, String>,

    /// Enabled metadata sources (title/ID resolution, spec §6); empty
    /// means none are registered.
    pub enabled_metadata_sources: Vec<String>,

    pub metadata_api_keys: HashMap<String, String>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        let mut base_urls = HashMap::new();
        base_urls.insert("bilibili".to_string(), "https://api.bilibili.com".to_string());
        base_urls.insert("tmdb".to_string(), "https://api.themoviedb.org/3".to_string());
        Self {
            enabled_scrapers: vec!["bilibili".to_string()],
            base_urls,
            enabled_metadata_sources: Vec::new(),
            metadata_api_keys: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub enabled_sources: Vec<String>,

    pub name_conversion_enabled: bool,

    pub name_conversion_source_priority: Vec<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled_sources: vec!["emby".to_string(), "jellyfin".to_string(), "plex".to_string(), "media_server".to_string()],
            name_conversion_enabled: false,
            name_conversion_source_priority: Vec::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::default_config_path();
        self.save_to_path(&path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("meguru").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".meguru").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.rate_limiter.enabled && self.rate_limiter.global_limit <= 0 {
            anyhow::bail!("rate_limiter.global_limit must be > 0 when the rate limiter is enabled");
        }

        if self.server.enabled && self.server.port == 0 {
            anyhow::bail!("server.port must be nonzero when the server is enabled");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 7890);
        assert!(config.rate_limiter.enabled);
        assert_eq!(config.rate_limiter.global_limit, 5000);
    }

    #[test]
    fn test_config_serialization_round_trips() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[rate_limiter]"));
        assert!(toml_str.contains("[artifact_store]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.general.database_path, config.general.database_path);
    }

    #[test]
    fn test_config_deserialization_partial_overrides() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [rate_limiter]
            global_limit = 100
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.rate_limiter.global_limit, 100);
        assert!(config.server.enabled);
    }

    #[test]
    fn validate_rejects_zero_global_limit_when_enabled() {
        let mut config = Config::default();
        config.rate_limiter.global_limit = 0;
        assert!(config.validate().is_err());
    }
}
