//! Shared application state used across the HTTP API and the task
//! manager's workers.
//!
//! This module provides a unified `SharedState` struct bundling every
//! service the webhook/API handlers and task bodies need, eliminating
//! duplicate initialization across the daemon's entry points.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::clients::metadata_sources::tmdb::TmdbMetadataSource;
use crate::clients::providers::bilibili::BilibiliScraper;
use crate::clients::{AiMatcher, MetadataSourceRegistry, ScraperRegistry};
use crate::config::Config;
use crate::db::Store;
use crate::models::{GenericImportParams, TaskType, WebhookDispatchParams};
use crate::services::artifact_store::ArtifactStoreConfig;
use crate::services::rate_limiter::{DbRateLimiter, DisabledRateLimiter, QuotaConfig, RateLimiter};
use crate::services::task_manager::{RecoveryContext, TaskFactory, TaskManager};
use crate::services::tasks::{TaskContext, generic_import_factory};
use crate::services::title_recognition::TitleRecognitionRules;
use crate::services::webhook::{WebhookLocks, webhook_dispatch_factory};
use crate::services::{ArtifactStore, ConfigStore, UnifiedSearchService};

/// Shared application state containing services used by both the HTTP
/// API and the task manager's workers.
///
/// Designed to be wrapped in `Arc` and shared across components.
#[derive(Clone)]
pub struct SharedState {
    /// Application configuration (wrapped in `RwLock` for runtime reloads).
    pub config: Arc<RwLock<Config>>,

    /// Database store.
    pub store: Store,

    /// Rate limiter (spec §4.2): `DbRateLimiter` or `DisabledRateLimiter`
    /// depending on `config.rate_limiter.enabled`.
    pub rate_limiter: Arc<dyn RateLimiter>,

    /// The live quota table backing `rate_limiter` when it's a
    /// `DbRateLimiter`; `None` when the limiter is disabled. Kept
    /// alongside the trait object so `PUT /api/rate-limits/{provider}`
    /// can mutate a provider's quota without a trait-object downcast.
    pub quotas: Option<QuotaConfig>,

    /// Danmaku XML artifact tree (spec §4.3).
    pub artifact_store: ArtifactStore,

    /// Dynamic, operator-visible runtime configuration (spec §6).
    pub config_store: ConfigStore,

    /// Registered danmaku scrapers.
    pub scrapers: ScraperRegistry,

    /// Registered metadata sources (title/ID resolution).
    pub metadata_sources: MetadataSourceRegistry,

    /// Optional AI-assisted disambiguation matcher (spec §4.4 stage 7).
    pub ai_matcher: Option<Arc<dyn AiMatcher>>,

    /// The unified search pipeline (spec §4.4).
    pub search_service: Arc<UnifiedSearchService>,

    /// Task manager: queues, workers, pause/resume/abort/cancel (spec §4.5).
    pub task_manager: Arc<TaskManager>,

    /// Title/season/episode normalization rules (spec §4.6 step 1).
    pub title_recognition: Arc<TitleRecognitionRules>,

    /// Per-key webhook dispatch dedup locks (spec §4.7).
    pub webhook_locks: WebhookLocks,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::new(&config.general.database_path).await?;

        let quotas = config.rate_limiter.enabled.then(|| QuotaConfig::new(config.rate_limiter.global_limit, config.rate_limiter.provider_limits.clone()));

        let rate_limiter: Arc<dyn RateLimiter> = match &quotas {
            Some(quotas) => Arc::new(DbRateLimiter::new(store.clone(), quotas.clone())),
            None => Arc::new(DisabledRateLimiter),
        };

        let artifact_store = ArtifactStore::new(ArtifactStoreConfig {
            root_dir: config.artifact_store.root_dir.clone(),
            movie_template: config.artifact_store.movie_template.clone(),
            tv_template: config.artifact_store.tv_template.clone(),
        });

        let config_store = ConfigStore::new(store.clone());

        let scrapers = ScraperRegistry::new();
        for name in &config.providers.enabled_scrapers {
            match name.as_str() {
                "bilibili" => {
                    let base_url = config.providers.base_urls.get("bilibili").cloned().unwrap_or_else(|| "https://api.bilibili.com".to_string());
                    scrapers.register(Arc::new(BilibiliScraper::new(base_url)));
                }
                other => warn!(provider = other, "no reference scraper implementation registered for provider"),
            }
        }

        let metadata_sources = MetadataSourceRegistry::new();
        for name in &config.providers.enabled_metadata_sources {
            match name.as_str() {
                "tmdb" => {
                    let base_url = config.providers.base_urls.get("tmdb").cloned().unwrap_or_else(|| "https://api.themoviedb.org/3".to_string());
                    let api_key = config.providers.metadata_api_keys.get("tmdb").cloned().unwrap_or_default();
                    metadata_sources.register(Arc::new(TmdbMetadataSource::new(base_url, api_key)));
                }
                other => warn!(source = other, "no reference metadata source implementation registered for provider"),
            }
        }

        let ai_matcher: Option<Arc<dyn AiMatcher>> = None;

        let title_recognition = Arc::new(config_store.title_recognition_rules().await);

        let search_service = Arc::new(UnifiedSearchService::new(
            store.clone(),
            scrapers.clone(),
            metadata_sources.clone(),
            Arc::clone(&rate_limiter),
            ai_matcher.clone(),
            config.search.ai.fallback_enabled,
            config.search.fallback_ladder_enabled,
            config.search.provider_display_order.clone(),
        ));

        let task_manager = TaskManager::spawn(store.clone(), Arc::clone(&rate_limiter));

        let webhook_locks = WebhookLocks::new();

        let state = Self {
            config: Arc::new(RwLock::new(config)),
            store,
            rate_limiter,
            quotas,
            artifact_store,
            config_store,
            scrapers,
            metadata_sources,
            ai_matcher,
            search_service,
            task_manager,
            title_recognition,
            webhook_locks,
        };

        state.recover_tasks().await;

        Ok(state)
    }

    /// Get a read-only snapshot of the current config.
    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }

    #[must_use]
    pub fn task_context(&self) -> TaskContext {
        TaskContext {
            store: self.store.clone(),
            scrapers: self.scrapers.clone(),
            metadata_sources: self.metadata_sources.clone(),
            rate_limiter: Arc::clone(&self.rate_limiter),
            ai_matcher: self.ai_matcher.clone(),
            artifact_store: self.artifact_store.clone(),
            config_store: self.config_store.clone(),
            title_recognition: Arc::clone(&self.title_recognition),
            search_service: Arc::clone(&self.search_service),
        }
    }

    /// Crash-recovery startup pass (spec §4.5 step 2): rebuilds a
    /// `TaskFactory` from persisted `task_parameters` JSON for every
    /// recoverable pending task type.
    async fn recover_tasks(&self) {
        let ctx = self.task_context();
        let task_manager = Arc::clone(&self.task_manager);
        let webhook_locks = self.webhook_locks.clone();
        let name_conversion_enabled = self.config_store.name_conversion_enabled().await;
        let name_conversion_priority = self.config_store.name_conversion_source_priority().await;

        let rebuild = move |task_type: TaskType, params: &str| -> anyhow::Result<(TaskFactory, Option<String>)> {
            match task_type {
                TaskType::GenericImport => {
                    let parsed: GenericImportParams = serde_json::from_str(params)?;
                    let provider = parsed.provider.clone();
                    Ok((generic_import_factory(ctx.clone(), parsed), Some(provider)))
                }
                TaskType::WebhookSearchAndDispatch => {
                    let parsed: WebhookDispatchParams = serde_json::from_str(params)?;
                    Ok((
                        webhook_dispatch_factory(
                            ctx.clone(),
                            Arc::clone(&task_manager),
                            webhook_locks.clone(),
                            name_conversion_enabled,
                            name_conversion_priority.clone(),
                            parsed,
                        ),
                        None,
                    ))
                }
                other => anyhow::bail!("task type {} is not recoverable", other.as_str()),
            }
        };

        let recovery_ctx = RecoveryContext { rebuild_factory: &rebuild };
        match self.task_manager.recover(&recovery_ctx).await {
            Ok(()) => info!("task recovery pass complete"),
            Err(e) => warn!(error = %e, "task recovery pass failed"),
        }
    }
}
