//! Concrete task bodies run by the [`super::task_manager::TaskManager`]
//! (spec §4.6, §4.7): import, refresh, delete, and predownload. Each
//! function here builds a [`super::task_manager::TaskFactory`] closure
//! rather than running directly, since the manager only invokes a task's
//! body once it has actually been dequeued.

pub mod delete;
pub mod import;
pub mod predownload;
pub mod refresh;

use std::sync::Arc;

use crate::clients::{AiMatcher, MetadataSourceRegistry, ScraperRegistry};
use crate::db::Store;
use crate::services::artifact_store::ArtifactStore;
use crate::services::config_store::ConfigStore;
use crate::services::rate_limiter::RateLimiter;
use crate::services::search::UnifiedSearchService;
use crate::services::title_recognition::TitleRecognitionRules;

pub use delete::{delete_anime_factory, delete_episode_factory, delete_source_factory};
pub use import::generic_import_factory;
pub use predownload::predownload_factory;
pub use refresh::{full_refresh_factory, refresh_episode_factory, refresh_stale_sources};

/// Everything a task body needs to talk to the rest of the system.
/// Assembled once in `SharedState` and cloned cheaply into every
/// factory closure.
#[derive(Clone)]
pub struct TaskContext {
    pub store: Store,
    pub scrapers: ScraperRegistry,
    pub metadata_sources: MetadataSourceRegistry,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub ai_matcher: Option<Arc<dyn AiMatcher>>,
    pub artifact_store: ArtifactStore,
    pub config_store: ConfigStore,
    pub title_recognition: Arc<TitleRecognitionRules>,
    pub search_service: Arc<UnifiedSearchService>,
}
