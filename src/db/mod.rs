//! The `Store` facade: a cheaply-cloneable handle around a single
//! `sea_orm::DatabaseConnection`, exposing one delegating method per
//! repository operation. Mirrors the teacher's `db::Store` shape: callers
//! never see `DatabaseConnection` directly, and each call instantiates the
//! relevant repository struct on demand rather than holding N live
//! repository objects.

pub mod migrator;
pub mod repositories;

use std::time::Duration;

use anyhow::Context;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::models::{AliasSet, MediaType, MetadataFill, QueueType, TaskStatus};
use repositories::{
    anime::AnimeRepository,
    auth::AuthRepository,
    cache::CacheRepository,
    config_kv::ConfigKvRepository,
    episode::EpisodeRepository,
    log::LogRepository,
    metadata::MetadataRepository,
    rate_limit::RateLimitRepository,
    task_history::TaskHistoryRepository,
};

#[derive(Clone)]
pub struct Store {
    conn: DatabaseConnection,
}

impl Store {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        if let Some(path) = database_url.strip_prefix("sqlite:") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:"
                && let Some(parent) = std::path::Path::new(path).parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating database directory {}", parent.display()))?;
            }
            if path != ":memory:" && !std::path::Path::new(path).exists() {
                std::fs::File::create(path)
                    .with_context(|| format!("creating database file {path}"))?;
            }
        }

        let mut opts = ConnectOptions::new(database_url.to_owned());
        opts.max_connections(10)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        let conn = Database::connect(opts)
            .await
            .context("connecting to the database")?;

        migrator::Migrator::up(&conn, None)
            .await
            .context("running database migrations")?;

        Ok(Self { conn })
    }

    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    fn anime_repo(&self) -> AnimeRepository {
        AnimeRepository::new(self.conn.clone())
    }

    fn episode_repo(&self) -> EpisodeRepository {
        EpisodeRepository::new(self.conn.clone())
    }

    fn metadata_repo(&self) -> MetadataRepository {
        MetadataRepository::new(self.conn.clone())
    }

    fn rate_limit_repo(&self) -> RateLimitRepository {
        RateLimitRepository::new(self.conn.clone())
    }

    fn cache_repo(&self) -> CacheRepository {
        CacheRepository::new(self.conn.clone())
    }

    fn config_kv_repo(&self) -> ConfigKvRepository {
        ConfigKvRepository::new(self.conn.clone())
    }

    fn task_history_repo(&self) -> TaskHistoryRepository {
        TaskHistoryRepository::new(self.conn.clone())
    }

    fn auth_repo(&self) -> AuthRepository {
        AuthRepository::new(self.conn.clone())
    }

    fn log_repo(&self) -> LogRepository {
        LogRepository::new(self.conn.clone())
    }

    // ---- anime / source / episode --------------------------------------

    pub async fn get_or_create_anime(
        &self,
        title: &str,
        anime_type: MediaType,
        season: i32,
        year: Option<i32>,
    ) -> anyhow::Result<(i32, bool)> {
        self.anime_repo().get_or_create(title, anime_type, season, year).await
    }

    pub async fn get_anime(&self, id: i32) -> anyhow::Result<Option<repositories::anime::AnimeRow>> {
        self.anime_repo().get(id).await
    }

    pub async fn find_anime(&self, title: &str, season: i32, year: Option<i32>) -> anyhow::Result<Option<repositories::anime::AnimeRow>> {
        self.anime_repo().find(title, season, year).await
    }

    pub async fn get_favorited_source(&self, anime_id: i32) -> anyhow::Result<Option<repositories::anime::SourceRow>> {
        self.anime_repo().get_favorited_source(anime_id).await
    }

    pub async fn delete_anime_cascade(&self, id: i32) -> anyhow::Result<Vec<String>> {
        self.anime_repo().delete_cascade(id, &self.episode_repo()).await
    }

    pub async fn get_or_create_source(
        &self,
        anime_id: i32,
        provider: &str,
        media_id: &str,
    ) -> anyhow::Result<(i32, i32, bool)> {
        self.anime_repo().get_or_create_source(anime_id, provider, media_id).await
    }

    pub async fn set_favorited_source(&self, anime_id: i32, source_id: i32) -> anyhow::Result<()> {
        self.anime_repo().set_favorited(anime_id, source_id).await
    }

    pub async fn delete_source_cascade(&self, source_id: i32) -> anyhow::Result<(Vec<String>, bool)> {
        self.anime_repo().delete_source_cascade(source_id, &self.episode_repo()).await
    }

    pub async fn record_incremental_failure(&self, source_id: i32) -> anyhow::Result<i32> {
        self.anime_repo().record_incremental_failure(source_id).await
    }

    pub async fn reset_incremental_failure(&self, source_id: i32) -> anyhow::Result<()> {
        self.anime_repo().reset_incremental_failure(source_id).await
    }

    pub async fn get_source_with_anime(
        &self,
        source_id: i32,
    ) -> anyhow::Result<Option<(repositories::anime::SourceRow, repositories::anime::AnimeRow)>> {
        self.anime_repo().get_source_with_anime(source_id).await
    }

    pub async fn sources_below_failure_threshold(
        &self,
        threshold: i32,
    ) -> anyhow::Result<Vec<repositories::anime::SourceRow>> {
        self.anime_repo().sources_below_failure_threshold(threshold).await
    }

    pub async fn find_source_by_provider_media(
        &self,
        provider: &str,
        media_id: &str,
    ) -> anyhow::Result<Option<(repositories::anime::SourceRow, repositories::anime::AnimeRow)>> {
        self.anime_repo().find_source_by_provider_media(provider, media_id).await
    }

    pub async fn upsert_episode(
        &self,
        source_id: i32,
        anime_id: i32,
        source_order: i32,
        episode_index: i32,
        title: Option<&str>,
        provider_episode_id: &str,
        source_url: Option<&str>,
    ) -> anyhow::Result<repositories::episode::EpisodeRow> {
        self.episode_repo()
            .upsert(source_id, anime_id, source_order, episode_index, title, provider_episode_id, source_url)
            .await
    }

    pub async fn get_episode(&self, id: i64) -> anyhow::Result<Option<repositories::episode::EpisodeRow>> {
        self.episode_repo().get(id).await
    }

    pub async fn episodes_for_source(
        &self,
        source_id: i32,
    ) -> anyhow::Result<Vec<repositories::episode::EpisodeRow>> {
        self.episode_repo().for_source(source_id).await
    }

    pub async fn update_episode_artifact(
        &self,
        id: i64,
        path: &str,
        comment_count: i32,
    ) -> anyhow::Result<()> {
        self.episode_repo().update_artifact(id, path, comment_count).await
    }

    pub async fn delete_episode_cascade(&self, id: i64) -> anyhow::Result<Option<String>> {
        self.episode_repo().delete_cascade(id).await
    }

    // ---- metadata / aliases ---------------------------------------------

    pub async fn fill_metadata_if_empty(&self, anime_id: i32, fill: MetadataFill) -> anyhow::Result<()> {
        self.metadata_repo().fill_if_empty(anime_id, fill).await
    }

    pub async fn upsert_aliases(&self, anime_id: i32, aliases: AliasSet) -> anyhow::Result<()> {
        self.metadata_repo().upsert_aliases(anime_id, aliases).await
    }

    pub async fn get_aliases(&self, anime_id: i32) -> anyhow::Result<AliasSet> {
        self.metadata_repo().get_aliases(anime_id).await
    }

    // ---- rate limiter -----------------------------------------------------

    pub async fn rate_limit_read(&self, key: &str) -> anyhow::Result<(i32, String, String)> {
        self.rate_limit_repo().read_or_init(key).await
    }

    pub async fn rate_limit_increment(&self, key: &str) -> anyhow::Result<i32> {
        self.rate_limit_repo().increment(key).await
    }

    pub async fn rate_limit_reset(&self, key: &str) -> anyhow::Result<()> {
        self.rate_limit_repo().reset(key).await
    }

    // ---- cache -------------------------------------------------------------

    pub async fn cache_get(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.cache_repo().get(key).await
    }

    pub async fn cache_set(&self, key: &str, value: &str, ttl_secs: i64) -> anyhow::Result<()> {
        self.cache_repo().set(key, value, ttl_secs).await
    }

    // ---- dynamic config kv --------------------------------------------------

    pub async fn config_get(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.config_kv_repo().get(key).await
    }

    pub async fn config_set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.config_kv_repo().set(key, value).await
    }

    pub async fn config_all(&self) -> anyhow::Result<Vec<(String, String)>> {
        self.config_kv_repo().all().await
    }

    // ---- task history --------------------------------------------------------

    pub async fn insert_task(
        &self,
        task_id: &str,
        title: &str,
        queue_type: QueueType,
        unique_key: Option<&str>,
        task_type: Option<&str>,
        task_parameters: Option<&str>,
    ) -> anyhow::Result<()> {
        self.task_history_repo()
            .insert(task_id, title, queue_type, unique_key, task_type, task_parameters)
            .await
    }

    pub async fn set_task_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        progress: Option<i32>,
        description: Option<&str>,
    ) -> anyhow::Result<()> {
        self.task_history_repo().set_status(task_id, status, progress, description).await
    }

    pub async fn get_task(&self, task_id: &str) -> anyhow::Result<Option<repositories::task_history::TaskRow>> {
        self.task_history_repo().get(task_id).await
    }

    pub async fn list_tasks(&self) -> anyhow::Result<Vec<repositories::task_history::TaskRow>> {
        self.task_history_repo().list().await
    }

    pub async fn delete_task(&self, task_id: &str) -> anyhow::Result<()> {
        self.task_history_repo().delete(task_id).await
    }

    pub async fn tasks_in_status(&self, status: TaskStatus) -> anyhow::Result<Vec<repositories::task_history::TaskRow>> {
        self.task_history_repo().in_status(status).await
    }

    // ---- auth ------------------------------------------------------------

    pub async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<repositories::auth::UserRow>> {
        self.auth_repo().find_by_username(username).await
    }

    pub async fn create_user(&self, username: &str, password_hash: &str) -> anyhow::Result<i32> {
        self.auth_repo().create_user(username, password_hash).await
    }

    pub async fn create_session(&self, user_id: i32, ttl_secs: i64) -> anyhow::Result<String> {
        self.auth_repo().create_session(user_id, ttl_secs).await
    }

    pub async fn validate_token(&self, token_hash: &str) -> anyhow::Result<bool> {
        self.auth_repo().validate_token(token_hash).await
    }

    pub async fn create_token(&self, token_hash: &str, label: Option<&str>) -> anyhow::Result<i32> {
        self.auth_repo().create_token(token_hash, label).await
    }

    // ---- observability logs -------------------------------------------------

    pub async fn log_external_call(&self, provider: &str, status: &str, latency_ms: i32) -> anyhow::Result<()> {
        self.log_repo().log_external_call(provider, status, latency_ms).await
    }

    pub async fn log_token_access(&self, token_id: Option<i32>, path: &str, ip: Option<&str>) -> anyhow::Result<()> {
        self.log_repo().log_token_access(token_id, path, ip).await
    }
}
