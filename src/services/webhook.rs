//! Webhook dispatcher (spec §4.7): a media server's "new episode aired"
//! event turns into a search-then-import task. Guarded by a per-key
//! async semaphore so a burst of duplicate events for one series
//! coalesces instead of each spawning its own search.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

use crate::clients::MetadataSource;
use crate::constants::search::FALLBACK_ALIAS_SIMILARITY_THRESHOLD;
use crate::models::{GenericImportParams, MediaType, QueueType, SearchOptions, TaskOutcome, TaskType, WebhookDispatchParams};
use crate::services::config_store::ConfigStore;
use crate::services::task_manager::{BoxFuture, NewTask, ProgressReporter, SubmitError, TaskFactory, TaskManager};
use crate::services::tasks::{TaskContext, generic_import_factory};

/// Per-`webhook-{title}-S{season}` dedup lock, held for the lifetime of
/// one dispatch (spec §5: "Webhook search lock is a per-key async
/// semaphore").
#[derive(Clone, Default)]
pub struct WebhookLocks {
    locks: Arc<DashMap<String, Arc<AsyncMutex<()>>>>,
}

impl WebhookLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: &str) -> Arc<AsyncMutex<()>> {
        Arc::clone(self.locks.entry(key.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))))
    }
}

#[must_use]
pub fn webhook_dispatch_factory(
    ctx: TaskContext,
    task_manager: Arc<TaskManager>,
    locks: WebhookLocks,
    name_conversion_enabled: bool,
    name_conversion_priority: Vec<String>,
    params: WebhookDispatchParams,
) -> TaskFactory {
    Box::new(move |progress, cancel| -> BoxFuture {
        Box::pin(run(ctx, task_manager, locks, name_conversion_enabled, name_conversion_priority, params, progress, cancel))
    })
}

async fn run(
    ctx: TaskContext,
    task_manager: Arc<TaskManager>,
    locks: WebhookLocks,
    name_conversion_enabled: bool,
    name_conversion_priority: Vec<String>,
    params: WebhookDispatchParams,
    progress: ProgressReporter,
    _cancel: tokio_util::sync::CancellationToken,
) -> TaskOutcome {
    let lock_key = format!("webhook-{}-S{}", params.anime_title, params.season);
    let guard = locks.lock_for(&lock_key);
    let _held = guard.lock().await;

    progress.report(5, "处理 Webhook 事件", None, true).await;

    let title = if name_conversion_enabled && !is_mostly_chinese(&params.anime_title) {
        convert_title(&ctx, &name_conversion_priority, &params.anime_title, params.media_type).await.unwrap_or_else(|| params.anime_title.clone())
    } else {
        params.anime_title.clone()
    };

    match dispatch_inner(&ctx, &task_manager, &ctx.config_store, &title, &params, &progress).await {
        Ok(message) => TaskOutcome::done(message),
        Err(e) => TaskOutcome::Err(e),
    }
}

async fn dispatch_inner(
    ctx: &TaskContext,
    task_manager: &Arc<TaskManager>,
    config_store: &ConfigStore,
    title: &str,
    params: &WebhookDispatchParams,
    progress: &ProgressReporter,
) -> anyhow::Result<String> {
    // Step 1: an already-favorited source for a cataloged (title, season) short-circuits search.
    if let Some(anime) = ctx.store.find_anime(title, params.season, params.year).await?
        && let Some(favorited) = ctx.store.get_favorited_source(anime.id).await?
    {
        return submit_import(ctx, task_manager, title, &favorited.provider_name, &favorited.media_id, params, progress).await;
    }

    if !config_store.webhook_fallback_enabled().await {
        anyhow::bail!("未找到已收藏数据源，且 Webhook 回退已禁用");
    }

    let options = SearchOptions {
        use_alias_expansion: true,
        use_alias_filtering: true,
        use_title_filtering: true,
        use_source_priority_sorting: true,
        strict_filtering: true,
        alias_similarity_threshold: FALLBACK_ALIAS_SIMILARITY_THRESHOLD,
        episode_info: Some(crate::models::EpisodeInfoHint { season: Some(params.season), episode: params.current_episode_index }),
        ..Default::default()
    };

    progress.report(20, "搜索匹配源", None, true).await;
    let term = params.search_keyword.clone().unwrap_or_else(|| title.to_string());
    let candidates = ctx.search_service.unified_search(&term, &options).await?;

    let Some(best) = candidates.into_iter().next() else {
        anyhow::bail!("未找到匹配的弹幕源");
    };

    submit_import(ctx, task_manager, title, &best.provider, &best.media_id, params, progress).await
}

async fn submit_import(
    ctx: &TaskContext,
    task_manager: &Arc<TaskManager>,
    title: &str,
    provider: &str,
    media_id: &str,
    params: &WebhookDispatchParams,
    progress: &ProgressReporter,
) -> anyhow::Result<String> {
    let unique_key = format!(
        "import-{}-{}-S{}-ep{}",
        provider,
        media_id,
        params.season,
        params.current_episode_index.map_or_else(String::new, |e| e.to_string())
    );

    progress.report(60, "提交导入任务", None, true).await;

    let import_params = GenericImportParams {
        provider: provider.to_string(),
        media_id: media_id.to_string(),
        anime_title: title.to_string(),
        media_type: params.media_type,
        season: params.season,
        year: params.year,
        current_episode_index: params.current_episode_index,
    };

    let factory = generic_import_factory(ctx.clone(), import_params.clone());

    let new_task = NewTask {
        title: title.to_string(),
        queue_type: QueueType::Download,
        unique_key: Some(unique_key),
        task_type: Some(TaskType::GenericImport),
        task_parameters: serde_json::to_string(&import_params).ok(),
        provider: Some(provider.to_string()),
        factory,
        run_immediately: false,
    };

    match task_manager.submit(new_task).await {
        Ok(_) => Ok("已提交导入任务".to_string()),
        Err(SubmitError::Conflict) => {
            info!(provider, media_id, "equivalent import task already in progress, treating as success");
            Ok("任务已在队列中".to_string())
        }
        Err(SubmitError::Other(e)) => Err(e),
    }
}

fn is_mostly_chinese(s: &str) -> bool {
    let cjk = s.chars().filter(|c| ('\u{4e00}'..='\u{9fff}').contains(c)).count();
    cjk * 2 >= s.chars().filter(|c| !c.is_whitespace()).count().max(1)
}

async fn convert_title(ctx: &TaskContext, priority: &[String], title: &str, media_type: MediaType) -> Option<String> {
    let mut sources: Vec<Arc<dyn MetadataSource>> = ctx.metadata_sources.all();
    if !priority.is_empty() {
        sources.sort_by_key(|s| priority.iter().position(|p| p == s.source_name()).unwrap_or(usize::MAX));
    }
    for source in sources {
        match source.search(title, Some(media_type)).await {
            Ok(results) => {
                if let Some(hit) = results.into_iter().find(|r| is_mostly_chinese(&r.title)) {
                    return Some(hit.title);
                }
            }
            Err(e) => warn!(source = source.source_name(), error = %e, "name-conversion lookup failed"),
        }
    }
    None
}
