//! `refresh_episode` / `full_refresh`: re-fetch danmaku for episodes
//! already in the store under the same smart-refresh contract as import
//! (spec §4.6 step 3, "incremental refresh"). A source that keeps failing
//! is flagged via `incremental_refresh_failures` and excluded from the
//! bulk stale-source sweep once it crosses the configured threshold.

use tracing::{info, warn};

use super::TaskContext;
use crate::models::TaskOutcome;
use crate::services::artifact_store::PathVars;
use crate::services::danmaku_xml::normalize_p;
use crate::services::search::parse::strip_season_tokens;
use crate::services::task_manager::{BoxFuture, ProgressReporter, TaskFactory};

#[must_use]
pub fn refresh_episode_factory(ctx: TaskContext, episode_id: i64) -> TaskFactory {
    Box::new(move |progress, _cancel| -> BoxFuture { Box::pin(run_episode(ctx, episode_id, progress)) })
}

async fn run_episode(ctx: TaskContext, episode_id: i64, progress: ProgressReporter) -> TaskOutcome {
    match run_episode_inner(&ctx, episode_id, &progress).await {
        Ok(message) => TaskOutcome::done(message),
        Err(e) => TaskOutcome::Err(e),
    }
}

async fn run_episode_inner(ctx: &TaskContext, episode_id: i64, progress: &ProgressReporter) -> anyhow::Result<String> {
    let Some(episode) = ctx.store.get_episode(episode_id).await? else {
        anyhow::bail!("episode {episode_id} not found");
    };
    let Some((source, anime)) = find_source_for(ctx, episode.source_id).await? else {
        anyhow::bail!("source {} not found", episode.source_id);
    };
    let Some(scraper) = ctx.scrapers.get(&source.provider_name) else {
        anyhow::bail!("unknown provider {}", source.provider_name);
    };

    progress.report(10, "重新获取弹幕", None, true).await;

    if ctx.rate_limiter.check(&source.provider_name).await.is_err() {
        anyhow::bail!("provider {} currently rate limited", source.provider_name);
    }
    let comments = scraper.get_comments(&episode.provider_episode_id).await?;
    let _ = ctx.rate_limiter.increment(&source.provider_name).await;

    let comments: Vec<_> =
        comments.into_iter().map(|c| crate::models::Comment { p: normalize_p(&c.p, &source.provider_name), m: c.m, t: c.t, cid: c.cid }).collect();

    let media_type = crate::models::MediaType::parse(&anime.anime_type);
    let vars = PathVars {
        anime_id: anime.id,
        episode_id: episode.id,
        source_id: source.id,
        title: anime.title.clone(),
        title_base: strip_season_tokens(&anime.title),
        season: Some(anime.season),
        episode: episode.episode_index,
        year: anime.year,
        provider: source.provider_name.clone(),
    };

    match ctx
        .artifact_store
        .save_danmaku_for_episode(media_type, &vars, episode.danmaku_file_path.as_deref(), episode.comment_count, &comments)
        .await?
    {
        Some((path, count)) => {
            ctx.store.update_episode_artifact(episode.id, &path, count).await?;
            progress.report(100, "刷新完成", None, true).await;
            Ok(format!("刷新完成，弹幕数：{count}"))
        }
        None => Ok("未刷新，现有弹幕数据已是最新".to_string()),
    }
}

#[must_use]
pub fn full_refresh_factory(ctx: TaskContext, source_id: i32) -> TaskFactory {
    Box::new(move |progress, cancel| -> BoxFuture { Box::pin(run_full(ctx, source_id, progress, cancel)) })
}

async fn run_full(ctx: TaskContext, source_id: i32, progress: ProgressReporter, cancel: tokio_util::sync::CancellationToken) -> TaskOutcome {
    match run_full_inner(&ctx, source_id, &progress, &cancel).await {
        Ok(FullRefreshOutcome::Done(message)) => {
            let _ = ctx.store.reset_incremental_failure(source_id).await;
            TaskOutcome::done(message)
        }
        Ok(FullRefreshOutcome::PauseFor { retry_after_secs, provider }) => {
            TaskOutcome::pause_for(provider, retry_after_secs, "批量刷新触发限流，等待后重试")
        }
        Err(e) => {
            if let Ok(count) = ctx.store.record_incremental_failure(source_id).await {
                warn!(source_id, failures = count, "full refresh failed, incremental failure recorded");
            }
            TaskOutcome::Err(e)
        }
    }
}

enum FullRefreshOutcome {
    Done(String),
    PauseFor { retry_after_secs: u64, provider: String },
}

/// Enumerates the source's episodes from the DB rather than re-querying
/// the provider's episode list, which the spec notes is "frequently
/// broken" (spec §4.6). Each episode goes through the same single-episode
/// refresh path as `refresh_episode_task`; a rate-limit hit pauses the
/// *whole* refresh as one unit rather than skipping the one episode.
async fn run_full_inner(
    ctx: &TaskContext,
    source_id: i32,
    progress: &ProgressReporter,
    cancel: &tokio_util::sync::CancellationToken,
) -> anyhow::Result<FullRefreshOutcome> {
    let Some((source, anime)) = find_source_for(ctx, source_id).await? else {
        anyhow::bail!("source {source_id} not found");
    };
    let Some(scraper) = ctx.scrapers.get(&source.provider_name) else {
        anyhow::bail!("unknown provider {}", source.provider_name);
    };
    let media_type = crate::models::MediaType::parse(&anime.anime_type);

    let episodes = ctx.store.episodes_for_source(source_id).await?;
    let total = episodes.len().max(1);

    let mut refreshed = 0usize;
    let mut skipped = 0usize;
    let mut failed: Vec<String> = Vec::new();

    for (i, row) in episodes.into_iter().enumerate() {
        if cancel.is_cancelled() {
            anyhow::bail!("任务已取消");
        }

        if let Err(e) = ctx.rate_limiter.check(&source.provider_name).await {
            return Ok(FullRefreshOutcome::PauseFor { retry_after_secs: e.retry_after_secs, provider: source.provider_name.clone() });
        }
        let comments = match scraper.get_comments(&row.provider_episode_id).await {
            Ok(c) => c,
            Err(e) => {
                warn!(episode_id = row.id, error = %e, "episode comment fetch failed during full refresh");
                failed.push(format!("第{}集: {e}", row.episode_index));
                continue;
            }
        };
        let _ = ctx.rate_limiter.increment(&source.provider_name).await;

        let comments: Vec<_> =
            comments.into_iter().map(|c| crate::models::Comment { p: normalize_p(&c.p, &source.provider_name), m: c.m, t: c.t, cid: c.cid }).collect();

        let vars = PathVars {
            anime_id: anime.id,
            episode_id: row.id,
            source_id: source.id,
            title: anime.title.clone(),
            title_base: strip_season_tokens(&anime.title),
            season: Some(anime.season),
            episode: row.episode_index,
            year: anime.year,
            provider: source.provider_name.clone(),
        };

        match ctx
            .artifact_store
            .save_danmaku_for_episode(media_type, &vars, row.danmaku_file_path.as_deref(), row.comment_count, &comments)
            .await
        {
            Ok(Some((path, count))) => {
                ctx.store.update_episode_artifact(row.id, &path, count).await?;
                refreshed += 1;
            }
            Ok(None) => skipped += 1,
            Err(e) => {
                warn!(episode_id = row.id, error = %e, "failed to write danmaku artifact during full refresh");
                failed.push(format!("第{}集: {e}", row.episode_index));
            }
        }

        progress.report((((i + 1) * 100) / total) as u8, &format!("已处理 {}/{} 集", i + 1, total), None, false).await;
    }

    let mut message = format!("全量刷新完成：更新 {refreshed} 集，跳过 {skipped} 集（已是最新）");
    if !failed.is_empty() {
        message.push_str(&format!("，失败 {} 集：{}", failed.len(), failed.join("; ")));
    }
    Ok(FullRefreshOutcome::Done(message))
}

/// Bulk stale-source refresh (CLI supplement, grounded in
/// `original_source/src/commands/refresh_danmaku.py`): finds every
/// source below the incremental-failure threshold and runs a full
/// refresh on each, sequentially, to stay within the rate limiter.
pub async fn refresh_stale_sources(ctx: TaskContext, failure_threshold: i32) -> anyhow::Result<usize> {
    let sources = ctx.store.sources_below_failure_threshold(failure_threshold).await?;
    let mut refreshed = 0usize;
    for source in sources {
        info!(source_id = source.id, "refreshing stale source");
        let progress = ProgressReporter::detached(ctx.store.clone());
        match run_full_inner(&ctx, source.id, &progress, &tokio_util::sync::CancellationToken::new()).await {
            Ok(FullRefreshOutcome::Done(_)) => {
                let _ = ctx.store.reset_incremental_failure(source.id).await;
                refreshed += 1;
            }
            Ok(FullRefreshOutcome::PauseFor { provider, retry_after_secs }) => {
                warn!(source_id = source.id, provider, retry_after_secs, "stale source refresh hit a rate limit, skipping for this pass");
            }
            Err(e) => {
                let _ = ctx.store.record_incremental_failure(source.id).await;
                warn!(source_id = source.id, error = %e, "stale source refresh failed");
            }
        }
    }
    Ok(refreshed)
}

async fn find_source_for(
    ctx: &TaskContext,
    source_id: i32,
) -> anyhow::Result<Option<(crate::db::repositories::anime::SourceRow, crate::db::repositories::anime::AnimeRow)>> {
    ctx.store.get_source_with_anime(source_id).await
}
