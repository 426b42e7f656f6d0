//! `generic_import`: fetches one provider/media's episode list and
//! danmaku comments and writes them into the store (spec §4.6 step 1
//! onward). The search pipeline (spec §4.4) has already chosen the
//! `(provider, media_id)` pair by the time this task runs; this body's
//! job is purely fetch → normalize → persist.

use tracing::{info, warn};

use super::TaskContext;
use crate::models::{GenericImportParams, MetadataFill, TaskOutcome};
use crate::services::artifact_store::PathVars;
use crate::services::danmaku_xml::normalize_p;
use crate::services::search::parse::strip_season_tokens;
use crate::services::task_manager::{BoxFuture, ProgressReporter, TaskFactory};

#[must_use]
pub fn generic_import_factory(ctx: TaskContext, params: GenericImportParams) -> TaskFactory {
    Box::new(move |progress, cancel| -> BoxFuture { Box::pin(run(ctx, params, progress, cancel)) })
}

async fn run(
    ctx: TaskContext,
    params: GenericImportParams,
    progress: ProgressReporter,
    cancel: tokio_util::sync::CancellationToken,
) -> TaskOutcome {
    match run_inner(&ctx, &params, &progress, &cancel).await {
        Ok(message) => TaskOutcome::done(message),
        Err(ImportError::RateLimited { retry_after_secs }) => {
            TaskOutcome::pause_for(params.provider.clone(), retry_after_secs, "触发限流，等待后重试")
        }
        Err(ImportError::Other(e)) => TaskOutcome::Err(e),
    }
}

enum ImportError {
    RateLimited { retry_after_secs: u64 },
    Other(anyhow::Error),
}

impl From<anyhow::Error> for ImportError {
    fn from(e: anyhow::Error) -> Self {
        Self::Other(e)
    }
}

async fn run_inner(
    ctx: &TaskContext,
    params: &GenericImportParams,
    progress: &ProgressReporter,
    cancel: &tokio_util::sync::CancellationToken,
) -> Result<String, ImportError> {
    let Some(scraper) = ctx.scrapers.get(&params.provider) else {
        return Err(anyhow::anyhow!("unknown provider {}", params.provider).into());
    };

    let identity = ctx.title_recognition.normalize(&params.anime_title, params.season, params.current_episode_index, &params.provider);

    progress.report(5, "识别条目信息", None, true).await;

    let (anime_id, _created) = ctx
        .store
        .get_or_create_anime(&identity.title, params.media_type, identity.season, params.year)
        .await?;
    let (source_id, source_order, _created) = ctx.store.get_or_create_source(anime_id, &params.provider, &params.media_id).await?;

    if let Err(e) = ctx.rate_limiter.check(&params.provider).await {
        return Err(ImportError::RateLimited { retry_after_secs: e.retry_after_secs });
    }
    let all_episodes = scraper.get_episodes(&params.media_id, Some(params.media_type)).await?;
    let _ = ctx.rate_limiter.increment(&params.provider).await;

    let episodes: Vec<_> = match identity.episode_index {
        Some(idx) => all_episodes.into_iter().filter(|e| e.episode_index == idx).collect(),
        None => all_episodes,
    };

    if episodes.is_empty() {
        return Err(anyhow::anyhow!("provider reported no matching episodes").into());
    }

    let total = episodes.len();
    let mut imported = 0usize;

    for (i, episode) in episodes.into_iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(anyhow::anyhow!("任务已取消").into());
        }

        let row = ctx
            .store
            .upsert_episode(source_id, anime_id, source_order, episode.episode_index, episode.title.as_deref(), &episode.episode_id, episode.url.as_deref())
            .await?;

        if let Err(e) = ctx.rate_limiter.check(&params.provider).await {
            return Err(ImportError::RateLimited { retry_after_secs: e.retry_after_secs });
        }
        let comments = scraper.get_comments(&episode.episode_id).await?;
        let _ = ctx.rate_limiter.increment(&params.provider).await;

        let comments: Vec<_> = comments
            .into_iter()
            .map(|c| crate::models::Comment { p: normalize_p(&c.p, &params.provider), m: c.m, t: c.t, cid: c.cid })
            .collect();

        let vars = PathVars {
            anime_id,
            episode_id: row.id,
            source_id,
            title: identity.title.clone(),
            title_base: strip_season_tokens(&identity.title),
            season: Some(identity.season),
            episode: episode.episode_index,
            year: params.year,
            provider: params.provider.clone(),
        };

        match ctx
            .artifact_store
            .save_danmaku_for_episode(params.media_type, &vars, row.danmaku_file_path.as_deref(), row.comment_count, &comments)
            .await
        {
            Ok(Some((path, count))) => {
                ctx.store.update_episode_artifact(row.id, &path, count).await?;
                imported += 1;
            }
            Ok(None) => info!(episode_id = row.id, "smart-refresh skipped, not strictly richer"),
            Err(e) => warn!(episode_id = row.id, error = %e, "failed to write danmaku artifact"),
        }

        let pct = (((i + 1) * 100) / total) as u8;
        progress.report(pct.min(99), &format!("已处理 {}/{} 集", i + 1, total), None, false).await;
    }

    if let Some(details) = first_metadata_match(ctx, &identity.title, params.media_type).await {
        let _ = ctx
            .store
            .fill_metadata_if_empty(
                anime_id,
                MetadataFill {
                    tmdb_id: details.tmdb_id,
                    tmdb_episode_group_id: None,
                    imdb_id: details.imdb_id,
                    tvdb_id: details.tvdb_id,
                    douban_id: details.douban_id,
                    bangumi_id: details.bangumi_id,
                },
            )
            .await;
    }

    Ok(format!("导入完成，共写入 {imported} 条弹幕文件"))
}

/// Best-effort metadata enrichment from the first registered metadata
/// source that returns a hit; failures are swallowed since this only
/// fills already-empty fields (spec §4.6 "fill-if-empty" discipline).
async fn first_metadata_match(ctx: &TaskContext, title: &str, media_type: crate::models::MediaType) -> Option<crate::models::MetadataDetails> {
    for source in ctx.metadata_sources.all() {
        match source.search(title, Some(media_type)).await {
            Ok(mut results) if !results.is_empty() => return Some(results.remove(0)),
            Ok(_) => {}
            Err(e) => warn!(source = source.source_name(), error = %e, "metadata lookup failed"),
        }
    }
    None
}
