//! Predownload: once an episode is imported, optionally pre-fetch the
//! next episode ahead of when a media server would ask for it (spec
//! §4.6, dynamic config `preDownloadNextEpisodeEnabled`). Reuses the same
//! fetch/normalize/save path as `refresh_episode`, just targeting the
//! next `episode_index` on the same source instead of an existing row.

use tracing::info;

use super::TaskContext;
use crate::models::TaskOutcome;
use crate::services::artifact_store::PathVars;
use crate::services::danmaku_xml::normalize_p;
use crate::services::search::parse::strip_season_tokens;
use crate::services::task_manager::{BoxFuture, ProgressReporter, TaskFactory};

#[must_use]
pub fn predownload_factory(ctx: TaskContext, source_id: i32, current_episode_index: i32) -> TaskFactory {
    Box::new(move |progress, _cancel| -> BoxFuture { Box::pin(run(ctx, source_id, current_episode_index, progress)) })
}

async fn run(ctx: TaskContext, source_id: i32, current_episode_index: i32, progress: ProgressReporter) -> TaskOutcome {
    match run_inner(&ctx, source_id, current_episode_index, &progress).await {
        Ok(message) => TaskOutcome::done(message),
        Err(e) => TaskOutcome::Err(e),
    }
}

async fn run_inner(ctx: &TaskContext, source_id: i32, current_episode_index: i32, progress: &ProgressReporter) -> anyhow::Result<String> {
    if !ctx.config_store.predownload_next_episode_enabled().await {
        return Ok("预下载功能未启用，跳过".to_string());
    }

    let Some((source, anime)) = ctx.store.get_source_with_anime(source_id).await? else {
        anyhow::bail!("source {source_id} not found");
    };
    let Some(scraper) = ctx.scrapers.get(&source.provider_name) else {
        anyhow::bail!("unknown provider {}", source.provider_name);
    };
    let media_type = crate::models::MediaType::parse(&anime.anime_type);
    let next_index = current_episode_index + 1;

    if ctx.rate_limiter.check(&source.provider_name).await.is_err() {
        anyhow::bail!("provider {} currently rate limited", source.provider_name);
    }
    let episodes = scraper.get_episodes(&source.media_id, Some(media_type)).await?;
    let _ = ctx.rate_limiter.increment(&source.provider_name).await;

    let Some(next) = episodes.into_iter().find(|e| e.episode_index == next_index) else {
        return Ok(format!("第 {next_index} 集尚未发布，跳过预下载"));
    };

    progress.report(20, "预下载下一集", None, true).await;

    let row = ctx
        .store
        .upsert_episode(source.id, anime.id, source.source_order, next.episode_index, next.title.as_deref(), &next.episode_id, next.url.as_deref())
        .await?;

    if row.danmaku_file_path.is_some() {
        return Ok("下一集已存在弹幕数据，跳过预下载".to_string());
    }

    if ctx.rate_limiter.check(&source.provider_name).await.is_err() {
        anyhow::bail!("provider {} currently rate limited", source.provider_name);
    }
    let comments = scraper.get_comments(&next.episode_id).await?;
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
        episode: next.episode_index,
        year: anime.year,
        provider: source.provider_name.clone(),
    };

    match ctx.artifact_store.save_danmaku_for_episode(media_type, &vars, None, 0, &comments).await? {
        Some((path, count)) => {
            ctx.store.update_episode_artifact(row.id, &path, count).await?;
            progress.report(100, "预下载完成", None, true).await;
            info!(episode_id = row.id, count, "predownloaded next episode");
            Ok(format!("预下载完成，第 {next_index} 集弹幕数：{count}"))
        }
        None => Ok("未获取到弹幕数据".to_string()),
    }
}
