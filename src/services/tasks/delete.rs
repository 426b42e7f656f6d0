//! `delete_anime` / `delete_source` / `delete_episode`: cascade the
//! database row removal the repositories already implement, then sweep
//! the freed artifact files off disk (spec §4.6 step 4).

use super::TaskContext;
use crate::models::TaskOutcome;
use crate::services::task_manager::{BoxFuture, ProgressReporter, TaskFactory};

#[must_use]
pub fn delete_anime_factory(ctx: TaskContext, anime_id: i32) -> TaskFactory {
    Box::new(move |progress, _cancel| -> BoxFuture {
        Box::pin(async move {
            match ctx.store.delete_anime_cascade(anime_id).await {
                Ok(paths) => finish_delete(&ctx, &progress, paths, "作品及其所有数据已删除").await,
                Err(e) => TaskOutcome::Err(e),
            }
        })
    })
}

#[must_use]
pub fn delete_source_factory(ctx: TaskContext, source_id: i32) -> TaskFactory {
    Box::new(move |progress, _cancel| -> BoxFuture {
        Box::pin(async move {
            match ctx.store.delete_source_cascade(source_id).await {
                Ok((paths, anime_also_deleted)) => {
                    let message = if anime_also_deleted { "数据源及作品已删除（无剩余数据源）" } else { "数据源已删除" };
                    finish_delete(&ctx, &progress, paths, message).await
                }
                Err(e) => TaskOutcome::Err(e),
            }
        })
    })
}

#[must_use]
pub fn delete_episode_factory(ctx: TaskContext, episode_id: i64) -> TaskFactory {
    Box::new(move |progress, _cancel| -> BoxFuture {
        Box::pin(async move {
            match ctx.store.delete_episode_cascade(episode_id).await {
                Ok(path) => finish_delete(&ctx, &progress, path.into_iter().collect(), "分集已删除").await,
                Err(e) => TaskOutcome::Err(e),
            }
        })
    })
}

async fn finish_delete(ctx: &TaskContext, progress: &ProgressReporter, paths: Vec<String>, message: &str) -> TaskOutcome {
    progress.report(50, "清理弹幕文件", None, true).await;
    if let Err(e) = ctx.artifact_store.delete_artifacts(&paths).await {
        return TaskOutcome::Err(e);
    }
    progress.report(100, message, None, true).await;
    TaskOutcome::done(message)
}
