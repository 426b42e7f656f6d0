//! Crash-recovery startup pass (spec §4.5 step 2). `Running` rows left
//! over from an unclean shutdown are marked `Failed`; recoverable
//! `Pending` rows (`GenericImport`, `WebhookSearchAndDispatch`) are
//! rebuilt into fresh factories and resubmitted under new task ids, since
//! the in-memory closures a crash wiped out can only be reconstructed
//! from the persisted `task_parameters` JSON.

use std::sync::Arc;

use tracing::{info, warn};

use super::{NewTask, SubmitError, TaskFactory, TaskManager};
use crate::models::{QueueType, TaskStatus, TaskType};

/// The caller (wired up once `SharedState` exists, in `lib.rs`) supplies
/// a closure that turns `(task_type, task_parameters_json)` back into a
/// runnable factory plus the provider name the task will call, so the
/// queue worker can still honor a rate limit that was active at crash
/// time.
pub struct RecoveryContext<'a> {
    pub rebuild_factory: &'a dyn Fn(TaskType, &str) -> anyhow::Result<(TaskFactory, Option<String>)>,
}

impl TaskManager {
    pub async fn recover(self: &Arc<Self>, ctx: &RecoveryContext<'_>) -> anyhow::Result<()> {
        for row in self.store().tasks_in_status(TaskStatus::Running).await? {
            warn!(task_id = %row.task_id, "marking task interrupted by restart as failed");
            let _ = self.store().set_task_status(&row.task_id, TaskStatus::Failed, None, Some("服务重启")).await;
        }

        for row in self.store().tasks_in_status(TaskStatus::Pending).await? {
            let task_type = row.task_type.as_deref().and_then(TaskType::parse);
            let Some(task_type) = task_type.filter(|t| t.is_recoverable()) else {
                warn!(task_id = %row.task_id, "pending task has no recoverable type, cancelling");
                let _ = self.store().set_task_status(&row.task_id, TaskStatus::Failed, None, Some("无法恢复而取消")).await;
                continue;
            };

            let params = row.task_parameters.clone().unwrap_or_default();
            match (ctx.rebuild_factory)(task_type, &params) {
                Ok((factory, provider)) => {
                    let queue_type = QueueType::parse(&row.queue_type).unwrap_or(QueueType::Management);
                    let new_task = NewTask {
                        title: row.title.clone(),
                        queue_type,
                        unique_key: row.unique_key.clone(),
                        task_type: Some(task_type),
                        task_parameters: row.task_parameters.clone(),
                        provider,
                        factory,
                        run_immediately: false,
                    };
                    match self.submit(new_task).await {
                        Ok((new_id, _)) => {
                            info!(old_task_id = %row.task_id, new_task_id = %new_id, "recovered pending task under new id");
                            let _ = self.store().delete_task(&row.task_id).await;
                        }
                        Err(SubmitError::Conflict) => {
                            info!(task_id = %row.task_id, "equivalent task already active, dropping stale row");
                            let _ = self.store().delete_task(&row.task_id).await;
                        }
                        Err(SubmitError::Other(e)) => {
                            warn!(task_id = %row.task_id, error = %e, "failed to resubmit recovered task");
                            let _ = self.store().set_task_status(&row.task_id, TaskStatus::Failed, None, Some(&e.to_string())).await;
                        }
                    }
                }
                Err(e) => {
                    warn!(task_id = %row.task_id, error = %e, "failed to rebuild factory for recovered task");
                    let _ = self.store().set_task_status(&row.task_id, TaskStatus::Failed, None, Some(&e.to_string())).await;
                }
            }
        }

        Ok(())
    }
}
