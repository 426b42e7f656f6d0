//! The pausable, debounced progress callback handed to every task body
//! (spec §4.5, §6).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tokio::sync::{Mutex, Notify};
use tracing::debug;

use crate::constants::task_manager::PROGRESS_DEBOUNCE;
use crate::db::Store;
use crate::models::TaskStatus;

#[derive(Clone)]
pub struct ProgressReporter {
    task_id: String,
    store: Store,
    pause_notify: Arc<Notify>,
    paused: Arc<AtomicBool>,
    last_report: Arc<Mutex<Option<Instant>>>,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(task_id: String, store: Store, pause_notify: Arc<Notify>, paused: Arc<AtomicBool>) -> Self {
        Self { task_id, store, pause_notify, paused, last_report: Arc::new(Mutex::new(None)) }
    }

    /// A reporter for task bodies run outside the queue (the CLI's bulk
    /// refresh command): writes target a task id that was never inserted,
    /// so every `set_task_status` silently no-ops; `force`/pause semantics
    /// stay consistent so the same task body works either way.
    #[must_use]
    pub fn detached(store: Store) -> Self {
        Self {
            task_id: format!("detached-{}", uuid::Uuid::new_v4()),
            store,
            pause_notify: Arc::new(Notify::new()),
            paused: Arc::new(AtomicBool::new(false)),
            last_report: Arc::new(Mutex::new(None)),
        }
    }

    /// Awaits the pause gate, then writes a debounced progress update.
    /// `force` bypasses the debounce (start/finish/status-change calls).
    pub async fn report(&self, progress: u8, description: &str, status: Option<TaskStatus>, force: bool) {
        self.wait_if_paused().await;

        let mut last = self.last_report.lock().await;
        let due = force || last.is_none_or(|t| t.elapsed() >= PROGRESS_DEBOUNCE);
        if !due {
            return;
        }
        *last = Some(Instant::now());
        drop(last);

        let status = status.unwrap_or(TaskStatus::Running);
        let _ = self.store.set_task_status(&self.task_id, status, Some(i32::from(progress)), Some(description)).await;
        debug!(task_id = %self.task_id, progress, description, "task progress");
    }

    /// Blocks until `resume()` is called, if the task is currently paused.
    pub async fn wait_if_paused(&self) {
        while self.paused.load(Ordering::SeqCst) {
            self.pause_notify.notified().await;
        }
    }
}
