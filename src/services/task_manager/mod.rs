//! Three FIFO queues (download / management / fallback), one worker per
//! queue, plus a paused-task monitor (spec §4.5). Concurrency primitives
//! per the Design Notes rendition: `tokio::sync::Notify` for the
//! pause/resume edge-trigger, `tokio::sync::oneshot` for `done_event`,
//! `tokio_util::sync::CancellationToken` per task for abort, and
//! `dashmap::DashMap` for the shared maps instead of one global mutex
//! (DashMap's per-shard locking gives the same O(1)-critical-section
//! guarantee without serializing unrelated keys).

pub mod progress;
pub mod recovery;

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{Mutex, Notify, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::constants::task_manager::PAUSED_TASK_SCAN_INTERVAL;
use crate::db::Store;
use crate::models::{QueueType, TaskStatus, TaskType};
use crate::services::rate_limiter::RateLimiter;

pub use progress::ProgressReporter;
pub use recovery::RecoveryContext;

pub type BoxFuture = Pin<Box<dyn Future<Output = crate::models::TaskOutcome> + Send>>;
pub type TaskFactory = Box<dyn FnOnce(ProgressReporter, CancellationToken) -> BoxFuture + Send>;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("已在队列中")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Everything the caller must supply to submit a task (spec §4.5 "Submit
/// contract").
pub struct NewTask {
    pub title: String,
    pub queue_type: QueueType,
    pub unique_key: Option<String>,
    pub task_type: Option<TaskType>,
    pub task_parameters: Option<String>,
    pub provider: Option<String>,
    pub factory: TaskFactory,
    pub run_immediately: bool,
}

struct QueueState {
    items: Mutex<VecDeque<String>>,
    notify: Notify,
}

impl QueueState {
    fn new() -> Self {
        Self { items: Mutex::new(VecDeque::new()), notify: Notify::new() }
    }
}

struct PausedEntry {
    queue_type: QueueType,
    resume_at: DateTime<Utc>,
}

struct TaskEntry {
    title: String,
    queue_type: QueueType,
    unique_key: Option<String>,
    task_type: Option<TaskType>,
    task_parameters: Option<String>,
    provider: Option<String>,
    factory: Mutex<Option<TaskFactory>>,
    pause_notify: Arc<Notify>,
    paused: Arc<AtomicBool>,
    cancel: CancellationToken,
    done_tx: Mutex<Option<oneshot::Sender<()>>>,
    running_handle: Mutex<Option<tokio::task::AbortHandle>>,
}

/// The shared maps the Design Notes describe as "guarded by one async
/// mutex" — here, independently-sharded `DashMap`s plus a single
/// `submission_lock` serializing only the check-then-insert critical
/// section of `submit`.
pub struct TaskManager {
    store: Store,
    rate_limiter: Arc<dyn RateLimiter>,
    queues: std::collections::HashMap<QueueType, Arc<QueueState>>,
    entries: DashMap<String, Arc<TaskEntry>>,
    pending_titles: DashMap<String, String>,
    active_unique_keys: DashMap<String, String>,
    paused_tasks: DashMap<String, PausedEntry>,
    rate_limited_providers: DashMap<String, DateTime<Utc>>,
    current_task: DashMap<QueueType, String>,
    submission_lock: Mutex<()>,
    shutdown: CancellationToken,
}

impl TaskManager {
    /// Builds the manager and spawns its three workers plus the
    /// paused-task monitor.
    #[must_use]
    pub fn spawn(store: Store, rate_limiter: Arc<dyn RateLimiter>) -> Arc<Self> {
        let mut queues = std::collections::HashMap::new();
        for queue_type in QueueType::all() {
            queues.insert(queue_type, Arc::new(QueueState::new()));
        }

        let manager = Arc::new(Self {
            store,
            rate_limiter,
            queues,
            entries: DashMap::new(),
            pending_titles: DashMap::new(),
            active_unique_keys: DashMap::new(),
            paused_tasks: DashMap::new(),
            rate_limited_providers: DashMap::new(),
            current_task: DashMap::new(),
            submission_lock: Mutex::new(()),
            shutdown: CancellationToken::new(),
        });

        for queue_type in QueueType::all() {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.worker_loop(queue_type).await });
        }

        let monitor = Arc::clone(&manager);
        tokio::spawn(async move { monitor.paused_monitor_loop().await });

        manager
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Submit contract (spec §4.5): precise dedup on `unique_key`, coarse
    /// dedup on `title`. Persists a `pending` history row, then either
    /// spawns immediately or enqueues.
    pub async fn submit(self: &Arc<Self>, task: NewTask) -> Result<(String, oneshot::Receiver<()>), SubmitError> {
        let _guard = self.submission_lock.lock().await;

        if let Some(key) = &task.unique_key
            && self.active_unique_keys.contains_key(key)
        {
            return Err(SubmitError::Conflict);
        }
        if self.pending_titles.contains_key(&task.title) {
            return Err(SubmitError::Conflict);
        }

        let task_id = Uuid::new_v4().to_string();
        self.store
            .insert_task(
                &task_id,
                &task.title,
                task.queue_type,
                task.unique_key.as_deref(),
                task.task_type.map(TaskType::as_str),
                task.task_parameters.as_deref(),
            )
            .await?;

        let (done_tx, done_rx) = oneshot::channel();
        let entry = Arc::new(TaskEntry {
            title: task.title.clone(),
            queue_type: task.queue_type,
            unique_key: task.unique_key.clone(),
            task_type: task.task_type,
            task_parameters: task.task_parameters.clone(),
            provider: task.provider,
            factory: Mutex::new(Some(task.factory)),
            pause_notify: Arc::new(Notify::new()),
            paused: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
            done_tx: Mutex::new(Some(done_tx)),
            running_handle: Mutex::new(None),
        });

        self.pending_titles.insert(task.title.clone(), task_id.clone());
        if let Some(key) = &task.unique_key {
            self.active_unique_keys.insert(key.clone(), task_id.clone());
        }
        self.entries.insert(task_id.clone(), Arc::clone(&entry));

        if task.run_immediately {
            drop(_guard);
            let manager = Arc::clone(self);
            let task_id = task_id.clone();
            tokio::spawn(async move { manager.run_task_wrapper(task_id).await });
        } else {
            let queue = &self.queues[&task.queue_type];
            queue.items.lock().await.push_back(task_id.clone());
            queue.notify.notify_one();
        }

        Ok((task_id, done_rx))
    }

    async fn worker_loop(self: Arc<Self>, queue_type: QueueType) {
        loop {
            if self.shutdown.is_cancelled() {
                return;
            }

            let queue = Arc::clone(&self.queues[&queue_type]);
            let task_id = loop {
                if let Some(id) = queue.items.lock().await.pop_front() {
                    break id;
                }
                tokio::select! {
                    () = queue.notify.notified() => {},
                    () = self.shutdown.cancelled() => return,
                    () = tokio::time::sleep(PAUSED_TASK_SCAN_INTERVAL) => {},
                }
            };

            let Some(entry) = self.entries.get(&task_id).map(|e| Arc::clone(&e)) else { continue };

            if let Some(provider) = &entry.provider
                && let Some(expiry) = self.rate_limited_providers.get(provider).map(|e| *e)
            {
                if Utc::now() < expiry {
                    let wait_secs = (expiry - Utc::now()).num_seconds().max(0);
                    info!(task_id, provider, wait_secs, "provider still rate-limited, pausing task before run");
                    self.paused_tasks.insert(task_id.clone(), PausedEntry { queue_type, resume_at: expiry });
                    let _ = self
                        .store
                        .set_task_status(
                            &task_id,
                            TaskStatus::Paused,
                            None,
                            Some(&format!("提供方限流中，{wait_secs} 秒后重试")),
                        )
                        .await;
                    continue;
                }
                self.rate_limited_providers.remove(provider);
            }

            if queue_type == QueueType::Download {
                self.wait_for_global_limit().await;
            }

            Arc::clone(&self).run_task_wrapper(task_id).await;
        }
    }

    async fn wait_for_global_limit(&self) {
        loop {
            match self.rate_limiter.get_global_limit_status().await {
                Ok((true, wait_secs)) => {
                    warn!(wait_secs, "global rate limit reached, download worker napping");
                    tokio::select! {
                        () = tokio::time::sleep(std::time::Duration::from_secs(wait_secs.max(1))) => {},
                        () = self.shutdown.cancelled() => return,
                    }
                }
                _ => return,
            }
        }
    }

    async fn run_task_wrapper(self: Arc<Self>, task_id: String) {
        let Some(entry) = self.entries.get(&task_id).map(|e| Arc::clone(&e)) else { return };

        self.pending_titles.remove(&entry.title);
        self.current_task.insert(entry.queue_type, task_id.clone());
        let _ = self.store.set_task_status(&task_id, TaskStatus::Running, Some(0), Some("任务开始")).await;

        let Some(factory) = entry.factory.lock().await.take() else {
            warn!(task_id, "task factory already consumed, dropping duplicate run");
            return;
        };

        let progress = ProgressReporter::new(task_id.clone(), self.store.clone(), Arc::clone(&entry.pause_notify), Arc::clone(&entry.paused));
        let cancel = entry.cancel.clone();
        let handle = tokio::spawn(factory(progress, cancel));
        *entry.running_handle.lock().await = Some(handle.abort_handle());

        let outcome = handle.await;

        match outcome {
            Ok(crate::models::TaskOutcome::Done { message }) => {
                let _ = self.store.set_task_status(&task_id, TaskStatus::Completed, Some(100), Some(&message)).await;
                self.finish(&task_id, &entry).await;
            }
            Ok(crate::models::TaskOutcome::PauseFor { retry_after_secs, message, provider }) => {
                let resume_at = Utc::now() + chrono::Duration::seconds(retry_after_secs as i64);
                self.rate_limited_providers.insert(provider, resume_at);
                self.paused_tasks.insert(task_id.clone(), PausedEntry { queue_type: entry.queue_type, resume_at });
                let _ = self.store.set_task_status(&task_id, TaskStatus::Paused, None, Some(&message)).await;
                // Not terminal: unique_key/title stay reserved, done_event unset.
            }
            Ok(crate::models::TaskOutcome::Err(e)) => {
                let description = last_line(&e.to_string());
                let _ = self.store.set_task_status(&task_id, TaskStatus::Failed, None, Some(&description)).await;
                self.finish(&task_id, &entry).await;
            }
            Err(join_err) => {
                let description = if join_err.is_cancelled() { "任务已被用户取消".to_string() } else { last_line(&join_err.to_string()) };
                let _ = self.store.set_task_status(&task_id, TaskStatus::Failed, None, Some(&description)).await;
                self.finish(&task_id, &entry).await;
            }
        }

        if self.current_task.get(&entry.queue_type).is_some_and(|v| *v == task_id) {
            self.current_task.remove(&entry.queue_type);
        }
    }

    /// Releases `unique_key`/title reservations and signals `done_event`
    /// for a terminal outcome (Completed/Failed/Cancelled).
    async fn finish(&self, task_id: &str, entry: &TaskEntry) {
        if let Some(key) = &entry.unique_key {
            self.active_unique_keys.remove(key);
        }
        if let Some(tx) = entry.done_tx.lock().await.take() {
            let _ = tx.send(());
        }
        self.entries.remove(task_id);
    }

    async fn paused_monitor_loop(self: Arc<Self>) {
        loop {
            tokio::select! {
                () = tokio::time::sleep(PAUSED_TASK_SCAN_INTERVAL) => {},
                () = self.shutdown.cancelled() => return,
            }

            let now = Utc::now();
            let due: Vec<String> = self
                .paused_tasks
                .iter()
                .filter(|e| e.value().resume_at <= now)
                .map(|e| e.key().clone())
                .collect();

            for task_id in due {
                let Some((_, paused)) = self.paused_tasks.remove(&task_id) else { continue };
                let queue = &self.queues[&paused.queue_type];
                queue.items.lock().await.push_back(task_id.clone());
                queue.notify.notify_one();
                let _ = self.store.set_task_status(&task_id, TaskStatus::Pending, None, Some("限流冷却结束，重新排队")).await;
                info!(task_id, "paused task resumed and re-enqueued");
            }

            self.rate_limited_providers.retain(|_, expiry| *expiry > now);
        }
    }

    // ---- control surface (pause / resume / abort / cancel) -----------------

    pub async fn pause_task(&self, task_id: &str) -> bool {
        let Some(entry) = self.entries.get(task_id).map(|e| Arc::clone(&e)) else { return false };
        if !self.current_task.iter().any(|e| *e.value() == task_id) {
            return false;
        }
        entry.paused.store(true, Ordering::SeqCst);
        let _ = self.store.set_task_status(task_id, TaskStatus::Paused, None, None).await;
        true
    }

    pub async fn resume_task(&self, task_id: &str) -> bool {
        let Some(entry) = self.entries.get(task_id).map(|e| Arc::clone(&e)) else { return false };
        entry.paused.store(false, Ordering::SeqCst);
        entry.pause_notify.notify_waiters();
        let _ = self.store.set_task_status(task_id, TaskStatus::Running, None, None).await;
        true
    }

    /// Cancels the currently-running task with this id, across whichever
    /// queue it's running on.
    pub async fn abort_current_task(&self, task_id: &str) -> bool {
        let Some(entry) = self.entries.get(task_id).map(|e| Arc::clone(&e)) else { return false };
        let is_current = self.current_task.iter().any(|e| *e.value() == task_id);
        if !is_current {
            return false;
        }
        entry.paused.store(false, Ordering::SeqCst);
        entry.pause_notify.notify_waiters();
        entry.cancel.cancel();
        if let Some(handle) = entry.running_handle.lock().await.take() {
            handle.abort();
        }
        true
    }

    /// Drains a not-yet-started task out of its queue and marks it
    /// cancelled, releasing its reservations immediately.
    pub async fn cancel_pending_task(&self, task_id: &str) -> bool {
        let Some(entry) = self.entries.get(task_id).map(|e| Arc::clone(&e)) else { return false };

        let queue = &self.queues[&entry.queue_type];
        let mut items = queue.items.lock().await;
        let Some(pos) = items.iter().position(|id| id == task_id) else {
            drop(items);
            // Not pending in a queue; if it's running, abort + forcibly drop the row.
            if self.abort_current_task(task_id).await {
                let _ = self.store.delete_task(task_id).await;
                self.pending_titles.remove(&entry.title);
                self.finish(task_id, &entry).await;
                return true;
            }
            return false;
        };
        items.remove(pos);
        drop(items);

        self.pending_titles.remove(&entry.title);
        let _ = self.store.set_task_status(task_id, TaskStatus::Failed, None, Some("任务已被用户取消")).await;
        self.finish(task_id, &entry).await;
        true
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }
}

fn last_line(s: &str) -> String {
    s.lines().next_back().unwrap_or(s).to_string()
}
