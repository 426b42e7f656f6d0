use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Serialize;

use crate::entities::task_history;
use crate::models::{QueueType, TaskStatus};
use crate::util::time::now_rfc3339;

pub struct TaskHistoryRepository {
    conn: sea_orm::DatabaseConnection,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskRow {
    pub task_id: String,
    pub title: String,
    pub status: String,
    pub progress: i32,
    pub description: Option<String>,
    pub queue_type: String,
    pub unique_key: Option<String>,
    pub task_type: Option<String>,
    pub task_parameters: Option<String>,
}

impl From<task_history::Model> for TaskRow {
    fn from(m: task_history::Model) -> Self {
        Self {
            task_id: m.task_id,
            title: m.title,
            status: m.status,
            progress: m.progress,
            description: m.description,
            queue_type: m.queue_type,
            unique_key: m.unique_key,
            task_type: m.task_type,
            task_parameters: m.task_parameters,
        }
    }
}

impl TaskHistoryRepository {
    pub fn new(conn: sea_orm::DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &self,
        task_id: &str,
        title: &str,
        queue_type: QueueType,
        unique_key: Option<&str>,
        task_type: Option<&str>,
        task_parameters: Option<&str>,
    ) -> anyhow::Result<()> {
        let now = now_rfc3339();
        let active = task_history::ActiveModel {
            task_id: Set(task_id.to_string()),
            title: Set(title.to_string()),
            status: Set(TaskStatus::Pending.as_str().to_string()),
            progress: Set(0),
            description: Set(None),
            queue_type: Set(queue_type.as_str().to_string()),
            unique_key: Set(unique_key.map(str::to_string)),
            task_type: Set(task_type.map(str::to_string)),
            task_parameters: Set(task_parameters.map(str::to_string)),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            finished_at: Set(None),
        };
        active.insert(&self.conn).await?;
        Ok(())
    }

    pub async fn set_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        progress: Option<i32>,
        description: Option<&str>,
    ) -> anyhow::Result<()> {
        let Some(row) = task_history::Entity::find_by_id(task_id.to_string()).one(&self.conn).await? else {
            anyhow::bail!("task {task_id} not found");
        };
        let mut active: task_history::ActiveModel = row.into();
        active.status = Set(status.as_str().to_string());
        if let Some(p) = progress {
            active.progress = Set(p);
        }
        if let Some(d) = description {
            active.description = Set(Some(d.to_string()));
        }
        active.updated_at = Set(now_rfc3339());
        if matches!(status, TaskStatus::Completed | TaskStatus::Failed) {
            active.finished_at = Set(Some(now_rfc3339()));
        }
        active.update(&self.conn).await?;
        Ok(())
    }

    pub async fn get(&self, task_id: &str) -> anyhow::Result<Option<TaskRow>> {
        Ok(task_history::Entity::find_by_id(task_id.to_string()).one(&self.conn).await?.map(Into::into))
    }

    pub async fn list(&self) -> anyhow::Result<Vec<TaskRow>> {
        let rows = task_history::Entity::find()
            .order_by_desc(task_history::Column::CreatedAt)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn delete(&self, task_id: &str) -> anyhow::Result<()> {
        task_history::Entity::delete_by_id(task_id.to_string()).exec(&self.conn).await?;
        Ok(())
    }

    pub async fn in_status(&self, status: TaskStatus) -> anyhow::Result<Vec<TaskRow>> {
        let rows = task_history::Entity::find()
            .filter(task_history::Column::Status.eq(status.as_str()))
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
