use sea_orm::entity::prelude::*;

/// A submitted background job, persisted for crash-recovery and history
/// listing. `task_parameters` is opaque JSON carrying the inputs needed
/// to replay a recoverable task on restart.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "task_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub task_id: String,
    pub title: String,
    /// One of `pending`, `running`, `completed`, `failed`, `paused`.
    pub status: String,
    pub progress: i32,
    pub description: Option<String>,
    /// One of `download`, `management`, `fallback`.
    pub queue_type: String,
    pub unique_key: Option<String>,
    pub task_type: Option<String>,
    pub task_parameters: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub finished_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
