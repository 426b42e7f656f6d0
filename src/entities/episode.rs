use sea_orm::entity::prelude::*;

/// One episode of one source. `id` is the synthesized episode-id
/// (`util::ids::episode_id`), never auto-assigned by the database.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "episode")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub source_id: i32,
    /// 1-based, monotone per source.
    pub episode_index: i32,
    pub title: Option<String>,
    pub provider_episode_id: String,
    pub source_url: Option<String>,
    pub danmaku_file_path: Option<String>,
    pub comment_count: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::anime_source::Entity",
        from = "Column::SourceId",
        to = "super::anime_source::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    AnimeSource,
}

impl Related<super::anime_source::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AnimeSource.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
