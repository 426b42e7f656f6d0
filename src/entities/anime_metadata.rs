use sea_orm::entity::prelude::*;

/// 1:1 sidecar on Anime. Filled by the metadata layer under a
/// fill-if-empty discipline: existing non-null values are never
/// overwritten by auto-discovery.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "anime_metadata")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub anime_id: i32,
    pub tmdb_id: Option<i32>,
    pub tmdb_episode_group_id: Option<String>,
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<i32>,
    pub douban_id: Option<String>,
    pub bangumi_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::anime::Entity",
        from = "Column::AnimeId",
        to = "super::anime::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Anime,
}

impl Related<super::anime::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Anime.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
