use sea_orm::entity::prelude::*;

/// Maps `(tmdb_tv_id, tmdb_episode_group_id, custom_season, custom_episode)`
/// to `(tmdb_season, tmdb_episode, absolute_episode)`, reconciling provider
/// numbering against canonical season/episode ordering.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tmdb_episode_mapping")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tmdb_tv_id: i32,
    pub tmdb_episode_group_id: Option<String>,
    pub custom_season: i32,
    pub custom_episode: i32,
    pub tmdb_season: i32,
    pub tmdb_episode: i32,
    pub absolute_episode: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
