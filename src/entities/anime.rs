use sea_orm::entity::prelude::*;

/// A single work (movie / TV season / OVA) as stored in the library.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "anime")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    /// One of `tv_series`, `movie`, `ova`, `other`.
    pub anime_type: String,
    pub season: i32,
    pub year: Option<i32>,
    pub image_url: Option<String>,
    pub local_image_path: Option<String>,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::anime_source::Entity")]
    AnimeSource,
    #[sea_orm(has_one = "super::anime_metadata::Entity")]
    AnimeMetadata,
    #[sea_orm(has_one = "super::anime_aliases::Entity")]
    AnimeAliases,
}

impl Related<super::anime_source::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AnimeSource.def()
    }
}

impl Related<super::anime_metadata::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AnimeMetadata.def()
    }
}

impl Related<super::anime_aliases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AnimeAliases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
