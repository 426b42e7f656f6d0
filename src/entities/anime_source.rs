use sea_orm::entity::prelude::*;

/// A binding of one anime to one provider. `(provider_name, media_id)` is
/// globally unique; enforced by the repository layer (see
/// `db::repositories::anime_source`).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "anime_source")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub anime_id: i32,
    pub provider_name: String,
    pub media_id: String,
    /// Monotonic per anime, assigned on creation.
    pub source_order: i32,
    pub is_favorited: bool,
    pub incremental_refresh_failures: i32,
    pub created_at: String,
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
    #[sea_orm(has_many = "super::episode::Entity")]
    Episode,
}

impl Related<super::anime::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Anime.def()
    }
}

impl Related<super::episode::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Episode.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
