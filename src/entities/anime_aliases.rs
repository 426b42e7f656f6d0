use sea_orm::entity::prelude::*;

/// 1:1 sidecar on Anime carrying alternate titles, fed by the metadata
/// layer and (optionally) an AI alias-validation step.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "anime_aliases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub anime_id: i32,
    pub name_en: Option<String>,
    pub name_jp: Option<String>,
    pub name_romaji: Option<String>,
    pub alias_cn_1: Option<String>,
    pub alias_cn_2: Option<String>,
    pub alias_cn_3: Option<String>,
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
