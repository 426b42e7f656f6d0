use sea_orm::entity::prelude::*;

/// One row per API-token use, write-only from the core's perspective.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "token_access_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub token_id: Option<i32>,
    pub path: String,
    pub ip: Option<String>,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
