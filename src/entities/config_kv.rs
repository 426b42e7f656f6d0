use sea_orm::entity::prelude::*;

/// The dynamic, CLI/API-visible config store (distinct from the static
/// TOML file config in `crate::config`). Values are stored as strings;
/// `services::config_store` owns the typed conversions.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "config_kv")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
