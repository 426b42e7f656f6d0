use sea_orm::entity::prelude::*;

/// One row per counted key (`__global__`, `__fallback_match__`,
/// `__fallback_search__`, or a provider name). `checksum` detects and
/// recovers from manual tampering or partially-written rows.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "rate_limit_state")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub request_count: i32,
    pub last_reset_time: String,
    pub checksum: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
