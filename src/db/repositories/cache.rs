use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use crate::entities::cache_entry;
use crate::util::time::seconds_since;

pub struct CacheRepository {
    conn: sea_orm::DatabaseConnection,
}

impl CacheRepository {
    pub fn new(conn: sea_orm::DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let Some(row) = cache_entry::Entity::find_by_id(key.to_string()).one(&self.conn).await? else {
            return Ok(None);
        };
        if seconds_since(&row.expires_at).is_ok_and(|s| s >= 0) {
            cache_entry::Entity::delete_by_id(key.to_string()).exec(&self.conn).await?;
            return Ok(None);
        }
        Ok(Some(row.value))
    }

    pub async fn set(&self, key: &str, value: &str, ttl_secs: i64) -> anyhow::Result<()> {
        let expires_at = chrono::Utc::now() + chrono::Duration::seconds(ttl_secs);
        let exists = cache_entry::Entity::find_by_id(key.to_string()).one(&self.conn).await?.is_some();
        let active = cache_entry::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            expires_at: Set(expires_at.to_rfc3339()),
        };
        if exists {
            active.update(&self.conn).await?;
        } else {
            active.insert(&self.conn).await?;
        }
        Ok(())
    }
}
