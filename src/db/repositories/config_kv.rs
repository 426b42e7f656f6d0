use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use crate::entities::config_kv;

pub struct ConfigKvRepository {
    conn: sea_orm::DatabaseConnection,
}

impl ConfigKvRepository {
    pub fn new(conn: sea_orm::DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(config_kv::Entity::find_by_id(key.to_string()).one(&self.conn).await?.map(|r| r.value))
    }

    pub async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let exists = config_kv::Entity::find_by_id(key.to_string()).one(&self.conn).await?.is_some();
        let active = config_kv::ActiveModel { key: Set(key.to_string()), value: Set(value.to_string()) };
        if exists {
            active.update(&self.conn).await?;
        } else {
            active.insert(&self.conn).await?;
        }
        Ok(())
    }

    pub async fn all(&self) -> anyhow::Result<Vec<(String, String)>> {
        let rows = config_kv::Entity::find().all(&self.conn).await?;
        Ok(rows.into_iter().map(|r| (r.key, r.value)).collect())
    }
}
