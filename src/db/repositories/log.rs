use sea_orm::{ActiveModelTrait, Set};

use crate::entities::{external_api_log, token_access_log};
use crate::util::time::now_rfc3339;

pub struct LogRepository {
    conn: sea_orm::DatabaseConnection,
}

impl LogRepository {
    pub fn new(conn: sea_orm::DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn log_external_call(&self, provider: &str, status: &str, latency_ms: i32) -> anyhow::Result<()> {
        let active = external_api_log::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            provider: Set(provider.to_string()),
            status: Set(status.to_string()),
            latency_ms: Set(latency_ms),
            created_at: Set(now_rfc3339()),
        };
        active.insert(&self.conn).await?;
        Ok(())
    }

    pub async fn log_token_access(&self, token_id: Option<i32>, path: &str, ip: Option<&str>) -> anyhow::Result<()> {
        let active = token_access_log::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            token_id: Set(token_id),
            path: Set(path.to_string()),
            ip: Set(ip.map(str::to_string)),
            created_at: Set(now_rfc3339()),
        };
        active.insert(&self.conn).await?;
        Ok(())
    }
}
