use std::hash::{Hash, Hasher};

use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use crate::entities::rate_limit_state;
use crate::util::time::now_rfc3339;

/// A cheap tamper/corruption detector for `(request_count, last_reset_time)`.
/// Not cryptographic — it only needs to notice a hand-edited or
/// partially-written row, per spec §4.2.
fn checksum(request_count: i32, last_reset_time: &str) -> String {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    request_count.hash(&mut hasher);
    last_reset_time.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

pub struct RateLimitRepository {
    conn: sea_orm::DatabaseConnection,
}

impl RateLimitRepository {
    pub fn new(conn: sea_orm::DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Returns `(request_count, last_reset_time, checksum)`, initializing
    /// the row on first read. If the stored checksum does not match the
    /// stored `(request_count, last_reset_time)`, the row is treated as
    /// tampered/partially-written and reset to zero (spec §4.2 recovery
    /// strategy).
    pub async fn read_or_init(&self, key: &str) -> anyhow::Result<(i32, String, String)> {
        let existing = rate_limit_state::Entity::find_by_id(key.to_string()).one(&self.conn).await?;

        match existing {
            Some(row) => {
                let expected = checksum(row.request_count, &row.last_reset_time);
                if expected != row.checksum {
                    self.write(key, 0, &now_rfc3339()).await?;
                    let now = now_rfc3339();
                    Ok((0, now.clone(), checksum(0, &now)))
                } else {
                    Ok((row.request_count, row.last_reset_time, row.checksum))
                }
            }
            None => {
                let now = now_rfc3339();
                self.write(key, 0, &now).await?;
                Ok((0, now.clone(), checksum(0, &now)))
            }
        }
    }

    pub async fn increment(&self, key: &str) -> anyhow::Result<i32> {
        let (count, reset_time, _) = self.read_or_init(key).await?;
        let new_count = count + 1;
        self.write(key, new_count, &reset_time).await?;
        Ok(new_count)
    }

    pub async fn reset(&self, key: &str) -> anyhow::Result<()> {
        self.write(key, 0, &now_rfc3339()).await
    }

    async fn write(&self, key: &str, request_count: i32, last_reset_time: &str) -> anyhow::Result<()> {
        let exists = rate_limit_state::Entity::find_by_id(key.to_string()).one(&self.conn).await?.is_some();
        let active = rate_limit_state::ActiveModel {
            key: Set(key.to_string()),
            request_count: Set(request_count),
            last_reset_time: Set(last_reset_time.to_string()),
            checksum: Set(checksum(request_count, last_reset_time)),
        };
        if exists {
            active.update(&self.conn).await?;
        } else {
            active.insert(&self.conn).await?;
        }
        Ok(())
    }
}
