use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{api_token, user, user_session};
use crate::util::time::now_rfc3339;

pub struct AuthRepository {
    conn: sea_orm::DatabaseConnection,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRow {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
}

impl AuthRepository {
    pub fn new(conn: sea_orm::DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<UserRow>> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.conn)
            .await?
            .map(|m| UserRow { id: m.id, username: m.username, password_hash: m.password_hash }))
    }

    pub async fn create_user(&self, username: &str, password_hash: &str) -> anyhow::Result<i32> {
        let active = user::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            created_at: Set(now_rfc3339()),
        };
        Ok(active.insert(&self.conn).await?.id)
    }

    pub async fn create_session(&self, user_id: i32, ttl_secs: i64) -> anyhow::Result<String> {
        let id = Uuid::new_v4().to_string();
        let expires_at = chrono::Utc::now() + chrono::Duration::seconds(ttl_secs);
        let active = user_session::ActiveModel {
            id: Set(id.clone()),
            user_id: Set(user_id),
            created_at: Set(now_rfc3339()),
            expires_at: Set(expires_at.to_rfc3339()),
        };
        active.insert(&self.conn).await?;
        Ok(id)
    }

    pub async fn create_token(&self, token_hash: &str, label: Option<&str>) -> anyhow::Result<i32> {
        let active = api_token::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            token_hash: Set(token_hash.to_string()),
            label: Set(label.map(str::to_string)),
            created_at: Set(now_rfc3339()),
            last_used_at: Set(None),
        };
        Ok(active.insert(&self.conn).await?.id)
    }

    pub async fn validate_token(&self, token_hash: &str) -> anyhow::Result<bool> {
        let Some(row) = api_token::Entity::find()
            .filter(api_token::Column::TokenHash.eq(token_hash))
            .one(&self.conn)
            .await?
        else {
            return Ok(false);
        };
        let mut active: api_token::ActiveModel = row.into();
        active.last_used_at = Set(Some(now_rfc3339()));
        active.update(&self.conn).await?;
        Ok(true)
    }
}
