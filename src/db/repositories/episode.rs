use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;

use crate::entities::episode;
use crate::util::ids;
use crate::util::time::now_rfc3339;

pub struct EpisodeRepository {
    conn: DatabaseConnection,
}

#[derive(Debug, Clone, Serialize)]
pub struct EpisodeRow {
    pub id: i64,
    pub source_id: i32,
    pub episode_index: i32,
    pub title: Option<String>,
    pub provider_episode_id: String,
    pub source_url: Option<String>,
    pub danmaku_file_path: Option<String>,
    pub comment_count: i32,
}

impl From<episode::Model> for EpisodeRow {
    fn from(m: episode::Model) -> Self {
        Self {
            id: m.id,
            source_id: m.source_id,
            episode_index: m.episode_index,
            title: m.title,
            provider_episode_id: m.provider_episode_id,
            source_url: m.source_url,
            danmaku_file_path: m.danmaku_file_path,
            comment_count: m.comment_count,
        }
    }
}

impl EpisodeRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// `(source_id, episode_index)` is unique (spec §3); looks the row up
    /// first so repeated imports of the same episode are idempotent on id.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert(
        &self,
        source_id: i32,
        anime_id: i32,
        source_order: i32,
        episode_index: i32,
        title: Option<&str>,
        provider_episode_id: &str,
        source_url: Option<&str>,
    ) -> anyhow::Result<EpisodeRow> {
        if let Some(existing) = episode::Entity::find()
            .filter(episode::Column::SourceId.eq(source_id))
            .filter(episode::Column::EpisodeIndex.eq(episode_index))
            .one(&self.conn)
            .await?
        {
            return Ok(existing.into());
        }

        let id = ids::episode_id(anime_id, source_order, episode_index);
        let now = now_rfc3339();
        let model = episode::ActiveModel {
            id: Set(id),
            source_id: Set(source_id),
            episode_index: Set(episode_index),
            title: Set(title.map(str::to_string)),
            provider_episode_id: Set(provider_episode_id.to_string()),
            source_url: Set(source_url.map(str::to_string)),
            danmaku_file_path: Set(None),
            comment_count: Set(0),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };
        let inserted = model.insert(&self.conn).await?;
        Ok(inserted.into())
    }

    pub async fn get(&self, id: i64) -> anyhow::Result<Option<EpisodeRow>> {
        Ok(episode::Entity::find_by_id(id).one(&self.conn).await?.map(Into::into))
    }

    pub async fn for_source(&self, source_id: i32) -> anyhow::Result<Vec<EpisodeRow>> {
        let rows = episode::Entity::find()
            .filter(episode::Column::SourceId.eq(source_id))
            .order_by_asc(episode::Column::EpisodeIndex)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn update_artifact(&self, id: i64, path: &str, comment_count: i32) -> anyhow::Result<()> {
        let Some(row) = episode::Entity::find_by_id(id).one(&self.conn).await? else {
            anyhow::bail!("episode {id} not found");
        };
        let mut active: episode::ActiveModel = row.into();
        active.danmaku_file_path = Set(Some(path.to_string()));
        active.comment_count = Set(comment_count);
        active.updated_at = Set(now_rfc3339());
        active.update(&self.conn).await?;
        Ok(())
    }

    /// Deletes the row, returning its artifact path (if any) for the
    /// caller to remove from disk and sweep empty directories.
    pub async fn delete_cascade(&self, id: i64) -> anyhow::Result<Option<String>> {
        let Some(row) = episode::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };
        let path = row.danmaku_file_path.clone();
        episode::Entity::delete_by_id(id).exec(&self.conn).await?;
        Ok(path)
    }

    pub async fn collect_paths_for_source(&self, source_id: i32) -> anyhow::Result<Vec<String>> {
        let rows = self.for_source(source_id).await?;
        Ok(rows.into_iter().filter_map(|r| r.danmaku_file_path).collect())
    }
}
