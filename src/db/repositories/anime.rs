use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;

use crate::entities::{anime, anime_source};
use crate::models::MediaType;
use crate::util::time::now_rfc3339;

use super::episode::EpisodeRepository;

pub struct AnimeRepository {
    conn: DatabaseConnection,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnimeRow {
    pub id: i32,
    pub title: String,
    pub anime_type: String,
    pub season: i32,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceRow {
    pub id: i32,
    pub anime_id: i32,
    pub provider_name: String,
    pub media_id: String,
    pub source_order: i32,
    pub is_favorited: bool,
    pub incremental_refresh_failures: i32,
}

fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

impl AnimeRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// A work is uniquely identified by `(normalized_title, season, year)`
    /// after alias-normalization (spec §3). Returns `(anime_id, created)`.
    pub async fn get_or_create(
        &self,
        title: &str,
        anime_type: MediaType,
        season: i32,
        year: Option<i32>,
    ) -> anyhow::Result<(i32, bool)> {
        let normalized = normalize_title(title);
        let existing = anime::Entity::find()
            .filter(anime::Column::Season.eq(season))
            .all(&self.conn)
            .await?
            .into_iter()
            .find(|row| normalize_title(&row.title) == normalized && row.year == year);

        if let Some(row) = existing {
            return Ok((row.id, false));
        }

        let model = anime::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            title: Set(title.to_string()),
            anime_type: Set(anime_type.as_str().to_string()),
            season: Set(season),
            year: Set(year),
            image_url: Set(None),
            local_image_path: Set(None),
            created_at: Set(now_rfc3339()),
        };
        let inserted = model.insert(&self.conn).await?;
        Ok((inserted.id, true))
    }

    /// Lookup-only counterpart to [`Self::get_or_create`]; never inserts.
    pub async fn find(&self, title: &str, season: i32, year: Option<i32>) -> anyhow::Result<Option<AnimeRow>> {
        let normalized = normalize_title(title);
        let row = anime::Entity::find()
            .filter(anime::Column::Season.eq(season))
            .all(&self.conn)
            .await?
            .into_iter()
            .find(|row| normalize_title(&row.title) == normalized && row.year == year);
        Ok(row.map(|m| AnimeRow { id: m.id, title: m.title, anime_type: m.anime_type, season: m.season, year: m.year }))
    }

    /// The anime's single favorited source, if one has been designated
    /// (spec §3 invariant: at most one per anime).
    pub async fn get_favorited_source(&self, anime_id: i32) -> anyhow::Result<Option<SourceRow>> {
        let row = anime_source::Entity::find()
            .filter(anime_source::Column::AnimeId.eq(anime_id))
            .filter(anime_source::Column::IsFavorited.eq(true))
            .one(&self.conn)
            .await?;
        Ok(row.map(|r| SourceRow {
            id: r.id,
            anime_id: r.anime_id,
            provider_name: r.provider_name,
            media_id: r.media_id,
            source_order: r.source_order,
            is_favorited: r.is_favorited,
            incremental_refresh_failures: r.incremental_refresh_failures,
        }))
    }

    pub async fn get(&self, id: i32) -> anyhow::Result<Option<AnimeRow>> {
        Ok(anime::Entity::find_by_id(id).one(&self.conn).await?.map(|m| AnimeRow {
            id: m.id,
            title: m.title,
            anime_type: m.anime_type,
            season: m.season,
            year: m.year,
        }))
    }

    /// Cascades to sources and episodes; the database's `ON DELETE CASCADE`
    /// removes the rows, but artifact files on disk are not DB-managed, so
    /// the repository collects every episode's file path for the caller
    /// (the delete task) to remove from the artifact store.
    pub async fn delete_cascade(&self, id: i32, episodes: &EpisodeRepository) -> anyhow::Result<Vec<String>> {
        let sources = anime_source::Entity::find()
            .filter(anime_source::Column::AnimeId.eq(id))
            .all(&self.conn)
            .await?;

        let mut paths = Vec::new();
        for source in &sources {
            paths.extend(episodes.collect_paths_for_source(source.id).await?);
        }

        anime::Entity::delete_by_id(id).exec(&self.conn).await?;
        Ok(paths)
    }

    pub async fn get_or_create_source(
        &self,
        anime_id: i32,
        provider: &str,
        media_id: &str,
    ) -> anyhow::Result<(i32, i32, bool)> {
        if let Some(existing) = anime_source::Entity::find()
            .filter(anime_source::Column::ProviderName.eq(provider))
            .filter(anime_source::Column::MediaId.eq(media_id))
            .one(&self.conn)
            .await?
        {
            return Ok((existing.id, existing.source_order, false));
        }

        let siblings = anime_source::Entity::find()
            .filter(anime_source::Column::AnimeId.eq(anime_id))
            .order_by_desc(anime_source::Column::SourceOrder)
            .all(&self.conn)
            .await?;
        let next_order = siblings.first().map_or(1, |s| s.source_order + 1);

        let model = anime_source::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            anime_id: Set(anime_id),
            provider_name: Set(provider.to_string()),
            media_id: Set(media_id.to_string()),
            source_order: Set(next_order),
            is_favorited: Set(false),
            incremental_refresh_failures: Set(0),
            created_at: Set(now_rfc3339()),
        };
        let inserted = model.insert(&self.conn).await?;
        Ok((inserted.id, next_order, true))
    }

    /// At most one favorited source per anime; marking a second clears the
    /// prior one (spec §3 invariant).
    pub async fn set_favorited(&self, anime_id: i32, source_id: i32) -> anyhow::Result<()> {
        let siblings = anime_source::Entity::find()
            .filter(anime_source::Column::AnimeId.eq(anime_id))
            .all(&self.conn)
            .await?;

        for sibling in siblings {
            let should_favorite = sibling.id == source_id;
            if sibling.is_favorited != should_favorite {
                let mut active: anime_source::ActiveModel = sibling.into();
                active.is_favorited = Set(should_favorite);
                active.update(&self.conn).await?;
            }
        }
        Ok(())
    }

    /// Deletes one source and its episodes; if the owning anime has no
    /// sources left, deletes the anime too (spec §4.6). Returns the
    /// collected artifact paths and whether the anime was also removed.
    pub async fn delete_source_cascade(
        &self,
        source_id: i32,
        episodes: &EpisodeRepository,
    ) -> anyhow::Result<(Vec<String>, bool)> {
        let Some(source) = anime_source::Entity::find_by_id(source_id).one(&self.conn).await? else {
            return Ok((Vec::new(), false));
        };

        let paths = episodes.collect_paths_for_source(source_id).await?;
        anime_source::Entity::delete_by_id(source_id).exec(&self.conn).await?;

        let remaining = anime_source::Entity::find()
            .filter(anime_source::Column::AnimeId.eq(source.anime_id))
            .all(&self.conn)
            .await?;

        let anime_also_deleted = if remaining.is_empty() {
            anime::Entity::delete_by_id(source.anime_id).exec(&self.conn).await?;
            true
        } else {
            false
        };

        Ok((paths, anime_also_deleted))
    }

    pub async fn record_incremental_failure(&self, source_id: i32) -> anyhow::Result<i32> {
        let Some(source) = anime_source::Entity::find_by_id(source_id).one(&self.conn).await? else {
            anyhow::bail!("source {source_id} not found");
        };
        let new_count = source.incremental_refresh_failures + 1;
        let mut active: anime_source::ActiveModel = source.into();
        active.incremental_refresh_failures = Set(new_count);
        active.update(&self.conn).await?;
        Ok(new_count)
    }

    /// Clears the failure streak after a successful refresh, so a
    /// source's `incremental_refresh_failures` reflects a *consecutive*
    /// run of failures rather than a lifetime total.
    pub async fn reset_incremental_failure(&self, source_id: i32) -> anyhow::Result<()> {
        let Some(source) = anime_source::Entity::find_by_id(source_id).one(&self.conn).await? else {
            anyhow::bail!("source {source_id} not found");
        };
        if source.incremental_refresh_failures != 0 {
            let mut active: anime_source::ActiveModel = source.into();
            active.incremental_refresh_failures = Set(0);
            active.update(&self.conn).await?;
        }
        Ok(())
    }

    /// Looks up an already-imported source by its provider identity, for
    /// the search pipeline's favorited-source override (spec §4.4 stage 9).
    pub async fn find_source_by_provider_media(
        &self,
        provider: &str,
        media_id: &str,
    ) -> anyhow::Result<Option<(SourceRow, AnimeRow)>> {
        let Some(source) = anime_source::Entity::find()
            .filter(anime_source::Column::ProviderName.eq(provider))
            .filter(anime_source::Column::MediaId.eq(media_id))
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };
        let Some(anime_model) = anime::Entity::find_by_id(source.anime_id).one(&self.conn).await? else {
            return Ok(None);
        };

        Ok(Some((
            SourceRow {
                id: source.id,
                anime_id: source.anime_id,
                provider_name: source.provider_name,
                media_id: source.media_id,
                source_order: source.source_order,
                is_favorited: source.is_favorited,
                incremental_refresh_failures: source.incremental_refresh_failures,
            },
            AnimeRow {
                id: anime_model.id,
                title: anime_model.title,
                anime_type: anime_model.anime_type,
                season: anime_model.season,
                year: anime_model.year,
            },
        )))
    }

    /// Looks up a source by its own id along with its owning anime, for
    /// task bodies that only persist a bare `source_id` (refresh, delete).
    pub async fn get_source_with_anime(&self, source_id: i32) -> anyhow::Result<Option<(SourceRow, AnimeRow)>> {
        let Some(source) = anime_source::Entity::find_by_id(source_id).one(&self.conn).await? else {
            return Ok(None);
        };
        let Some(anime_model) = anime::Entity::find_by_id(source.anime_id).one(&self.conn).await? else {
            return Ok(None);
        };
        Ok(Some((
            SourceRow {
                id: source.id,
                anime_id: source.anime_id,
                provider_name: source.provider_name,
                media_id: source.media_id,
                source_order: source.source_order,
                is_favorited: source.is_favorited,
                incremental_refresh_failures: source.incremental_refresh_failures,
            },
            AnimeRow { id: anime_model.id, title: anime_model.title, anime_type: anime_model.anime_type, season: anime_model.season, year: anime_model.year },
        )))
    }

    pub async fn sources_below_failure_threshold(&self, threshold: i32) -> anyhow::Result<Vec<SourceRow>> {
        let rows = anime_source::Entity::find()
            .filter(anime_source::Column::IncrementalRefreshFailures.lt(threshold))
            .all(&self.conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| SourceRow {
                id: r.id,
                anime_id: r.anime_id,
                provider_name: r.provider_name,
                media_id: r.media_id,
                source_order: r.source_order,
                is_favorited: r.is_favorited,
                incremental_refresh_failures: r.incremental_refresh_failures,
            })
            .collect())
    }
}
