use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use crate::entities::{anime_aliases, anime_metadata};
use crate::models::{AliasSet, MetadataFill};

pub struct MetadataRepository {
    conn: sea_orm::DatabaseConnection,
}

impl MetadataRepository {
    pub fn new(conn: sea_orm::DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Fill-if-empty discipline (spec §3): existing non-null values are
    /// never overwritten by auto-discovery.
    pub async fn fill_if_empty(&self, anime_id: i32, fill: MetadataFill) -> anyhow::Result<()> {
        let existing = anime_metadata::Entity::find_by_id(anime_id).one(&self.conn).await?;

        let is_new = existing.is_none();
        let base = existing.unwrap_or(anime_metadata::Model {
            anime_id,
            tmdb_id: None,
            tmdb_episode_group_id: None,
            imdb_id: None,
            tvdb_id: None,
            douban_id: None,
            bangumi_id: None,
        });

        let active = anime_metadata::ActiveModel {
            anime_id: Set(anime_id),
            tmdb_id: Set(base.tmdb_id.or(fill.tmdb_id)),
            tmdb_episode_group_id: Set(base.tmdb_episode_group_id.or(fill.tmdb_episode_group_id)),
            imdb_id: Set(base.imdb_id.or(fill.imdb_id)),
            tvdb_id: Set(base.tvdb_id.or(fill.tvdb_id)),
            douban_id: Set(base.douban_id.or(fill.douban_id)),
            bangumi_id: Set(base.bangumi_id.or(fill.bangumi_id)),
        };

        if is_new {
            active.insert(&self.conn).await?;
        } else {
            active.update(&self.conn).await?;
        }
        Ok(())
    }

    pub async fn upsert_aliases(&self, anime_id: i32, aliases: AliasSet) -> anyhow::Result<()> {
        let existing = anime_aliases::Entity::find_by_id(anime_id).one(&self.conn).await?;
        let is_new = existing.is_none();

        let active = anime_aliases::ActiveModel {
            anime_id: Set(anime_id),
            name_en: Set(aliases.name_en),
            name_jp: Set(aliases.name_jp),
            name_romaji: Set(aliases.name_romaji),
            alias_cn_1: Set(aliases.alias_cn_1),
            alias_cn_2: Set(aliases.alias_cn_2),
            alias_cn_3: Set(aliases.alias_cn_3),
        };

        if is_new {
            active.insert(&self.conn).await?;
        } else {
            active.update(&self.conn).await?;
        }
        Ok(())
    }

    pub async fn get_aliases(&self, anime_id: i32) -> anyhow::Result<AliasSet> {
        let row = anime_aliases::Entity::find_by_id(anime_id).one(&self.conn).await?;
        Ok(row.map_or_else(AliasSet::default, |r| AliasSet {
            name_en: r.name_en,
            name_jp: r.name_jp,
            name_romaji: r.name_romaji,
            alias_cn_1: r.alias_cn_1,
            alias_cn_2: r.alias_cn_2,
            alias_cn_3: r.alias_cn_3,
        }))
    }
}
