//! The scraper / metadata-source interface surface (spec §6). These types
//! are the shared vocabulary between the core and every external
//! collaborator implementing `Scraper` / `MetadataSource`.

use serde::{Deserialize, Serialize};

use super::anime::MediaType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeInfoHint {
    pub season: Option<i32>,
    pub episode: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSearchResult {
    pub provider: String,
    pub media_id: String,
    pub title: String,
    pub media_type: MediaType,
    pub season: Option<i32>,
    pub year: Option<i32>,
    pub episode_count: Option<i32>,
    pub image_url: Option<String>,
    pub current_episode_index: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEpisodeInfo {
    pub provider: String,
    pub episode_index: i32,
    pub title: Option<String>,
    pub episode_id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// `"t,mode,fontsize,color[,...]"` in whatever shape the provider emits;
    /// normalized by `services::danmaku_xml` before it is ever persisted.
    pub p: String,
    pub m: String,
    pub t: f64,
    pub cid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataDetails {
    pub id: String,
    pub title: String,
    pub media_type: Option<MediaType>,
    pub year: Option<i32>,
    pub aliases: Vec<String>,
    pub tmdb_id: Option<i32>,
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<i32>,
    pub bangumi_id: Option<i32>,
    pub douban_id: Option<String>,
}
