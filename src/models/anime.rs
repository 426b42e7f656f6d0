//! Plain DTOs for the anime/source/episode graph, mirroring the teacher's
//! `models::anime`/`models::episode` split between entity rows and the
//! shapes services actually pass around.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    TvSeries,
    Movie,
    Ova,
    Other,
}

impl MediaType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TvSeries => "tv_series",
            Self::Movie => "movie",
            Self::Ova => "ova",
            Self::Other => "other",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "movie" => Self::Movie,
            "ova" => Self::Ova,
            "tv_series" => Self::TvSeries,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAnime {
    pub title: String,
    pub anime_type: MediaType,
    pub season: i32,
    pub year: Option<i32>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataFill {
    pub tmdb_id: Option<i32>,
    pub tmdb_episode_group_id: Option<String>,
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<i32>,
    pub douban_id: Option<String>,
    pub bangumi_id: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AliasSet {
    pub name_en: Option<String>,
    pub name_jp: Option<String>,
    pub name_romaji: Option<String>,
    pub alias_cn_1: Option<String>,
    pub alias_cn_2: Option<String>,
    pub alias_cn_3: Option<String>,
}

impl AliasSet {
    /// All non-empty aliases, for similarity comparisons.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        [
            self.name_en.as_deref(),
            self.name_jp.as_deref(),
            self.name_romaji.as_deref(),
            self.alias_cn_1.as_deref(),
            self.alias_cn_2.as_deref(),
            self.alias_cn_3.as_deref(),
        ]
        .into_iter()
        .flatten()
    }
}
