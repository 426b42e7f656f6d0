//! The metadata-source interface (TMDB, Bangumi, …), spec §6. Same
//! registry shape as [`crate::clients::scraper`] but for title/ID
//! resolution rather than danmaku.

use async_trait::async_trait;

use crate::models::{MediaType, MetadataDetails};

#[async_trait]
pub trait MetadataSource: Send + Sync {
    fn source_name(&self) -> &str;

    async fn search(&self, keyword: &str, media_type: Option<MediaType>) -> anyhow::Result<Vec<MetadataDetails>>;

    async fn get_details(&self, id: &str, media_type: Option<MediaType>) -> anyhow::Result<Option<MetadataDetails>>;
}
