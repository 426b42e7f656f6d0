//! A reference TMDB-shaped metadata source, in the same thin
//! reqwest-client shape as [`crate::clients::providers::bilibili`]. TMDB's
//! actual search/details APIs are out of scope (spec §1); this
//! implementation is a representative stand-in used to exercise
//! metadata fill-if-empty and the webhook name-conversion step.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::clients::MetadataSource;
use crate::models::{MediaType, MetadataDetails};

pub struct TmdbMetadataSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbMetadataSource {
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("meguru/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client builds with a bounded timeout");
        Self { client, base_url: base_url.into(), api_key: api_key.into() }
    }

    fn parse_result(item: &serde_json::Value) -> Option<MetadataDetails> {
        Some(MetadataDetails {
            id: item["id"].as_i64()?.to_string(),
            title: item["name"].as_str().or_else(|| item["title"].as_str())?.to_string(),
            media_type: item["media_type"].as_str().map(MediaType::parse),
            year: item["first_air_date"]
                .as_str()
                .or_else(|| item["release_date"].as_str())
                .and_then(|d| d.get(0..4))
                .and_then(|y| y.parse().ok()),
            aliases: Vec::new(),
            tmdb_id: item["id"].as_i64().map(|v| v as i32),
            imdb_id: None,
            tvdb_id: None,
            bangumi_id: None,
            douban_id: None,
        })
    }
}

#[async_trait]
impl MetadataSource for TmdbMetadataSource {
    fn source_name(&self) -> &str {
        "tmdb"
    }

    async fn search(&self, keyword: &str, _media_type: Option<MediaType>) -> anyhow::Result<Vec<MetadataDetails>> {
        let url = format!("{}/search/multi?api_key={}&query={}", self.base_url, self.api_key, urlencode(keyword));
        let body: serde_json::Value = self.client.get(&url).send().await?.json().await?;

        let results = body["results"].as_array().cloned().unwrap_or_default().iter().filter_map(Self::parse_result).collect();

        Ok(results)
    }

    async fn get_details(&self, id: &str, media_type: Option<MediaType>) -> anyhow::Result<Option<MetadataDetails>> {
        let kind = match media_type {
            Some(MediaType::Movie) => "movie",
            _ => "tv",
        };
        let url = format!("{}/{}/{}?api_key={}", self.base_url, kind, id, self.api_key);
        let body: serde_json::Value = self.client.get(&url).send().await?.json().await?;
        if body.get("id").is_none() {
            return Ok(None);
        }
        Ok(Self::parse_result(&body))
    }
}

fn urlencode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_result_prefers_tv_name_over_title() {
        let item = serde_json::json!({ "id": 42, "name": "Some Show", "media_type": "tv", "first_air_date": "2021-05-01" });
        let parsed = TmdbMetadataSource::parse_result(&item).unwrap();
        assert_eq!(parsed.title, "Some Show");
        assert_eq!(parsed.year, Some(2021));
        assert_eq!(parsed.tmdb_id, Some(42));
    }
}
