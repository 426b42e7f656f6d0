//! A reference Bilibili scraper, in the shape of the teacher's
//! `clients::nyaa::NyaaClient` (reqwest client + small regex helpers).
//! Bilibili's actual search/comment APIs are out of scope (spec §1); this
//! implementation is a thin, representative stand-in.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;

use crate::clients::Scraper;
use crate::models::{Comment, EpisodeInfoHint, MediaType, ProviderEpisodeInfo, ProviderSearchResult};

fn season_hint_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"第(\d+)季").expect("valid regex"))
}

pub struct BilibiliScraper {
    client: Client,
    base_url: String,
}

impl BilibiliScraper {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    #[must_use]
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("meguru/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client builds with a bounded timeout");
        Self { client, base_url: base_url.into() }
    }
}

#[async_trait]
impl Scraper for BilibiliScraper {
    fn provider_name(&self) -> &str {
        "bilibili"
    }

    async fn search(
        &self,
        term: &str,
        _episode_info: Option<&EpisodeInfoHint>,
        max_results: usize,
    ) -> anyhow::Result<Vec<ProviderSearchResult>> {
        let url = format!("{}/search?keyword={}", self.base_url, urlencode(term));
        let body: serde_json::Value = self.client.get(&url).send().await?.json().await?;

        let season = season_hint_regex()
            .captures(term)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<i32>().ok());

        let results = body["data"]["result"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .take(max_results)
            .filter_map(|item| {
                Some(ProviderSearchResult {
                    provider: "bilibili".to_string(),
                    media_id: item["media_id"].as_str()?.to_string(),
                    title: item["title"].as_str()?.to_string(),
                    media_type: MediaType::TvSeries,
                    season,
                    year: item["year"].as_i64().map(|v| v as i32),
                    episode_count: item["ep_count"].as_i64().map(|v| v as i32),
                    image_url: item["cover"].as_str().map(str::to_string),
                    current_episode_index: None,
                })
            })
            .collect();

        Ok(results)
    }

    async fn get_episodes(
        &self,
        media_id: &str,
        _media_type: Option<MediaType>,
    ) -> anyhow::Result<Vec<ProviderEpisodeInfo>> {
        let url = format!("{}/season/{}", self.base_url, media_id);
        let body: serde_json::Value = self.client.get(&url).send().await?.json().await?;

        let episodes = body["episodes"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| {
                Some(ProviderEpisodeInfo {
                    provider: "bilibili".to_string(),
                    episode_index: (i + 1) as i32,
                    title: item["title"].as_str().map(str::to_string),
                    episode_id: item["cid"].as_str()?.to_string(),
                    url: item["url"].as_str().map(str::to_string),
                })
            })
            .collect();

        Ok(episodes)
    }

    async fn get_comments(&self, provider_episode_id: &str) -> anyhow::Result<Vec<Comment>> {
        let url = format!("{}/comments/{}", self.base_url, provider_episode_id);
        let body: serde_json::Value = self.client.get(&url).send().await?.json().await?;

        let comments = body["comments"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| {
                Some(Comment {
                    p: item["p"].as_str()?.to_string(),
                    m: item["m"].as_str()?.to_string(),
                    t: item["t"].as_f64().unwrap_or(0.0),
                    cid: item["cid"].as_str().map(str::to_string),
                })
            })
            .collect();

        Ok(comments)
    }
}

fn urlencode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_hint_extracts_digits() {
        let caps = season_hint_regex().captures("Demo 第2季").unwrap();
        assert_eq!(&caps[1], "2");
    }
}
