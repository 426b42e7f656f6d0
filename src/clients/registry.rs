//! Name → instance registries for scrapers and metadata sources, the
//! target-language rendition of the original's runtime duck-typed lookup
//! (spec §9, Design Notes: "Source 'scraper' polymorphism").

use std::sync::Arc;

use dashmap::DashMap;

use super::{MetadataSource, Scraper};

#[derive(Clone, Default)]
pub struct ScraperRegistry {
    scrapers: Arc<DashMap<String, Arc<dyn Scraper>>>,
}

impl ScraperRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, scraper: Arc<dyn Scraper>) {
        self.scrapers.insert(scraper.provider_name().to_string(), scraper);
    }

    #[must_use]
    pub fn get(&self, provider: &str) -> Option<Arc<dyn Scraper>> {
        self.scrapers.get(provider).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn all(&self) -> Vec<Arc<dyn Scraper>> {
        self.scrapers.iter().map(|entry| entry.value().clone()).collect()
    }

    #[must_use]
    pub fn provider_names(&self) -> Vec<String> {
        self.scrapers.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[derive(Clone, Default)]
pub struct MetadataSourceRegistry {
    sources: Arc<DashMap<String, Arc<dyn MetadataSource>>>,
}

impl MetadataSourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, source: Arc<dyn MetadataSource>) {
        self.sources.insert(source.source_name().to_string(), source);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn MetadataSource>> {
        self.sources.get(name).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn all(&self) -> Vec<Arc<dyn MetadataSource>> {
        self.sources.iter().map(|entry| entry.value().clone()).collect()
    }
}
