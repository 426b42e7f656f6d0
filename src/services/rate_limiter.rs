//! Global + per-provider + fallback quotas (spec §4.2). Exposed as a
//! trait with two implementations so the original's config-driven choice
//! between `RateLimiter` and `RateLimiterDisabled` becomes the one-line
//! swap the spec's Open Question asks for.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use crate::constants::rate_limit::{FALLBACK_MATCH_KEY, FALLBACK_QUOTA, FALLBACK_SEARCH_KEY, GLOBAL_KEY, GLOBAL_PERIOD_SECONDS};
use crate::db::Store;
use crate::util::time::{now_rfc3339, seconds_since};

#[derive(Debug, Error)]
#[error("rate limit exceeded, retry after {retry_after_secs}s")]
pub struct RateLimitExceeded {
    pub retry_after_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    Match,
    Search,
}

impl FallbackKind {
    fn key(self) -> &'static str {
        match self {
            Self::Match => FALLBACK_MATCH_KEY,
            Self::Search => FALLBACK_SEARCH_KEY,
        }
    }
}

#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn check(&self, key: &str) -> Result<(), RateLimitExceeded>;
    async fn increment(&self, key: &str) -> anyhow::Result<()>;
    async fn check_fallback(&self, kind: FallbackKind, provider: &str) -> Result<(), RateLimitExceeded>;
    async fn increment_fallback(&self, kind: FallbackKind, provider: &str) -> anyhow::Result<()>;
    async fn get_global_limit_status(&self) -> anyhow::Result<(bool, u64)>;
}

/// Provider quota table; absence of a key means unlimited ("∞"). The
/// provider table is a shared, mutable `DashMap` rather than a plain
/// `HashMap` so `PUT /api/rate-limits/{provider}` (spec §6) can update a
/// live quota without restarting the limiter.
#[derive(Debug, Clone)]
pub struct QuotaConfig {
    pub global_limit: i32,
    pub provider_limits: Arc<DashMap<String, i32>>,
}

impl QuotaConfig {
    #[must_use]
    pub fn new(global_limit: i32, provider_limits: HashMap<String, i32>) -> Self {
        Self { global_limit, provider_limits: Arc::new(provider_limits.into_iter().collect()) }
    }

    pub fn set_provider_limit(&self, provider: &str, limit: i32) {
        self.provider_limits.insert(provider.to_string(), limit);
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self { global_limit: 0, provider_limits: Arc::new(DashMap::new()) }
    }
}

pub struct DbRateLimiter {
    store: Store,
    quotas: QuotaConfig,
}

impl DbRateLimiter {
    #[must_use]
    pub fn new(store: Store, quotas: QuotaConfig) -> Self {
        Self { store, quotas }
    }

    #[must_use]
    pub fn quotas(&self) -> &QuotaConfig {
        &self.quotas
    }

    fn limit_for(&self, key: &str) -> Option<i32> {
        if key == GLOBAL_KEY {
            Some(self.quotas.global_limit)
        } else if key == FALLBACK_MATCH_KEY || key == FALLBACK_SEARCH_KEY {
            Some(FALLBACK_QUOTA)
        } else {
            self.quotas.provider_limits.get(key).map(|v| *v)
        }
    }

    /// Reset is lazy: computed on read by comparing elapsed time to the
    /// period (spec §4.2).
    async fn effective_count(&self, key: &str) -> anyhow::Result<i32> {
        let (count, last_reset, _) = self.store.rate_limit_read(key).await?;
        let elapsed = seconds_since(&last_reset).unwrap_or(GLOBAL_PERIOD_SECONDS + 1);
        if elapsed >= GLOBAL_PERIOD_SECONDS {
            self.store.rate_limit_reset(key).await?;
            Ok(0)
        } else {
            Ok(count)
        }
    }

    async fn check_key(&self, key: &str) -> Result<(), RateLimitExceeded> {
        let Some(limit) = self.limit_for(key) else { return Ok(()) };
        if limit <= 0 {
            return Ok(());
        }
        let count = self.effective_count(key).await.unwrap_or(0);
        if count >= limit {
            let (_, last_reset, _) = self.store.rate_limit_read(key).await.unwrap_or((0, now_rfc3339(), String::new()));
            let elapsed = seconds_since(&last_reset).unwrap_or(0).max(0);
            let retry_after = (GLOBAL_PERIOD_SECONDS - elapsed).max(0) as u64;
            return Err(RateLimitExceeded { retry_after_secs: retry_after });
        }
        Ok(())
    }
}

#[async_trait]
impl RateLimiter for DbRateLimiter {
    async fn check(&self, key: &str) -> Result<(), RateLimitExceeded> {
        self.check_key(key).await
    }

    async fn increment(&self, key: &str) -> anyhow::Result<()> {
        self.store.rate_limit_increment(key).await?;
        self.store.rate_limit_increment(GLOBAL_KEY).await?;
        Ok(())
    }

    async fn check_fallback(&self, kind: FallbackKind, _provider: &str) -> Result<(), RateLimitExceeded> {
        self.check_key(kind.key()).await
    }

    async fn increment_fallback(&self, kind: FallbackKind, provider: &str) -> anyhow::Result<()> {
        self.store.rate_limit_increment(kind.key()).await?;
        self.store.rate_limit_increment(provider).await?;
        Ok(())
    }

    async fn get_global_limit_status(&self) -> anyhow::Result<(bool, u64)> {
        match self.check_key(GLOBAL_KEY).await {
            Ok(()) => Ok((false, 0)),
            Err(e) => Ok((true, e.retry_after_secs)),
        }
    }
}

/// A no-op limiter: `check`/`check_fallback` always succeed,
/// `increment`/`increment_fallback` no-op. Selected when
/// `config.rate_limiter.enabled == false`.
#[derive(Debug, Default)]
pub struct DisabledRateLimiter;

#[async_trait]
impl RateLimiter for DisabledRateLimiter {
    async fn check(&self, _key: &str) -> Result<(), RateLimitExceeded> {
        Ok(())
    }

    async fn increment(&self, _key: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn check_fallback(&self, _kind: FallbackKind, _provider: &str) -> Result<(), RateLimitExceeded> {
        Ok(())
    }

    async fn increment_fallback(&self, _kind: FallbackKind, _provider: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn get_global_limit_status(&self) -> anyhow::Result<(bool, u64)> {
        Ok((false, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_limiter_never_blocks() {
        let limiter = DisabledRateLimiter;
        assert!(limiter.check("anything").await.is_ok());
        limiter.increment("anything").await.unwrap();
        assert!(limiter.check("anything").await.is_ok());
    }

    #[tokio::test]
    async fn db_limiter_blocks_once_quota_reached() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let mut provider_limits = HashMap::new();
        provider_limits.insert("iqiyi".to_string(), 2);
        let limiter = DbRateLimiter::new(store, QuotaConfig::new(1000, provider_limits));

        limiter.check("iqiyi").await.unwrap();
        limiter.increment("iqiyi").await.unwrap();
        limiter.check("iqiyi").await.unwrap();
        limiter.increment("iqiyi").await.unwrap();

        assert!(limiter.check("iqiyi").await.is_err());
    }

    #[tokio::test]
    async fn unconfigured_provider_is_unlimited() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let limiter = DbRateLimiter::new(store, QuotaConfig::new(1000, HashMap::new()));
        for _ in 0..10 {
            limiter.check("unknown_provider").await.unwrap();
            limiter.increment("unknown_provider").await.unwrap();
        }
    }
}
