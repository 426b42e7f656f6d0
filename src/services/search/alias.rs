//! Stage 2 of the unified search pipeline: alias expansion via the
//! metadata-source registry, with a 1h cache (spec §4.4).

use futures::future::join_all;
use tracing::warn;

use crate::clients::MetadataSourceRegistry;
use crate::constants::cache::SEARCH_ALIAS_TTL_SECONDS;
use crate::db::Store;
use crate::services::search::similarity::token_set_ratio;

fn cache_key(core_title: &str) -> String {
    format!("search_aliases_{core_title}")
}

/// Fans out to every registered metadata source concurrently, validates
/// returned aliases against the parsed core title, caches the validated
/// set, and merges in any caller-supplied `custom_aliases`.
pub async fn expand_aliases(
    store: &Store,
    registry: &MetadataSourceRegistry,
    core_title: &str,
    custom_aliases: &[String],
    threshold: f64,
) -> Vec<String> {
    let key = cache_key(core_title);

    let mut aliases = if let Ok(Some(cached)) = store.cache_get(&key).await {
        serde_json::from_str::<Vec<String>>(&cached).unwrap_or_default()
    } else {
        let sources = registry.all();
        let results = join_all(sources.into_iter().map(|source| {
            let term = core_title.to_string();
            async move { source.search(&term, None).await }
        }))
        .await;

        let mut validated = Vec::new();
        for result in results {
            match result {
                Ok(details) => {
                    for detail in details {
                        for alias in std::iter::once(detail.title).chain(detail.aliases) {
                            if token_set_ratio(core_title, &alias) >= threshold && !validated.contains(&alias) {
                                validated.push(alias);
                            }
                        }
                    }
                }
                Err(e) => warn!(error = %e, "metadata source lookup failed during alias expansion"),
            }
        }

        if let Ok(serialized) = serde_json::to_string(&validated) {
            let _ = store.cache_set(&key, &serialized, SEARCH_ALIAS_TTL_SECONDS).await;
        }
        validated
    };

    for custom in custom_aliases {
        if !aliases.contains(custom) {
            aliases.push(custom.clone());
        }
    }

    aliases
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_keyed_by_core_title() {
        assert_eq!(cache_key("Demo"), "search_aliases_Demo");
    }
}
