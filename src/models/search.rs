//! Options and intermediate shapes for the unified search pipeline
//! (spec §4.4).

use serde::{Deserialize, Serialize};

use super::provider::EpisodeInfoHint;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    pub use_alias_expansion: bool,
    pub use_alias_filtering: bool,
    pub use_title_filtering: bool,
    pub use_source_priority_sorting: bool,
    pub strict_filtering: bool,
    pub custom_aliases: Vec<String>,
    pub max_results_per_source: usize,
    pub episode_info: Option<EpisodeInfoHint>,
    pub alias_similarity_threshold: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            use_alias_expansion: true,
            use_alias_filtering: true,
            use_title_filtering: true,
            use_source_priority_sorting: false,
            strict_filtering: false,
            custom_aliases: Vec::new(),
            max_results_per_source: 30,
            episode_info: None,
            alias_similarity_threshold: 75.0,
        }
    }
}

/// A term parsed into its structural parts (spec §4.4 stage 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub title: String,
    pub season: Option<i32>,
    pub episode: Option<i32>,
    pub is_movie_hint: bool,
}
