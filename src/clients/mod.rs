pub mod ai_matcher;
pub mod metadata_source;
pub mod metadata_sources;
pub mod providers;
pub mod registry;
pub mod scraper;

pub use ai_matcher::AiMatcher;
pub use metadata_source::MetadataSource;
pub use registry::{MetadataSourceRegistry, ScraperRegistry};
pub use scraper::Scraper;
