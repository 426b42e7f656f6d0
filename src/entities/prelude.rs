pub use super::anime::Entity as Anime;
pub use super::anime_aliases::Entity as AnimeAliases;
pub use super::anime_metadata::Entity as AnimeMetadata;
pub use super::anime_source::Entity as AnimeSource;
pub use super::api_token::Entity as ApiToken;
pub use super::cache_entry::Entity as CacheEntry;
pub use super::config_kv::Entity as ConfigKv;
pub use super::episode::Entity as Episode;
pub use super::external_api_log::Entity as ExternalApiLog;
pub use super::rate_limit_state::Entity as RateLimitState;
pub use super::task_history::Entity as TaskHistory;
pub use super::tmdb_episode_mapping::Entity as TmdbEpisodeMapping;
pub use super::token_access_log::Entity as TokenAccessLog;
pub use super::user::Entity as User;
pub use super::user_session::Entity as UserSession;
