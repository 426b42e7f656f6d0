pub mod anime;
pub mod auth;
pub mod cache;
pub mod config_kv;
pub mod episode;
pub mod log;
pub mod metadata;
pub mod rate_limit;
pub mod task_history;
