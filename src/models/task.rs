//! Task manager vocabulary (spec §4.5–§4.7). `TaskOutcome` replaces the
//! original's exception-as-signal pattern (`TaskSuccess`,
//! `TaskPauseForRateLimit`) with a tagged result, per Design Notes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueType {
    Download,
    Management,
    Fallback,
}

impl QueueType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Management => "management",
            Self::Fallback => "fallback",
        }
    }

    #[must_use]
    pub fn all() -> [Self; 3] {
        [Self::Download, Self::Management, Self::Fallback]
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "download" => Some(Self::Download),
            "management" => Some(Self::Management),
            "fallback" => Some(Self::Fallback),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Paused,
}

impl TaskStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Paused => "paused",
        }
    }
}

/// The tagged result every task body returns instead of raising an
/// exception-as-signal.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Done { message: String },
    PauseFor { retry_after_secs: u64, message: String, provider: String },
    Err(anyhow::Error),
}

impl TaskOutcome {
    #[must_use]
    pub fn done(message: impl Into<String>) -> Self {
        Self::Done { message: message.into() }
    }

    #[must_use]
    pub fn pause_for(provider: impl Into<String>, retry_after_secs: u64, message: impl Into<String>) -> Self {
        Self::PauseFor { retry_after_secs, message: message.into(), provider: provider.into() }
    }
}

/// Which kinds of recoverable task a pending row can be rebuilt into on
/// crash-recovery startup (spec §4.5 step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    GenericImport,
    RefreshEpisode,
    FullRefresh,
    DeleteAnime,
    DeleteSource,
    DeleteEpisode,
    Predownload,
    WebhookSearchAndDispatch,
}

impl TaskType {
    #[must_use]
    pub fn is_recoverable(self) -> bool {
        matches!(self, Self::GenericImport | Self::WebhookSearchAndDispatch)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GenericImport => "generic_import",
            Self::RefreshEpisode => "refresh_episode",
            Self::FullRefresh => "full_refresh",
            Self::DeleteAnime => "delete_anime",
            Self::DeleteSource => "delete_source",
            Self::DeleteEpisode => "delete_episode",
            Self::Predownload => "predownload",
            Self::WebhookSearchAndDispatch => "webhook_search_and_dispatch",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "generic_import" => Some(Self::GenericImport),
            "refresh_episode" => Some(Self::RefreshEpisode),
            "full_refresh" => Some(Self::FullRefresh),
            "delete_anime" => Some(Self::DeleteAnime),
            "delete_source" => Some(Self::DeleteSource),
            "delete_episode" => Some(Self::DeleteEpisode),
            "predownload" => Some(Self::Predownload),
            "webhook_search_and_dispatch" => Some(Self::WebhookSearchAndDispatch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericImportParams {
    pub provider: String,
    pub media_id: String,
    pub anime_title: String,
    pub media_type: super::anime::MediaType,
    pub season: i32,
    pub year: Option<i32>,
    pub current_episode_index: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDispatchParams {
    pub anime_title: String,
    pub media_type: super::anime::MediaType,
    pub season: i32,
    pub current_episode_index: Option<i32>,
    pub search_keyword: Option<String>,
    pub douban_id: Option<String>,
    pub tmdb_id: Option<i32>,
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<i32>,
    pub bangumi_id: Option<i32>,
    pub year: Option<i32>,
    pub selected_episodes: Option<Vec<i32>>,
    pub webhook_source: String,
}
