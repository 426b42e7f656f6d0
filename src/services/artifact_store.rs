//! The danmaku XML file tree: path templating, smart-refresh writes, and
//! delete-with-directory-sweep (spec §4.3). The template engine is
//! `util::template::render` generalized from the teacher's
//! `LibraryService::format_path` to this store's variable whitelist.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::constants::artifact::{DEFAULT_MOVIE_TEMPLATE, DEFAULT_TV_TEMPLATE};
use crate::models::{Comment, MediaType};
use crate::services::danmaku_xml;
use crate::util::template::render;

#[derive(Debug, Clone)]
pub struct ArtifactStoreConfig {
    pub root_dir: PathBuf,
    pub movie_template: String,
    pub tv_template: String,
}

impl Default for ArtifactStoreConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./danmaku"),
            movie_template: DEFAULT_MOVIE_TEMPLATE.to_string(),
            tv_template: DEFAULT_TV_TEMPLATE.to_string(),
        }
    }
}

/// Variables available to a path template (spec §4.3).
#[derive(Debug, Clone, Default)]
pub struct PathVars {
    pub anime_id: i32,
    pub episode_id: i64,
    pub source_id: i32,
    pub title: String,
    pub title_base: String,
    pub season: Option<i32>,
    pub episode: i32,
    pub year: Option<i32>,
    pub provider: String,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    config: ArtifactStoreConfig,
}

impl ArtifactStore {
    #[must_use]
    pub fn new(config: ArtifactStoreConfig) -> Self {
        Self { config }
    }

    fn template_for(&self, media_type: MediaType) -> &str {
        match media_type {
            MediaType::Movie => &self.config.movie_template,
            _ => &self.config.tv_template,
        }
    }

    /// Computes the path an episode's artifact would live at, relative to
    /// `root_dir`, without touching the filesystem.
    #[must_use]
    pub fn path_for(&self, media_type: MediaType, vars: &PathVars) -> PathBuf {
        let map = std::collections::HashMap::from([
            ("animeId", vars.anime_id.to_string()),
            ("episodeId", vars.episode_id.to_string()),
            ("sourceId", vars.source_id.to_string()),
            ("title", vars.title.clone()),
            ("titleBase", vars.title_base.clone()),
            ("season", vars.season.map_or_else(String::new, |s| s.to_string())),
            ("episode", vars.episode.to_string()),
            ("year", vars.year.map_or_else(String::new, |y| y.to_string())),
            ("provider", vars.provider.clone()),
        ]);
        let relative = render(self.template_for(media_type), &map);
        self.config.root_dir.join(relative)
    }

    /// Writes comments for an episode under the smart-refresh contract.
    /// `existing_path`/`existing_count` describe the episode's current
    /// artifact, if any. Returns the new comment count, or `None` if the
    /// write was skipped because the fetch wasn't strictly richer.
    pub async fn save_danmaku_for_episode(
        &self,
        media_type: MediaType,
        vars: &PathVars,
        existing_path: Option<&str>,
        existing_count: i32,
        comments: &[Comment],
    ) -> anyhow::Result<Option<(String, i32)>> {
        if comments.is_empty() {
            debug!("skipping danmaku write, comments list is empty");
            return Ok(None);
        }

        let new_count = comments.len() as i32;

        if existing_path.is_some() && new_count <= existing_count {
            debug!(new_count, existing_count, "skipping danmaku write, not strictly richer");
            return Ok(None);
        }

        let path = match existing_path {
            Some(p) => PathBuf::from(p),
            None => self.path_for(media_type, vars),
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let xml = danmaku_xml::serialize_document(vars.episode_id, &vars.provider, comments);
        fs::write(&path, xml.as_bytes()).await?;

        info!(path = %path.display(), new_count, "wrote danmaku artifact");
        Ok(Some((path.to_string_lossy().into_owned(), new_count)))
    }

    /// Removes an episode's artifact and sweeps now-empty parent
    /// directories upward, bounded by the danmaku root (default paths)
    /// or three levels above the file (custom templates).
    pub async fn delete_artifact(&self, file_path: &str) -> anyhow::Result<()> {
        let path = Path::new(file_path);
        if fs::try_exists(path).await.unwrap_or(false) {
            fs::remove_file(path).await?;
        }
        self.sweep_empty_parents(path).await;
        Ok(())
    }

    /// Bulk delete: removes every listed file first, then sweeps each
    /// affected directory once, deepest first.
    pub async fn delete_artifacts(&self, file_paths: &[String]) -> anyhow::Result<()> {
        let mut dirs = std::collections::BTreeSet::new();
        for file_path in file_paths {
            let path = Path::new(file_path);
            if fs::try_exists(path).await.unwrap_or(false) {
                fs::remove_file(path).await?;
            }
            if let Some(parent) = path.parent() {
                dirs.insert(parent.to_path_buf());
            }
        }
        // BTreeSet orders by path string, which for nested paths puts
        // deeper directories after their ancestors; reverse to sweep
        // deepest-first.
        for dir in dirs.into_iter().rev() {
            self.sweep_empty_parents(&dir.join("_")).await;
        }
        Ok(())
    }

    async fn sweep_empty_parents(&self, file_path: &Path) {
        let bound_levels: usize = if self.is_default_template() { usize::MAX } else { 3 };
        let mut current = file_path.parent().map(Path::to_path_buf);
        let mut levels = 0usize;

        while let Some(dir) = current {
            if levels >= bound_levels || dir == self.config.root_dir || !dir.starts_with(&self.config.root_dir) {
                break;
            }
            match fs::read_dir(&dir).await {
                Ok(mut entries) => {
                    if entries.next_entry().await.ok().flatten().is_some() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "could not inspect directory during artifact sweep");
                    break;
                }
            }
            if fs::remove_dir(&dir).await.is_err() {
                break;
            }
            current = dir.parent().map(Path::to_path_buf);
            levels += 1;
        }
    }

    fn is_default_template(&self) -> bool {
        self.config.movie_template == DEFAULT_MOVIE_TEMPLATE && self.config.tv_template == DEFAULT_TV_TEMPLATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(root: &Path) -> ArtifactStore {
        ArtifactStore::new(ArtifactStoreConfig {
            root_dir: root.to_path_buf(),
            movie_template: DEFAULT_MOVIE_TEMPLATE.to_string(),
            tv_template: DEFAULT_TV_TEMPLATE.to_string(),
        })
    }

    fn vars() -> PathVars {
        PathVars { anime_id: 1, episode_id: 25_000_001_010_001, source_id: 1, episode: 1, provider: "bilibili".to_string(), ..Default::default() }
    }

    #[tokio::test]
    async fn writes_new_artifact_when_no_existing_path() {
        let dir = tempdir();
        let store = store(dir.path());
        let comments = vec![Comment { p: "1.0,1,25,16777215".to_string(), m: "hi".to_string(), t: 1.0, cid: None }];
        let result = store.save_danmaku_for_episode(MediaType::TvSeries, &vars(), None, 0, &comments).await.unwrap();
        assert!(result.is_some());
        let (path, count) = result.unwrap();
        assert_eq!(count, 1);
        assert!(fs::try_exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn skips_write_when_not_strictly_richer() {
        let dir = tempdir();
        let store = store(dir.path());
        let path = dir.path().join("existing.xml");
        fs::write(&path, b"<i></i>").await.unwrap();
        let comments = vec![Comment { p: "1.0,1,25,16777215".to_string(), m: "hi".to_string(), t: 1.0, cid: None }];
        let result = store
            .save_danmaku_for_episode(MediaType::TvSeries, &vars(), Some(path.to_str().unwrap()), 5, &comments)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn delete_sweeps_empty_parent_directories() {
        let dir = tempdir();
        let store = store(dir.path());
        let nested = dir.path().join("1");
        fs::create_dir_all(&nested).await.unwrap();
        let file = nested.join("25_000_001_010_001.xml");
        fs::write(&file, b"<i></i>").await.unwrap();

        store.delete_artifact(file.to_str().unwrap()).await.unwrap();

        assert!(!fs::try_exists(&file).await.unwrap());
        assert!(!fs::try_exists(&nested).await.unwrap());
    }

    fn tempdir() -> tempfile_shim::TempDir {
        tempfile_shim::TempDir::new()
    }

    /// A minimal temp-directory helper so tests don't need an extra
    /// dev-dependency for what's otherwise a handful of call sites.
    mod tempfile_shim {
        use std::path::{Path, PathBuf};

        pub struct TempDir(PathBuf);

        impl TempDir {
            pub fn new() -> Self {
                let dir = std::env::temp_dir().join(format!("meguru-artifact-test-{}", std::process::id()));
                let unique = dir.join(uuid::Uuid::new_v4().to_string());
                std::fs::create_dir_all(&unique).expect("create temp dir");
                Self(unique)
            }

            pub fn path(&self) -> &Path {
                &self.0
            }
        }

        impl Drop for TempDir {
            fn drop(&mut self) {
                let _ = std::fs::remove_dir_all(&self.0);
            }
        }
    }
}
