use crate::api::SearchSort;
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Upstream search results are hard-capped by the API itself.
pub const MAX_SEARCH_RESULTS: usize = 1000;

/// API credentials and the base data directory, environment-provided.
/// Missing values are fatal at startup.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub data_dir: PathBuf,
}

impl Credentials {
    /// Load from the environment, honoring a `.env` file when present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let var = |name: &str| env::var(name).with_context(|| format!("{name} missing from environment"));
        Ok(Self {
            client_id: var("CLIENT_ID")?,
            client_secret: var("CLIENT_SECRET")?,
            user_agent: var("USER_AGENT")?,
            data_dir: PathBuf::from(var("DATA_DIR")?),
        })
    }
}

/// User-facing ingestion options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct HarvestOptions {
    pub subreddit: String,
    pub search_term: String,
    pub sort: SearchSort,
    pub limit: usize,                 // clamped to MAX_SEARCH_RESULTS
    pub output_dir: PathBuf,          // one <post_id>.json per post
    pub log_path: PathBuf,            // headerless append-only CSV
    pub flush_interval: usize,        // flush the batch every N processed posts
    pub max_attempts: Option<u32>,    // rate-limit retry ceiling per post; None = unbounded
    pub progress: bool,               // show progress bar
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            subreddit: String::new(),
            search_term: String::new(),
            sort: SearchSort::Relevance,
            limit: MAX_SEARCH_RESULTS,
            output_dir: PathBuf::from("./data"),
            log_path: PathBuf::from("logs.csv"),
            flush_interval: 5,
            max_attempts: None,
            progress: true,
        }
    }
}

impl HarvestOptions {
    pub fn with_subreddit(mut self, sub: impl AsRef<str>) -> Self {
        let mut s = sub.as_ref().trim().to_string();
        if let Some(rest) = s.strip_prefix("r/") {
            s = rest.to_string();
        }
        self.subreddit = s;
        self
    }
    pub fn with_search_term(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }
    pub fn with_sort(mut self, sort: SearchSort) -> Self {
        self.sort = sort;
        self
    }
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, MAX_SEARCH_RESULTS);
        self
    }
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_log_path(mut self, path: impl AsRef<Path>) -> Self {
        self.log_path = path.as_ref().to_path_buf();
        self
    }
    pub fn with_flush_interval(mut self, n: usize) -> Self {
        self.flush_interval = n.max(1);
        self
    }
    pub fn with_max_attempts(mut self, ceiling: Option<u32>) -> Self {
        self.max_attempts = ceiling;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
}
