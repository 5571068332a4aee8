//! Upstream client boundary: the pipeline only ever talks to `ContentClient`.
//! Failure classification is typed here (retryable rate limit vs. fatal),
//! never inferred from error message text.

use crate::model::CommentRecord;
use thiserror::Error;

/// Sort order accepted by the upstream search endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchSort {
    Relevance,
    Hot,
    Top,
    New,
    Comments,
}

impl SearchSort {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchSort::Relevance => "relevance",
            SearchSort::Hot => "hot",
            SearchSort::Top => "top",
            SearchSort::New => "new",
            SearchSort::Comments => "comments",
        }
    }
}

/// One post handle as returned by a search, before its comment tree is
/// materialized. `author` is `None` for deleted/unknown accounts.
#[derive(Clone, Debug)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub score: i64,
    pub url: String,
    pub created_utc: i64,
    pub author: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Upstream signalled rate limiting (HTTP 429). Recoverable via backoff.
    #[error("rate limited by upstream")]
    RateLimited,
    /// Any other upstream failure. Aborts the run.
    #[error("upstream request failed with status {0}")]
    Status(u16),
    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected upstream payload: {0}")]
    Payload(String),
}

impl ApiError {
    /// The retryable/fatal split used by the ingestion loop.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited)
    }
}

/// What the ingestion pipeline needs from the upstream content API.
pub trait ContentClient {
    /// Ordered search results, at most `limit` posts (upstream hard cap 1000).
    fn search(
        &mut self,
        subreddit: &str,
        term: &str,
        sort: SearchSort,
        limit: usize,
    ) -> Result<Vec<PostSummary>, ApiError>;

    /// Materialize the full comment tree for `post`, with every lazily-loaded
    /// placeholder resolved, flattened into a single ordered list.
    fn comments(&mut self, post: &PostSummary) -> Result<Vec<CommentRecord>, ApiError>;
}
