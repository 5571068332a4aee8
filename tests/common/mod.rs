#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use subharvest::{ApiError, CommentRecord, ContentClient, PostSummary, SearchSort};

/// A post handle with a deterministic timestamp, for scripting runs.
pub fn make_post(id: &str, author: Option<&str>) -> PostSummary {
    PostSummary {
        id: id.to_string(),
        title: format!("title {id}"),
        score: 10,
        url: format!("https://example.com/{id}"),
        created_utc: 1136073600,
        author: author.map(str::to_string),
    }
}

/// `n` flattened comments for `post_id`, ids `<post_id>_c0..`.
pub fn make_comments(post_id: &str, n: usize) -> Vec<CommentRecord> {
    (0..n)
        .map(|i| CommentRecord {
            comment_id: format!("{post_id}_c{i}"),
            comment_body: format!("comment {i} on {post_id}"),
            comment_score: i as i64,
            comment_author: if i % 2 == 0 { "alice".into() } else { String::new() },
            comment_timestamp: "2006-01-01T00:00:00Z".into(),
        })
        .collect()
}

/// In-memory `ContentClient` with scripted per-post failure sequences.
/// Errors queued via `fail_first` are returned (in order) before the comments
/// for that post succeed.
#[derive(Default)]
pub struct ScriptedClient {
    posts: Vec<PostSummary>,
    comments: HashMap<String, Vec<CommentRecord>>,
    failures: HashMap<String, VecDeque<ApiError>>,
    pub comments_calls: HashMap<String, u32>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a post whose comment fetch yields `n_comments` records.
    pub fn with_post(mut self, id: &str, n_comments: usize) -> Self {
        self.posts.push(make_post(id, Some("bob")));
        self.comments.insert(id.to_string(), make_comments(id, n_comments));
        self
    }

    /// Queue failures returned ahead of the post's comments.
    pub fn fail_first(mut self, id: &str, errors: Vec<ApiError>) -> Self {
        self.failures.entry(id.to_string()).or_default().extend(errors);
        self
    }

    pub fn calls_for(&self, id: &str) -> u32 {
        self.comments_calls.get(id).copied().unwrap_or(0)
    }
}

impl ContentClient for ScriptedClient {
    fn search(
        &mut self,
        _subreddit: &str,
        _term: &str,
        _sort: SearchSort,
        limit: usize,
    ) -> Result<Vec<PostSummary>, ApiError> {
        Ok(self.posts.iter().take(limit).cloned().collect())
    }

    fn comments(&mut self, post: &PostSummary) -> Result<Vec<CommentRecord>, ApiError> {
        *self.comments_calls.entry(post.id.clone()).or_insert(0) += 1;
        if let Some(queue) = self.failures.get_mut(&post.id) {
            if let Some(err) = queue.pop_front() {
                return Err(err);
            }
        }
        Ok(self.comments.get(&post.id).cloned().unwrap_or_default())
    }
}

/// Read a text file line-by-line into strings (useful for .csv checks).
pub fn read_lines(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    let r = BufReader::new(f);
    r.lines().map(|l| l.unwrap()).filter(|s| !s.is_empty()).collect()
}
