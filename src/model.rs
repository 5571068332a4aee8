//! Persisted records: one JSON document per post, comments inlined.
//! Field names match the historical document layout consumed downstream.

use crate::api::PostSummary;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Epoch seconds to an RFC 3339 UTC string (the upstream reports epoch).
pub fn iso_utc(epoch: i64) -> String {
    OffsetDateTime::from_unix_timestamp(epoch)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_default()
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentRecord {
    pub comment_id: String,
    pub comment_body: String,
    pub comment_score: i64,
    /// Empty string when the author is unknown or deleted.
    pub comment_author: String,
    pub comment_timestamp: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostRecord {
    pub title: String,
    pub score: i64,
    pub id: String,
    pub url: String,
    pub created_utc: String,
    /// Empty string when the author is unknown or deleted.
    pub author: String,
    pub comments: Vec<CommentRecord>,
    #[serde(rename = "numComments")]
    pub num_comments: usize,
}

impl PostRecord {
    /// Build the immutable record from a search handle and its flattened
    /// comments. `numComments` is derived here and nowhere else, so it always
    /// equals `comments.len()` at persistence time.
    pub fn new(post: &PostSummary, comments: Vec<CommentRecord>) -> Self {
        Self {
            title: post.title.clone(),
            score: post.score,
            id: post.id.clone(),
            url: post.url.clone(),
            created_utc: iso_utc(post.created_utc),
            author: post.author.clone().unwrap_or_default(),
            num_comments: comments.len(),
            comments,
        }
    }

    /// Write the document pretty-printed with 4-space indentation.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let mut w = BufWriter::new(file);
        let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut w, fmt);
        self.serialize(&mut ser)
            .with_context(|| format!("serialize {}", path.display()))?;
        w.flush()?;
        Ok(())
    }
}
