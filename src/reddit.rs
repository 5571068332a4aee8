//! Blocking Reddit OAuth client behind the `ContentClient` boundary.
//! Token fetch via client credentials, `after`-paginated search, and comment
//! tree traversal with `morechildren` resolution.

use crate::api::{ApiError, ContentClient, PostSummary, SearchSort};
use crate::config::Credentials;
use crate::model::{iso_utc, CommentRecord};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const OAUTH_BASE: &str = "https://oauth.reddit.com";
/// Upstream page size cap; larger requests are silently truncated anyway.
const PAGE_SIZE: usize = 100;
/// Renew the token this long before its advertised expiry.
const TOKEN_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct Token {
    access_token: String,
    expires_at: Instant,
}

pub struct RedditClient {
    http: Client,
    client_id: String,
    client_secret: String,
    token: Option<Token>,
}

impl RedditClient {
    pub fn new(creds: &Credentials) -> Result<Self, ApiError> {
        let http = Client::builder().user_agent(creds.user_agent.clone()).build()?;
        Ok(Self {
            http,
            client_id: creds.client_id.clone(),
            client_secret: creds.client_secret.clone(),
            token: None,
        })
    }

    fn ensure_token(&mut self) -> Result<String, ApiError> {
        if let Some(tok) = &self.token {
            if Instant::now() < tok.expires_at {
                return Ok(tok.access_token.clone());
            }
        }
        let resp = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()?;
        let resp = check_status(resp)?;
        let tok: TokenResponse = resp.json()?;
        let expires_at = Instant::now()
            + Duration::from_secs(tok.expires_in).saturating_sub(TOKEN_MARGIN);
        let access = tok.access_token.clone();
        self.token = Some(Token { access_token: tok.access_token, expires_at });
        Ok(access)
    }

    fn get(&mut self, url: &str, query: &[(&str, String)]) -> Result<Response, ApiError> {
        let token = self.ensure_token()?;
        let resp = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()?;
        check_status(resp)
    }
}

fn check_status(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.as_u16() == 429 {
        return Err(ApiError::RateLimited);
    }
    if !status.is_success() {
        return Err(ApiError::Status(status.as_u16()));
    }
    Ok(resp)
}

fn post_from_value(data: &Value) -> Option<PostSummary> {
    let id = data.get("id")?.as_str()?.to_string();
    Some(PostSummary {
        id,
        title: data.get("title").and_then(Value::as_str).unwrap_or_default().to_string(),
        score: data.get("score").and_then(Value::as_i64).unwrap_or(0),
        url: data.get("url").and_then(Value::as_str).unwrap_or_default().to_string(),
        created_utc: data.get("created_utc").and_then(Value::as_f64).unwrap_or(0.0) as i64,
        author: data
            .get("author")
            .and_then(Value::as_str)
            .filter(|a| !a.is_empty())
            .map(str::to_string),
    })
}

fn comment_from_value(data: &Value) -> Option<CommentRecord> {
    let id = data.get("id")?.as_str()?.to_string();
    Some(CommentRecord {
        comment_id: id,
        comment_body: data.get("body").and_then(Value::as_str).unwrap_or_default().to_string(),
        comment_score: data.get("score").and_then(Value::as_i64).unwrap_or(0),
        comment_author: data
            .get("author")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        comment_timestamp: iso_utc(
            data.get("created_utc").and_then(Value::as_f64).unwrap_or(0.0) as i64,
        ),
    })
}

/// Depth-first walk over a comment listing: `t1` things become records (their
/// reply listings walked in place), `more` placeholders queue their child ids.
fn walk_comment_listing(listing: &Value, out: &mut Vec<CommentRecord>, more_ids: &mut Vec<String>) {
    let children = listing
        .get("data")
        .and_then(|d| d.get("children"))
        .and_then(Value::as_array);
    let Some(children) = children else { return };
    for thing in children {
        let kind = thing.get("kind").and_then(Value::as_str).unwrap_or("");
        let Some(data) = thing.get("data") else { continue };
        match kind {
            "t1" => {
                if let Some(rec) = comment_from_value(data) {
                    out.push(rec);
                }
                if let Some(replies) = data.get("replies") {
                    if replies.is_object() {
                        walk_comment_listing(replies, out, more_ids);
                    }
                }
            }
            "more" => {
                if let Some(ids) = data.get("children").and_then(Value::as_array) {
                    more_ids.extend(ids.iter().filter_map(Value::as_str).map(str::to_string));
                }
            }
            _ => {}
        }
    }
}

impl ContentClient for RedditClient {
    fn search(
        &mut self,
        subreddit: &str,
        term: &str,
        sort: SearchSort,
        limit: usize,
    ) -> Result<Vec<PostSummary>, ApiError> {
        let url = format!("{OAUTH_BASE}/r/{subreddit}/search");
        let mut posts = Vec::with_capacity(limit.min(PAGE_SIZE));
        let mut after: Option<String> = None;

        while posts.len() < limit {
            let page = (limit - posts.len()).min(PAGE_SIZE);
            let mut query = vec![
                ("q", term.to_string()),
                ("sort", sort.as_str().to_string()),
                ("limit", page.to_string()),
                ("restrict_sr", "on".to_string()),
                ("raw_json", "1".to_string()),
            ];
            if let Some(a) = &after {
                query.push(("after", a.clone()));
            }

            let resp = self.get(&url, &query)?;
            let listing: Value = resp.json()?;
            let data = listing
                .get("data")
                .ok_or_else(|| ApiError::Payload("search response missing data".into()))?;
            let children = data
                .get("children")
                .and_then(Value::as_array)
                .ok_or_else(|| ApiError::Payload("search response missing children".into()))?;

            if children.is_empty() {
                break;
            }
            for thing in children {
                if thing.get("kind").and_then(Value::as_str) != Some("t3") {
                    continue;
                }
                if let Some(post) = thing.get("data").and_then(post_from_value) {
                    posts.push(post);
                    if posts.len() == limit {
                        break;
                    }
                }
            }

            after = data.get("after").and_then(Value::as_str).map(str::to_string);
            if after.is_none() {
                break;
            }
        }
        Ok(posts)
    }

    fn comments(&mut self, post: &PostSummary) -> Result<Vec<CommentRecord>, ApiError> {
        let url = format!("{OAUTH_BASE}/comments/{}", post.id);
        let query = vec![("limit", "500".to_string()), ("raw_json", "1".to_string())];
        let resp = self.get(&url, &query)?;
        let payload: Value = resp.json()?;

        // Payload is [post listing, comment listing].
        let comment_listing = payload
            .get(1)
            .ok_or_else(|| ApiError::Payload("comments response missing listing".into()))?;

        let mut out = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        walk_comment_listing(comment_listing, &mut out, &mut pending);

        // Resolve "more comments" placeholders until none remain.
        let more_url = format!("{OAUTH_BASE}/api/morechildren");
        while !pending.is_empty() {
            let chunk: Vec<String> = pending
                .drain(..pending.len().min(PAGE_SIZE))
                .collect();
            let query = vec![
                ("link_id", format!("t3_{}", post.id)),
                ("children", chunk.join(",")),
                ("api_type", "json".to_string()),
                ("raw_json", "1".to_string()),
            ];
            let resp = self.get(&more_url, &query)?;
            let payload: Value = resp.json()?;
            let things = payload
                .get("json")
                .and_then(|j| j.get("data"))
                .and_then(|d| d.get("things"))
                .and_then(Value::as_array)
                .ok_or_else(|| ApiError::Payload("morechildren response missing things".into()))?;

            for thing in things {
                let kind = thing.get("kind").and_then(Value::as_str).unwrap_or("");
                let Some(data) = thing.get("data") else { continue };
                match kind {
                    "t1" => {
                        if let Some(rec) = comment_from_value(data) {
                            out.push(rec);
                        }
                    }
                    "more" => {
                        if let Some(ids) = data.get("children").and_then(Value::as_array) {
                            pending.extend(
                                ids.iter().filter_map(Value::as_str).map(str::to_string),
                            );
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(out)
    }
}
