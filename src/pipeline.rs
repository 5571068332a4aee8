use crate::api::{ApiError, ContentClient};
use crate::backoff::Backoff;
use crate::batch::{LogBatch, LogRow};
use crate::config::HarvestOptions;
use crate::model::PostRecord;
use crate::progress::make_count_progress;
use crate::util::init_tracing_once;
use anyhow::{Context, Result};
use std::fs;
use std::thread::sleep;

/// The ingestion pipeline: bounded search results in, JSON documents plus
/// append-only log rows out. Strictly sequential; the only suspension point
/// is the blocking rate-limit backoff sleep.
#[derive(Clone, Debug, Default)]
pub struct Harvest {
    pub(crate) opts: HarvestOptions,
}

/// What one ingestion run did.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Posts fetched, persisted and logged this run.
    pub processed: usize,
    /// Posts whose document already existed on disk.
    pub skipped: usize,
    /// Posts abandoned after hitting the rate-limit retry ceiling.
    pub given_up: usize,
    /// Log rows that reached the log file (periodic + final flushes).
    pub rows_flushed: usize,
    /// Sum of comment counts over the posts processed this run.
    pub total_comments: u64,
    /// True when a non-retryable upstream failure ended the run early.
    pub aborted: bool,
}

impl Harvest {
    pub fn new() -> Self {
        Self { opts: HarvestOptions::default() }
    }

    // -------- Builder methods --------
    pub fn subreddit(mut self, sub: impl AsRef<str>) -> Self { self.opts = self.opts.with_subreddit(sub); self }
    pub fn search_term(mut self, term: impl Into<String>) -> Self { self.opts = self.opts.with_search_term(term); self }
    pub fn sort(mut self, sort: crate::api::SearchSort) -> Self { self.opts = self.opts.with_sort(sort); self }
    pub fn limit(mut self, limit: usize) -> Self { self.opts = self.opts.with_limit(limit); self }
    pub fn output_dir(mut self, dir: impl AsRef<std::path::Path>) -> Self { self.opts = self.opts.with_output_dir(dir); self }
    pub fn log_path(mut self, path: impl AsRef<std::path::Path>) -> Self { self.opts = self.opts.with_log_path(path); self }
    pub fn flush_interval(mut self, n: usize) -> Self { self.opts = self.opts.with_flush_interval(n); self }
    pub fn max_attempts(mut self, ceiling: Option<u32>) -> Self { self.opts = self.opts.with_max_attempts(ceiling); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }

    /// Run the pipeline against `client`. Already-written documents are never
    /// overwritten; rate limits are retried in place with doubling backoff;
    /// any other upstream failure aborts the run after a final flush.
    pub fn run<C: ContentClient>(&self, client: &mut C) -> Result<RunReport> {
        init_tracing_once();
        let opts = &self.opts;

        fs::create_dir_all(&opts.output_dir)
            .with_context(|| format!("create output dir {}", opts.output_dir.display()))?;

        let mut backoff = Backoff::new();
        let posts = loop {
            match client.search(&opts.subreddit, &opts.search_term, opts.sort, opts.limit) {
                Ok(posts) => break posts,
                Err(e) if e.is_rate_limited() => self.wait_or_give_up(&mut backoff, "search")?,
                Err(e) => return Err(e).with_context(|| format!("search r/{}", opts.subreddit)),
            }
        };
        backoff.reset();
        tracing::info!(count = posts.len(), subreddit = %opts.subreddit, "search returned posts");

        let pb = if opts.progress {
            Some(make_count_progress(posts.len() as u64, "Harvest"))
        } else {
            None
        };

        let mut report = RunReport::default();
        let mut batch = LogBatch::new();

        'posts: for post in &posts {
            let path = opts.output_dir.join(format!("{}.json", post.id));
            if path.exists() {
                tracing::info!(path = %path.display(), "exists, skipping");
                report.skipped += 1;
                if let Some(pb) = &pb { pb.inc(1); }
                continue;
            }

            let comments = loop {
                match client.comments(post) {
                    Ok(c) => break c,
                    Err(ApiError::RateLimited) => {
                        if let Some(ceiling) = opts.max_attempts {
                            if backoff.attempts() >= ceiling {
                                tracing::warn!(post_id = %post.id, attempts = ceiling, "retry ceiling hit, giving up on post");
                                report.given_up += 1;
                                backoff.reset();
                                if let Some(pb) = &pb { pb.inc(1); }
                                continue 'posts;
                            }
                        }
                        let wait = backoff.next_wait();
                        tracing::warn!(post_id = %post.id, wait_secs = wait.as_secs(), "rate limit exceeded, retrying");
                        sleep(wait);
                    }
                    Err(e) => {
                        tracing::error!(post_id = %post.id, error = %e, "upstream failure, aborting run");
                        report.aborted = true;
                        break 'posts;
                    }
                }
            };

            tracing::info!(post_id = %post.id, comments = comments.len(), "fetched");
            for c in &comments {
                tracing::debug!(comment_id = %c.comment_id, "comment");
            }

            let record = PostRecord::new(post, comments);
            record.save_json(&path)?;
            report.total_comments += record.num_comments as u64;
            batch.push(LogRow {
                subreddit: opts.subreddit.clone(),
                post_id: record.id.clone(),
                num_comments: record.num_comments as u64,
            });
            report.processed += 1;
            backoff.reset();
            if let Some(pb) = &pb { pb.inc(1); }

            if report.processed % opts.flush_interval == 0 {
                let n = batch.flush_to(&opts.log_path)?;
                report.rows_flushed += n;
                tracing::info!(rows = n, processed = report.processed, "flushed log batch");
            }
        }

        // Final flush runs even when the loop aborted early.
        report.rows_flushed += batch.flush_to(&opts.log_path)?;
        if let Some(pb) = pb { pb.finish_with_message("done"); }
        tracing::info!(
            processed = report.processed,
            skipped = report.skipped,
            total_comments = report.total_comments,
            "run complete"
        );
        Ok(report)
    }

    fn wait_or_give_up(&self, backoff: &mut Backoff, what: &str) -> Result<()> {
        if let Some(ceiling) = self.opts.max_attempts {
            if backoff.attempts() >= ceiling {
                anyhow::bail!("{what}: rate limited {ceiling} times, giving up");
            }
        }
        let wait = backoff.next_wait();
        tracing::warn!(wait_secs = wait.as_secs(), "rate limit exceeded during {}, retrying", what);
        sleep(wait);
        Ok(())
    }
}
