//! The rolling ingest log: headerless CSV rows `(subreddit, post_id, count)`,
//! accumulated in a run-owned batch and appended to `logs.csv` in flushes.

use anyhow::{bail, Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// One audit row per ingested post.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LogRow {
    pub subreddit: String,
    pub post_id: String,
    pub num_comments: u64,
}

impl LogRow {
    pub fn to_csv(&self) -> String {
        format!("{},{},{}", self.subreddit, self.post_id, self.num_comments)
    }

    /// Parse one headerless CSV line. Malformed rows are fatal for the caller.
    pub fn parse_csv(line: &str) -> Result<Self> {
        let mut parts = line.split(',');
        let (sub, id, n) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(sub), Some(id), Some(n), None) => (sub, id, n),
            _ => bail!("malformed log row (expected 3 fields): {line:?}"),
        };
        let num_comments: u64 = n
            .trim()
            .parse()
            .with_context(|| format!("malformed comment count in log row {line:?}"))?;
        Ok(Self {
            subreddit: sub.to_string(),
            post_id: id.to_string(),
            num_comments,
        })
    }
}

/// In-memory batch owned by the ingestion run loop. Flushing appends the
/// buffered rows to the log file and clears the batch, so a later flush can
/// never re-append rows that already reached disk.
#[derive(Debug, Default)]
pub struct LogBatch {
    rows: Vec<LogRow>,
}

impl LogBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: LogRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append all buffered rows to `path` (created if absent, no header),
    /// then clear the batch. Returns the number of rows written.
    pub fn flush_to(&mut self, path: &Path) -> Result<usize> {
        if self.rows.is_empty() {
            return Ok(0);
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open {} for append", path.display()))?;
        let mut w = BufWriter::new(file);
        for row in &self.rows {
            writeln!(w, "{}", row.to_csv())?;
        }
        w.flush()?;
        let n = self.rows.len();
        self.rows.clear();
        Ok(n)
    }
}

/// Read every row of a headerless log file, in file order.
pub fn read_log_rows(path: &Path) -> Result<Vec<LogRow>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let r = BufReader::new(file);
    let mut rows = Vec::new();
    for line in r.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(LogRow::parse_csv(&line)?);
    }
    Ok(rows)
}
