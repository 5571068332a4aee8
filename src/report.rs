//! The aggregation job: dedupe the ingest log, rewrite a cleaned copy, group
//! by subreddit and render the human-facing summary table.

use crate::batch::{read_log_rows, LogRow};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const SEPARATOR: &str = "------------------------------------------";

/// Per-subreddit roll-up of the cleaned log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceTotals {
    pub subreddit: String,
    pub num_posts: u64,
    pub num_comments: u64,
}

/// Everything the summary printout needs, computed once.
#[derive(Clone, Debug)]
pub struct Summary {
    /// Ascending by subreddit name (grouping key order).
    pub per_source: Vec<SourceTotals>,
    pub total_posts: u64,
    pub total_comments: u64,
}

impl Summary {
    /// Posts and comments summed together. Limited standalone meaning, kept
    /// for compatibility with the historical report.
    pub fn combined(&self) -> u64 {
        self.total_posts + self.total_comments
    }

    pub fn totals_row(&self) -> SourceTotals {
        SourceTotals {
            subreddit: "Total".to_string(),
            num_posts: self.total_posts,
            num_comments: self.total_comments,
        }
    }

    /// Render the report: per-source table, separator, totals row, separator,
    /// combined grand total. The totals row is merged into the table itself
    /// only when `include_totals_in_table` is set.
    pub fn render(&self, include_totals_in_table: bool) -> String {
        let mut rows: Vec<&SourceTotals> = self.per_source.iter().collect();
        let totals = self.totals_row();
        if include_totals_in_table {
            rows.push(&totals);
        }

        let sub_w = rows
            .iter()
            .map(|r| r.subreddit.len())
            .chain(["subreddit".len()])
            .max()
            .unwrap_or(0);
        let posts_w = rows
            .iter()
            .map(|r| r.num_posts.to_string().len())
            .chain(["numPosts".len()])
            .max()
            .unwrap_or(0);
        let comments_w = rows
            .iter()
            .map(|r| r.num_comments.to_string().len())
            .chain(["numComments".len()])
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>sub_w$}  {:>posts_w$}  {:>comments_w$}",
            "subreddit", "numPosts", "numComments"
        );
        for r in rows {
            let _ = writeln!(
                out,
                "{:>sub_w$}  {:>posts_w$}  {:>comments_w$}",
                r.subreddit, r.num_posts, r.num_comments
            );
        }
        let _ = writeln!(out, "{SEPARATOR}");
        let _ = writeln!(out, "{} {} {}", totals.subreddit, totals.num_posts, totals.num_comments);
        let _ = writeln!(out, "{SEPARATOR}");
        let _ = writeln!(out, "total data points: {}", self.combined());
        out
    }
}

/// Drop rows that are exact duplicates of an earlier row, keeping first
/// occurrences in file order.
pub fn dedupe_rows(rows: Vec<LogRow>) -> Vec<LogRow> {
    let mut seen: ahash::AHashSet<LogRow> = ahash::AHashSet::with_capacity(rows.len());
    rows.into_iter().filter(|r| seen.insert(r.clone())).collect()
}

/// Overwrite `path` with the given rows, headerless.
pub fn write_cleaned(rows: &[LogRow], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    for row in rows {
        writeln!(w, "{}", row.to_csv())?;
    }
    w.flush()?;
    Ok(())
}

/// Group cleaned rows by subreddit: posts = row count, comments = summed.
pub fn summarize(rows: &[LogRow]) -> Summary {
    let mut groups: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for row in rows {
        let e = groups.entry(row.subreddit.as_str()).or_insert((0, 0));
        e.0 += 1;
        e.1 += row.num_comments;
    }
    let per_source: Vec<SourceTotals> = groups
        .into_iter()
        .map(|(sub, (posts, comments))| SourceTotals {
            subreddit: sub.to_string(),
            num_posts: posts,
            num_comments: comments,
        })
        .collect();
    let total_posts = per_source.iter().map(|r| r.num_posts).sum();
    let total_comments = per_source.iter().map(|r| r.num_comments).sum();
    Summary { per_source, total_posts, total_comments }
}

/// The whole job: read the log, dedupe, rewrite the cleaned copy, aggregate.
/// All errors (missing log, malformed row) are fatal; there is no partial
/// result mode.
pub fn clean_and_summarize(log_path: &Path, cleaned_path: &Path) -> Result<Summary> {
    let rows = read_log_rows(log_path)?;
    let deduped = dedupe_rows(rows);
    write_cleaned(&deduped, cleaned_path)?;
    Ok(summarize(&deduped))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sub: &str, id: &str, n: u64) -> LogRow {
        LogRow { subreddit: sub.into(), post_id: id.into(), num_comments: n }
    }

    #[test]
    fn dedupe_keeps_first_occurrence_order() {
        let rows = vec![row("A", "p1", 3), row("A", "p1", 3), row("B", "p2", 5)];
        let deduped = dedupe_rows(rows);
        assert_eq!(deduped, vec![row("A", "p1", 3), row("B", "p2", 5)]);
    }

    #[test]
    fn same_id_different_count_is_not_a_duplicate() {
        let rows = vec![row("A", "p1", 3), row("A", "p1", 4)];
        assert_eq!(dedupe_rows(rows).len(), 2);
    }

    #[test]
    fn summarize_groups_ascending_and_totals() {
        let rows = vec![row("A", "p1", 3), row("A", "p2", 2), row("B", "p3", 7)];
        let s = summarize(&rows);
        assert_eq!(
            s.per_source,
            vec![
                SourceTotals { subreddit: "A".into(), num_posts: 2, num_comments: 5 },
                SourceTotals { subreddit: "B".into(), num_posts: 1, num_comments: 7 },
            ]
        );
        assert_eq!(s.total_posts, 3);
        assert_eq!(s.total_comments, 12);
        assert_eq!(s.combined(), 15);
    }

    #[test]
    fn render_has_separators_and_optional_totals_row() {
        let s = summarize(&[row("A", "p1", 3), row("B", "p2", 7)]);

        let plain = s.render(false);
        let lines: Vec<&str> = plain.lines().collect();
        assert_eq!(lines[0].trim(), "subreddit  numPosts  numComments");
        assert_eq!(lines[3], SEPARATOR);
        assert_eq!(lines[4], "Total 2 10");
        assert_eq!(lines[5], SEPARATOR);
        assert_eq!(lines[6], "total data points: 12");

        let with_totals = s.render(true);
        assert!(with_totals.lines().take(4).any(|l| l.contains("Total")));
    }
}
