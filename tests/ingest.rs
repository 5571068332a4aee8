#[path = "common/mod.rs"]
mod common;

use common::*;
use subharvest::{ApiError, Harvest, PostRecord};

fn harvest_into(dir: &std::path::Path) -> Harvest {
    Harvest::new()
        .subreddit("space")
        .search_term("artemis")
        .output_dir(dir.join("docs"))
        .log_path(dir.join("logs.csv"))
        .progress(false)
}

/// Running twice against the same output directory processes nothing on the
/// second pass: every post is skipped and the log gains no rows.
#[test]
fn second_run_skips_everything() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = ScriptedClient::new()
        .with_post("p1", 3)
        .with_post("p2", 0)
        .with_post("p3", 2);

    let h = harvest_into(dir.path());
    let first = h.run(&mut client).unwrap();
    assert_eq!(first.processed, 3);
    assert_eq!(first.skipped, 0);
    assert_eq!(first.total_comments, 5);

    let second = h.run(&mut client).unwrap();
    assert_eq!(second.processed, 0);
    assert_eq!(second.skipped, 3);
    assert_eq!(second.rows_flushed, 0);

    // No additional comment fetches happened for any post.
    assert_eq!(client.calls_for("p1"), 1);
    assert_eq!(read_lines(&dir.path().join("logs.csv")).len(), 3);
}

/// Flushing every N posts appends exactly the batched rows and clears the
/// batch, so the final flush never re-appends rows already on disk.
#[test]
fn flush_cadence_without_reappend() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = ScriptedClient::new();
    for i in 0..7 {
        client = client.with_post(&format!("p{i}"), i);
    }

    let report = harvest_into(dir.path())
        .flush_interval(2)
        .run(&mut client)
        .unwrap();
    assert_eq!(report.processed, 7);
    assert_eq!(report.rows_flushed, 7);

    let lines = read_lines(&dir.path().join("logs.csv"));
    assert_eq!(lines.len(), 7);
    // Every row is distinct: the batch was cleared between flushes.
    let mut unique = lines.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 7);
    assert!(lines[3].starts_with("space,p3,"));
}

/// Every persisted document keeps `numComments` equal to its comment list.
#[test]
fn persisted_documents_are_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = ScriptedClient::new()
        .with_post("p1", 4)
        .with_post("p2", 0);

    harvest_into(dir.path()).run(&mut client).unwrap();

    for id in ["p1", "p2"] {
        let path = dir.path().join("docs").join(format!("{id}.json"));
        let text = std::fs::read_to_string(&path).unwrap();
        let rec: PostRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(rec.num_comments, rec.comments.len());
        assert_eq!(rec.id, id);
    }
    assert_eq!(
        PostRecord::new(&make_post("x", None), make_comments("x", 4)).num_comments,
        4
    );
}

/// A non-retryable upstream failure aborts the run but keeps prior progress:
/// earlier documents stay on disk and the final flush still writes their rows.
#[test]
fn fatal_failure_aborts_after_final_flush() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = ScriptedClient::new()
        .with_post("p1", 1)
        .with_post("p2", 2)
        .with_post("p3", 3)
        .with_post("p4", 4)
        .fail_first("p3", vec![ApiError::Status(500)]);

    let report = harvest_into(dir.path())
        .flush_interval(10)
        .run(&mut client)
        .unwrap();

    assert!(report.aborted);
    assert_eq!(report.processed, 2);
    assert_eq!(report.total_comments, 3);
    // p4 was never reached.
    assert_eq!(client.calls_for("p4"), 0);

    let docs = dir.path().join("docs");
    assert!(docs.join("p1.json").exists());
    assert!(docs.join("p2.json").exists());
    assert!(!docs.join("p3.json").exists());

    let lines = read_lines(&dir.path().join("logs.csv"));
    assert_eq!(lines, vec!["space,p1,1".to_string(), "space,p2,2".to_string()]);
}

/// Rate limits are retried in place: the same post is fetched again after the
/// backoff sleep, and the run still processes every post in order.
#[test]
fn rate_limit_retries_same_post_until_success() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = ScriptedClient::new()
        .with_post("p1", 2)
        .with_post("p2", 1)
        .fail_first("p1", vec![ApiError::RateLimited, ApiError::RateLimited]);

    let report = harvest_into(dir.path()).run(&mut client).unwrap();

    assert_eq!(report.processed, 2);
    assert!(!report.aborted);
    assert_eq!(client.calls_for("p1"), 3);
    assert_eq!(client.calls_for("p2"), 1);

    let lines = read_lines(&dir.path().join("logs.csv"));
    assert_eq!(lines, vec!["space,p1,2".to_string(), "space,p2,1".to_string()]);
}

/// With a retry ceiling configured, a persistently rate-limited post is given
/// up with a distinct outcome and the run moves on to the next post.
#[test]
fn retry_ceiling_gives_up_on_item() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = ScriptedClient::new()
        .with_post("p1", 5)
        .with_post("p2", 1)
        .fail_first(
            "p1",
            vec![ApiError::RateLimited, ApiError::RateLimited, ApiError::RateLimited],
        );

    let report = harvest_into(dir.path())
        .max_attempts(Some(1))
        .run(&mut client)
        .unwrap();

    assert_eq!(report.given_up, 1);
    assert_eq!(report.processed, 1);
    assert!(!report.aborted);

    let docs = dir.path().join("docs");
    assert!(!docs.join("p1.json").exists());
    assert!(docs.join("p2.json").exists());

    let lines = read_lines(&dir.path().join("logs.csv"));
    assert_eq!(lines, vec!["space,p2,1".to_string()]);
}
