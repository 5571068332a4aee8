use anyhow::Result;
use subharvest::{Credentials, Harvest, RedditClient, SearchSort};

const SUBREDDIT: &str = "ArtemisProgram";
const SEARCH_TERM: &str = "Artemis";
// Upstream caps search results at 1000, so this can't usefully go higher.
const MAX_NUM_ROOT_POSTS: usize = 1000;
// Flush the in-memory log batch to logs.csv every 5 posts.
const FLUSH_INTERVAL: usize = 5;

fn main() -> Result<()> {
    subharvest::init_tracing_once();

    let creds = Credentials::from_env()?;
    let output_dir = creds.data_dir.join(format!("data_{SUBREDDIT}"));
    let mut client = RedditClient::new(&creds)?;

    let report = Harvest::new()
        .subreddit(SUBREDDIT)
        .search_term(SEARCH_TERM)
        .sort(SearchSort::Relevance)
        .limit(MAX_NUM_ROOT_POSTS)
        .output_dir(&output_dir)
        .flush_interval(FLUSH_INTERVAL)
        .progress(true)
        .run(&mut client)?;

    println!(
        "Processed {} posts ({} skipped, {} given up); total comments this run: {}",
        report.processed, report.skipped, report.given_up, report.total_comments
    );
    Ok(())
}
