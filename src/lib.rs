mod api;
mod backoff;
mod batch;
mod config;
mod model;
mod progress;
mod util;

mod pipeline;
mod reddit;
mod report;

pub use crate::api::{ApiError, ContentClient, PostSummary, SearchSort};
pub use crate::backoff::Backoff;
pub use crate::batch::{read_log_rows, LogBatch, LogRow};
pub use crate::config::{Credentials, HarvestOptions, MAX_SEARCH_RESULTS};
pub use crate::model::{CommentRecord, PostRecord};
pub use crate::pipeline::{Harvest, RunReport};
pub use crate::reddit::RedditClient;
pub use crate::report::{clean_and_summarize, dedupe_rows, summarize, write_cleaned, SourceTotals, Summary};

// Expose tracing setup so binaries can initialize it early.
pub use crate::util::init_tracing_once;
