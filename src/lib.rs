pub mod cleanup;
pub mod columns;
pub mod config;
pub mod error;
pub mod export;
pub mod fake_source;
pub mod html;
pub mod match_results;
pub mod model;
pub mod page_client;
pub mod player_info;
pub mod profile_fetch;
pub mod query;
pub mod results_fetch;
pub mod sheet;
pub mod site_source;
pub mod source;
pub mod stats_fetch;
pub mod store;
pub mod sync;
pub mod upsert;

pub use error::{ProfileError, Result, SyncError};
pub use store::Store;
pub use sync::{SyncPlan, SyncSummary, run_sync};
