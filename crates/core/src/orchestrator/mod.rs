//! Search orchestrator for wanted media.
//!
//! One search per item walks its profile tiers sequentially. Different items
//! may be searched concurrently; the same item never is.

mod config;
mod eta;
mod runner;
mod traits;
mod types;

pub use config::OrchestratorConfig;
pub use eta::{could_be_released, NoReleaseDates, ReleaseDateLookup, ReleaseDates};
pub use runner::SearchOrchestrator;
pub use traits::{DownloadError, DownloadOutcome, Downloader};
pub use types::{
    OrchestratorError, SearchProgress, SearchReport, SearchState, WantedItemSearchState,
};
