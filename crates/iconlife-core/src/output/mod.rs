//! Output Generation
//!
//! Snapshot generation and run statistics.

pub mod snapshot;
pub mod stats;

use thiserror::Error;

pub use snapshot::*;
pub use stats::*;

/// Output error type
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
