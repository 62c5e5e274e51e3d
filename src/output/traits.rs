//! Output sink traits and error types
//!
//! This module defines the trait interface for record sinks. A sink owns
//! one append-only stream per board.

use crate::crawler::ArticleRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize record {id}: {source}")]
    Serialize {
        id: String,
        source: serde_json::Error,
    },

    #[error("Malformed record on line {line}: {source}")]
    Malformed {
        line: usize,
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for extracted thread records
///
/// The page crawler is the only writer; records arrive in listing order.
pub trait RecordSink {
    /// Truncates the board's stream; called once before a board crawl
    fn reset(&mut self, board: &str) -> OutputResult<()>;

    /// Appends one record to the board's stream
    fn append(&mut self, board: &str, record: &ArticleRecord) -> OutputResult<()>;
}
