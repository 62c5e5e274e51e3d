//! Output module for thread records and crawl reports
//!
//! This module handles:
//! - Writing one line-delimited JSON file per board
//! - Reading those files back for inspection
//! - Collecting records in memory for library callers and tests
//! - Summarising a board crawl

mod jsonl;
mod memory;
pub mod stats;
mod traits;

pub use jsonl::{read_records, JsonlSink};
pub use memory::MemorySink;
pub use stats::{print_report, CrawlReport};
pub use traits::{OutputError, OutputResult, RecordSink};
