//! In-memory record sink

use crate::crawler::ArticleRecord;
use crate::output::traits::{OutputResult, RecordSink};
use std::collections::BTreeMap;

/// Keeps every board's records in memory, in append order
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    boards: BTreeMap<String, Vec<ArticleRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records written for `board`; empty if the board was never touched
    pub fn records(&self, board: &str) -> &[ArticleRecord] {
        self.boards.get(board).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.boards.values().all(Vec::is_empty)
    }
}

impl RecordSink for MemorySink {
    fn reset(&mut self, board: &str) -> OutputResult<()> {
        self.boards.insert(board.to_string(), Vec::new());
        Ok(())
    }

    fn append(&mut self, board: &str, record: &ArticleRecord) -> OutputResult<()> {
        self.boards
            .entry(board.to_string())
            .or_default()
            .push(record.clone());
        Ok(())
    }
}
