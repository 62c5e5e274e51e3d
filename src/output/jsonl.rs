//! Line-delimited JSON sink
//!
//! Each board gets `{directory}/{board}.jsonl`; every line is one complete
//! thread record, UTF-8 with non-ASCII text left unescaped.

use crate::crawler::ArticleRecord;
use crate::output::traits::{OutputError, OutputResult, RecordSink};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes records to one `.jsonl` file per board
pub struct JsonlSink {
    directory: PathBuf,
    open: Option<OpenBoard>,
}

struct OpenBoard {
    board: String,
    writer: BufWriter<File>,
}

impl JsonlSink {
    /// Creates a sink writing below `directory`, creating it if needed
    pub fn new(directory: impl Into<PathBuf>) -> OutputResult<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            open: None,
        })
    }

    /// Path of the file holding a board's records
    pub fn board_path(&self, board: &str) -> PathBuf {
        self.directory.join(format!("{}.jsonl", board))
    }

    /// Returns the writer for `board`, reopening in append mode if another
    /// board was open
    fn writer_for(&mut self, board: &str) -> OutputResult<&mut BufWriter<File>> {
        let open = match self.open.take() {
            Some(open) if open.board == board => open,
            previous => {
                if let Some(mut previous) = previous {
                    previous.writer.flush()?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(self.board_path(board))?;
                OpenBoard {
                    board: board.to_string(),
                    writer: BufWriter::new(file),
                }
            }
        };

        Ok(&mut self.open.insert(open).writer)
    }

    fn close(&mut self) -> OutputResult<()> {
        if let Some(mut open) = self.open.take() {
            open.writer.flush()?;
        }
        Ok(())
    }
}

impl RecordSink for JsonlSink {
    fn reset(&mut self, board: &str) -> OutputResult<()> {
        self.close()?;
        let file = File::create(self.board_path(board))?;
        tracing::debug!("Reset output {}", self.board_path(board).display());
        self.open = Some(OpenBoard {
            board: board.to_string(),
            writer: BufWriter::new(file),
        });
        Ok(())
    }

    fn append(&mut self, board: &str, record: &ArticleRecord) -> OutputResult<()> {
        let line = serde_json::to_string(record).map_err(|source| OutputError::Serialize {
            id: record.id.clone(),
            source,
        })?;

        let writer = self.writer_for(board)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        // Flushed per record so the file can be tailed during long crawls
        writer.flush()?;
        Ok(())
    }
}

impl Drop for JsonlSink {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Failed to flush output on close: {}", e);
        }
    }
}

/// Reads every record from a board file
///
/// Blank lines are skipped; any other malformed line is an error carrying
/// its 1-based line number.
pub fn read_records(path: &Path) -> OutputResult<Vec<ArticleRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| OutputError::Malformed {
            line: index + 1,
            source,
        })?;
        records.push(record);
    }

    Ok(records)
}
