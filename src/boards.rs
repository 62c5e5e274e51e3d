//! Board list file
//!
//! A newline-delimited file of board names. Each board is removed from the
//! file once its crawl completes, so an interrupted run resumes with the
//! boards still pending.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardListError {
    #[error("Board list not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Board list IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pending boards, in file order
#[derive(Debug, Clone)]
pub struct BoardList {
    path: PathBuf,
    boards: Vec<String>,
}

impl BoardList {
    /// Loads the list; blank lines are ignored and names are trimmed
    pub fn load(path: &Path) -> Result<Self, BoardListError> {
        if !path.exists() {
            return Err(BoardListError::NotFound(path.to_path_buf()));
        }

        let text = std::fs::read_to_string(path)?;
        let boards = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            boards,
        })
    }

    pub fn boards(&self) -> &[String] {
        &self.boards
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the first entry named `board` from the list and the file
    ///
    /// Returns whether an entry was removed. Other lines are written back
    /// untouched.
    pub fn pop_completed(&mut self, board: &str) -> Result<bool, BoardListError> {
        let Some(position) = self.boards.iter().position(|b| b == board) else {
            return Ok(false);
        };
        self.boards.remove(position);

        let text = std::fs::read_to_string(&self.path)?;
        let mut removed = false;
        let mut kept = String::with_capacity(text.len());
        for line in text.lines() {
            if !removed && line.trim() == board {
                removed = true;
                continue;
            }
            kept.push_str(line);
            kept.push('\n');
        }

        std::fs::write(&self.path, kept)?;
        tracing::debug!("Removed {} from {}", board, self.path.display());
        Ok(removed)
    }
}
