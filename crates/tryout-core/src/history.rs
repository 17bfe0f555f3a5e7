//! Append-only session history.
//!
//! The file is one accepted input per line, oldest first. [`HistoryLog`]
//! opens it once when the session starts and closes it exactly once, on
//! [`HistoryLog::close`] or when dropped.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::TryoutError;

/// Input that prints the log instead of being evaluated or recorded.
pub const HISTORY_COMMAND: &str = ".history";

#[derive(Debug)]
pub struct HistoryLog {
    path: PathBuf,
    file: Option<File>,
}

impl HistoryLog {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn attach(path: &Path) -> Result<Self, TryoutError> {
        let io_err = |source| TryoutError::HistoryIo {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_err)?;

        tracing::debug!(path = %path.display(), "history attached");
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }

    /// Existing entries, oldest first, for seeding the line editor.
    pub fn entries(&self) -> Result<Vec<String>, TryoutError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|source| {
            TryoutError::HistoryIo {
                path: self.path.clone(),
                source,
            }
        })?;
        Ok(contents
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Append an accepted line. Empty lines and the history command are
    /// skipped. Returns whether the line was written.
    pub fn record(&mut self, line: &str) -> Result<bool, TryoutError> {
        if line.trim().is_empty() || line.trim() == HISTORY_COMMAND {
            return Ok(false);
        }
        let Some(file) = self.file.as_mut() else {
            return Err(TryoutError::HistoryIo {
                path: self.path.clone(),
                source: io::Error::other("history already closed"),
            });
        };

        writeln!(file, "{line}")
            .and_then(|()| file.flush())
            .map_err(|source| TryoutError::HistoryIo {
                path: self.path.clone(),
                source,
            })?;
        Ok(true)
    }

    /// Newest entry first. The file itself is never rewritten.
    pub fn reversed(&self) -> Result<Vec<String>, TryoutError> {
        let mut entries = self.entries()?;
        entries.reverse();
        Ok(entries)
    }

    pub fn show(&self, out: &mut impl Write) -> Result<(), TryoutError> {
        for line in self.reversed()? {
            writeln!(out, "{line}")?;
        }
        out.flush()?;
        Ok(())
    }

    /// Flush and release the file handle. Later calls do nothing.
    pub fn close(&mut self) {
        if let Some(mut file) = self.file.take() {
            if let Err(e) = file.flush() {
                tracing::warn!("Failed to flush history {}: {e}", self.path.display());
            }
            tracing::debug!(path = %self.path.display(), "history closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

impl Drop for HistoryLog {
    fn drop(&mut self) {
        self.close();
    }
}
