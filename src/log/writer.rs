//! Log writer
//!
//! Handles appending records to the backing file. Every append goes to the
//! current end of file; the returned offset is the record's address and is
//! what the index stores for the path.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::config::SyncStrategy;
use crate::error::Result;
use crate::log::LogRecord;

/// Appends records to the backing file
pub struct LogWriter {
    file: File,
    position: u64,
    sync_strategy: SyncStrategy,
}

impl LogWriter {
    /// Open the backing file for appending, creating it if absent
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let position = file.metadata()?.len();
        Ok(Self {
            file,
            position,
            sync_strategy,
        })
    }

    /// Create a fresh, empty log, truncating any leftover file at the path.
    ///
    /// Used by compaction, where a stale temporary file from an interrupted
    /// earlier run must not leak records into the new log.
    pub fn create(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            file,
            position: 0,
            sync_strategy,
        })
    }

    /// Append a record at the end of the log and return its start offset
    pub fn append(&mut self, record: &LogRecord) -> Result<u64> {
        let offset = self.position;
        let encoded = record.encode()?;
        self.file.write_all(&encoded)?;
        if self.sync_strategy == SyncStrategy::EveryWrite {
            self.file.sync_data()?;
        }
        self.position += encoded.len() as u64;
        Ok(offset)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }

    /// Current end-of-log position (the offset the next append will get)
    pub fn position(&self) -> u64 {
        self.position
    }
}
