//! Log reader
//!
//! Handles reading records back out of the backing file, either at a known
//! offset (content reads) or as a forward scan over the whole log (startup
//! replay).

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::Path;

use crate::error::{CaskError, Result};
use crate::log::LogRecord;

/// Reads records from the backing file
pub struct LogReader {
    file: BufReader<File>,
    position: u64,
}

impl LogReader {
    /// Open the backing file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = BufReader::new(File::open(path)?);
        Ok(Self { file, position: 0 })
    }

    /// Decode the record starting at the given offset
    pub fn read_at(&mut self, offset: u64) -> Result<LogRecord> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.position = offset;
        match LogRecord::read_from(&mut self.file)? {
            Some(record) => {
                self.position += record.encoded_len() as u64;
                Ok(record)
            }
            None => Err(CaskError::Corruption(format!(
                "no record at offset {offset}: offset is at or past end of log"
            ))),
        }
    }

    /// Read the next record in file order, with the offset it starts at.
    ///
    /// Returns `Ok(None)` at a clean end of log.
    pub fn next_record(&mut self) -> Result<Option<(u64, LogRecord)>> {
        let offset = self.position;
        match LogRecord::read_from(&mut self.file)? {
            Some(record) => {
                self.position += record.encoded_len() as u64;
                Ok(Some((offset, record)))
            }
            None => Ok(None),
        }
    }

    /// Iterate over all records from the current position in file order
    pub fn records(self) -> RecordIter {
        RecordIter {
            reader: self,
            failed: false,
        }
    }
}

/// Iterator over `(offset, record)` pairs; fuses after the first error
pub struct RecordIter {
    reader: LogReader,
    failed: bool,
}

impl Iterator for RecordIter {
    type Item = Result<(u64, LogRecord)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.reader.next_record() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
