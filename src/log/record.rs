//! Log record codec
//!
//! Byte-exact encoding and decoding of a single log record. The format is
//! self-describing: a tombstone keeps its path and kind so that replay can
//! undo earlier records without any side lookup.

use std::io::{ErrorKind, Read};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CaskError, Result};
use crate::path::Path;

/// Kind tag for file records
pub const TAG_FILE: u8 = 0;

/// Kind tag for folder records
pub const TAG_FOLDER: u8 = 1;

/// Content length marking a record as a tombstone
pub const TOMBSTONE_LEN: i32 = -1;

/// Fixed bytes per record: tag (1) + path length (4) + content length (4)
pub const FIXED_OVERHEAD: usize = 9;

/// A single record in the backing file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// The path this record creates, updates, or deletes
    pub path: Path,

    /// Live content or a deletion marker
    pub payload: RecordPayload,
}

/// Payload of a log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordPayload {
    /// A live record: file content, or an empty buffer for a folder marker
    Live(Vec<u8>),

    /// A deletion marker (encoded with content length -1, no content bytes)
    Tombstone,
}

impl LogRecord {
    /// A live file record carrying content
    pub fn file(path: Path, content: Vec<u8>) -> Self {
        Self {
            path,
            payload: RecordPayload::Live(content),
        }
    }

    /// A zero-length folder marker record
    pub fn folder_marker(path: Path) -> Self {
        Self {
            path,
            payload: RecordPayload::Live(Vec::new()),
        }
    }

    /// A tombstone record deleting the path
    pub fn tombstone(path: Path) -> Self {
        Self {
            path,
            payload: RecordPayload::Tombstone,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self.payload, RecordPayload::Tombstone)
    }

    /// Total encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        let content_len = match &self.payload {
            RecordPayload::Live(content) => content.len(),
            RecordPayload::Tombstone => 0,
        };
        FIXED_OVERHEAD + self.path.value().len() + content_len
    }

    /// Encode this record to its on-disk byte layout
    pub fn encode(&self) -> Result<Bytes> {
        let path_bytes = self.path.value().as_bytes();
        if path_bytes.len() > u32::MAX as usize {
            return Err(CaskError::InvalidArgument(format!(
                "path of {} bytes exceeds the u32 length field",
                path_bytes.len()
            )));
        }

        let tag = if self.path.is_file() { TAG_FILE } else { TAG_FOLDER };
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u8(tag);
        buf.put_u32(path_bytes.len() as u32);
        buf.put_slice(path_bytes);
        match &self.payload {
            RecordPayload::Live(content) => {
                if content.len() > i32::MAX as usize {
                    return Err(CaskError::InvalidArgument(format!(
                        "content of {} bytes exceeds the i32 length field",
                        content.len()
                    )));
                }
                buf.put_i32(content.len() as i32);
                buf.put_slice(content);
            }
            RecordPayload::Tombstone => buf.put_i32(TOMBSTONE_LEN),
        }
        Ok(buf.freeze())
    }

    /// Decode one record from the reader's current position.
    ///
    /// Returns `Ok(None)` on a clean end of log (no bytes left at a record
    /// boundary). Any end-of-file inside a record, an unknown kind tag, an
    /// invalid content length, or a non-UTF-8 path is `Corruption`.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Option<LogRecord>> {
        let mut tag = [0u8; 1];
        match reader.read_exact(&mut tag) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let mut len_buf = [0u8; 4];
        read_field(reader, &mut len_buf, "path length")?;
        let path_len = u32::from_be_bytes(len_buf) as usize;

        let mut path_bytes = vec![0u8; path_len];
        read_field(reader, &mut path_bytes, "path")?;
        let value = String::from_utf8(path_bytes)
            .map_err(|e| CaskError::Corruption(format!("record path is not UTF-8: {e}")))?;

        let path = match tag[0] {
            TAG_FILE => Path::File(value),
            TAG_FOLDER => Path::Folder(value),
            other => {
                return Err(CaskError::Corruption(format!(
                    "unknown record tag: 0x{other:02x}"
                )))
            }
        };

        read_field(reader, &mut len_buf, "content length")?;
        let content_len = i32::from_be_bytes(len_buf);

        let payload = match content_len {
            TOMBSTONE_LEN => RecordPayload::Tombstone,
            len if len >= 0 => {
                let mut content = vec![0u8; len as usize];
                read_field(reader, &mut content, "content")?;
                RecordPayload::Live(content)
            }
            len => {
                return Err(CaskError::Corruption(format!(
                    "invalid content length: {len}"
                )))
            }
        };

        Ok(Some(LogRecord { path, payload }))
    }
}

/// Read an exact field, converting a short read into a corruption error
fn read_field<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            CaskError::Corruption(format!("log truncated while reading record {what}"))
        } else {
            CaskError::Io(e)
        }
    })
}
