//! Append-only log module
//!
//! The entire container state lives in one backing file holding a sequence
//! of records with no padding, checksum, or separator; the reader trusts the
//! declared length fields to re-synchronize.
//!
//! ## Record Format (big-endian)
//! ```text
//! ┌─────────┬──────────────┬───────────┬─────────────────┬─────────┐
//! │ Tag (1) │ PathLen (4)  │ Path      │ ContentLen (4)  │ Content │
//! └─────────┴──────────────┴───────────┴─────────────────┴─────────┘
//!   0 = file      u32         UTF-8       i32, -1 = tombstone,
//!   1 = folder                            0 = empty/folder marker
//! ```
//! Content bytes are omitted when `ContentLen <= 0`. Records are immutable
//! once written; updates and deletes are expressed as later records for the
//! same path, so a forward scan replays to the current state.

mod reader;
mod record;
mod writer;

pub use reader::{LogReader, RecordIter};
pub use record::{LogRecord, RecordPayload, FIXED_OVERHEAD, TAG_FILE, TAG_FOLDER, TOMBSTONE_LEN};
pub use writer::LogWriter;
