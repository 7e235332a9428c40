//! # pathcask
//!
//! An embeddable, single-backing-file storage engine that emulates a
//! hierarchical file/folder namespace without touching the host OS
//! directory structure:
//! - All files and folders live in one physical file as an append-only
//!   sequence of log records
//! - Tombstone records express deletion; nothing is overwritten in place
//! - An in-memory index, rebuilt by replaying the log on startup, serves
//!   existence checks, content lookup, and child listing
//! - Compaction rewrites the log with only the live set, reclaiming the
//!   space held by superseded and tombstoned records
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Container                              │
//! │     (lifecycle state machine + operation dispatch)           │
//! └──────────────┬──────────────────────────────┬───────────────┘
//!                │ mutations append,            │ lookups
//!                │ reads decode at offset       │
//! ┌──────────────▼──────────────┐   ┌───────────▼───────────────┐
//! │            Log              │   │       StorageIndex        │
//! │  (record codec + writer +   │──►│  path → offset            │
//! │   reader over one file)     │   │  folder → children        │
//! └──────────────┬──────────────┘   └───────────────────────────┘
//!                │                       ▲
//!                ▼                       │ startup replay
//!         ┌─────────────┐                │ (forward scan)
//!         │ Backing file│────────────────┘
//!         └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use pathcask::{Config, Container, Path};
//!
//! # fn main() -> pathcask::Result<()> {
//! let config = Config::builder().storage_path("./storage").build();
//! let mut container = Container::open(config)?;
//!
//! container.create_folder(&Path::folder("docs"))?;
//! container.create_file(&Path::file("docs/readme"), b"hello")?;
//! assert_eq!(container.read(&Path::file("docs/readme"))?, b"hello");
//!
//! container.compact()?;
//! container.stop()?;
//! # Ok(())
//! # }
//! ```
//!
//! The model is single-threaded and synchronous: one container instance
//! owns one backing file, no internal locking is provided, and concurrent
//! access must be serialized by the caller.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod container;
pub mod error;
pub mod index;
pub mod log;
pub mod path;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{Config, SyncStrategy};
pub use container::{Container, ContainerState};
pub use error::{CaskError, Result};
pub use index::StorageIndex;
pub use log::{LogReader, LogRecord, LogWriter, RecordPayload};
pub use path::Path;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of pathcask
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
