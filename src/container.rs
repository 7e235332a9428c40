//! Storage container
//!
//! The public-facing engine: a lifecycle state machine wrapping the backing
//! file and the in-memory [`StorageIndex`].
//!
//! ## Lifecycle
//! ```text
//!              start                stop
//!   Created ──────────► ReadyToUse ─────► Stopped
//!      │                    │  ▲             │
//!      │                    │  └─── start ───┘
//!      │ destroy            │ destroy        │ destroy
//!      ▼                    ▼                ▼
//!                       Destroyed (terminal)
//! ```
//! Every file/folder operation and `compact` requires `ReadyToUse`.
//!
//! ## Mutation model
//! Each mutating call appends one or more records to the log and then
//! updates the index; nothing is ever overwritten in place. `start()`
//! rebuilds the index by scanning the whole file forward, so later records
//! (tombstones included) override earlier ones for the same path.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path as FsPath, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{CaskError, Result};
use crate::index::StorageIndex;
use crate::log::{LogReader, LogRecord, LogWriter, RecordPayload};
use crate::path::Path;

/// Container lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    ReadyToUse,
    Stopped,
    Destroyed,
}

/// A single-backing-file storage container
pub struct Container {
    config: Config,
    state: ContainerState,
    index: StorageIndex,
    writer: Option<LogWriter>,
}

impl Container {
    /// Suffix of the temporary file compaction writes the new log into
    const TMP_SUFFIX: &'static str = "_tmp";

    /// Suffix of the backup the old log is parked under during the swap
    const BKP_SUFFIX: &'static str = "_bkp";

    /// Create a container over the configured backing file.
    ///
    /// The container starts in `Created`; call [`start`](Self::start) before
    /// any file/folder operation.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: ContainerState::Created,
            index: StorageIndex::new(),
            writer: None,
        }
    }

    /// Convenience: create and immediately start a container
    pub fn open(config: Config) -> Result<Self> {
        let mut container = Self::new(config);
        container.start()?;
        Ok(container)
    }

    /// Current lifecycle state
    pub fn state(&self) -> ContainerState {
        self.state
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start the container, replaying the backing file if it exists.
    ///
    /// The whole log is scanned forward once; live records feed the index,
    /// tombstones remove earlier state. A missing backing file is created
    /// empty.
    pub fn start(&mut self) -> Result<()> {
        self.require_state(&[ContainerState::Created, ContainerState::Stopped])?;

        let storage = self.config.storage_path.clone();
        let mut index = StorageIndex::new();
        if storage.exists() {
            let mut live = 0u64;
            let mut tombstones = 0u64;
            for item in LogReader::open(&storage)?.records() {
                let (offset, record) = item?;
                match record.payload {
                    RecordPayload::Live(_) => {
                        index.add(&record.path, offset);
                        live += 1;
                    }
                    RecordPayload::Tombstone => {
                        index.remove(&record.path);
                        tombstones += 1;
                    }
                }
            }
            debug!(live, tombstones, "log replay complete");
        }

        self.writer = Some(LogWriter::open(&storage, self.config.sync_strategy)?);
        self.index = index;
        self.state = ContainerState::ReadyToUse;
        info!(storage = %storage.display(), "container started");
        Ok(())
    }

    /// Stop the container, discarding the in-memory index.
    ///
    /// The next [`start`](Self::start) rebuilds it from the backing file.
    pub fn stop(&mut self) -> Result<()> {
        self.require_state(&[ContainerState::ReadyToUse])?;
        self.writer = None;
        self.index = StorageIndex::new();
        self.state = ContainerState::Stopped;
        info!("container stopped");
        Ok(())
    }

    /// Destroy the container and delete the backing file. Terminal.
    pub fn destroy(&mut self) -> Result<()> {
        self.require_state(&[
            ContainerState::Created,
            ContainerState::Stopped,
            ContainerState::ReadyToUse,
        ])?;
        self.writer = None;
        self.index = StorageIndex::new();
        if self.config.storage_path.exists() {
            fs::remove_file(&self.config.storage_path)?;
        }
        self.state = ContainerState::Destroyed;
        info!(storage = %self.config.storage_path.display(), "container destroyed");
        Ok(())
    }

    // =========================================================================
    // File Operations
    // =========================================================================

    /// Create or overwrite a file.
    ///
    /// Appends a live record unconditionally; an earlier record for the same
    /// path is superseded at a new offset. Ancestor folders are registered
    /// in the index structure but get no records of their own.
    pub fn create_file(&mut self, file: &Path, content: &[u8]) -> Result<()> {
        self.require_ready()?;
        expect_file(file)?;
        self.write_internal(file, content.to_vec())
    }

    /// Overwrite an existing file; NotFound if it was never created
    pub fn write(&mut self, file: &Path, content: &[u8]) -> Result<()> {
        self.require_ready()?;
        expect_file(file)?;
        self.index.ensure_exists(file)?;
        self.write_internal(file, content.to_vec())
    }

    /// Read a file's current content
    pub fn read(&self, file: &Path) -> Result<Vec<u8>> {
        self.require_ready()?;
        expect_file(file)?;
        self.read_internal(file)
    }

    /// Append bytes to an existing file.
    ///
    /// Read-modify-append: the concatenation is written as one new record,
    /// not patched in place.
    pub fn append(&mut self, file: &Path, content: &[u8]) -> Result<()> {
        self.require_ready()?;
        expect_file(file)?;
        self.index.ensure_exists(file)?;
        let mut combined = self.read_internal(file)?;
        combined.extend_from_slice(content);
        self.write_internal(file, combined)
    }

    // =========================================================================
    // Folder Operations
    // =========================================================================

    /// Create a folder, registering it and its ancestor chain
    pub fn create_folder(&mut self, folder: &Path) -> Result<()> {
        self.require_ready()?;
        expect_folder(folder)?;
        self.create_folder_internal(folder)
    }

    /// List the immediate children (files and folders) of a folder
    pub fn list(&self, folder: &Path) -> Result<Vec<Path>> {
        self.require_ready()?;
        expect_folder(folder)?;
        Ok(self.index.children(folder)?.iter().cloned().collect())
    }

    /// Depth-first traversal of every descendant file and folder
    pub fn walk<F: FnMut(&Path)>(&self, folder: &Path, mut visit: F) -> Result<()> {
        self.require_ready()?;
        expect_folder(folder)?;
        self.walk_internal(folder, &mut visit)
    }

    // =========================================================================
    // Shared Operations
    // =========================================================================

    /// Whether a file or folder currently exists
    pub fn exists(&self, path: &Path) -> Result<bool> {
        self.require_ready()?;
        Ok(self.index.contains(path))
    }

    /// Delete a file or folder.
    ///
    /// A folder takes its whole subtree with it. One tombstone is appended
    /// per affected path, children before parents, so the log replays to the
    /// same state the index holds — a crash between delete and the next
    /// compaction loses nothing.
    pub fn delete(&mut self, path: &Path) -> Result<()> {
        self.require_ready()?;
        self.index.ensure_exists(path)?;
        self.delete_internal(path)
    }

    /// Rename (move) a file or folder to a new path.
    ///
    /// Both paths must have the same kind, and the target must not be the
    /// source itself or lie inside the source's subtree. Folder contents are
    /// moved recursively; every child reaches its new location before the
    /// old parent's tombstone is written.
    pub fn rename(&mut self, old: &Path, new: &Path) -> Result<()> {
        self.require_ready()?;
        if old.is_file() != new.is_file() {
            return Err(CaskError::InvalidArgument(format!(
                "cannot rename across path kinds: {old:?} -> {new:?}"
            )));
        }
        // A path renamed onto itself would tombstone its own fresh copy; a
        // folder renamed into its own subtree would recurse forever.
        let into_own_subtree =
            old.is_folder() && new.value().starts_with(&format!("{}/", old.value()));
        if old == new || into_own_subtree {
            return Err(CaskError::InvalidArgument(format!(
                "cannot rename {old} onto itself or into its own subtree"
            )));
        }
        self.index.ensure_exists(old)?;
        self.move_internal(old, new)
    }

    /// Alias for [`rename`](Self::rename)
    pub fn move_entry(&mut self, old: &Path, new: &Path) -> Result<()> {
        self.rename(old, new)
    }

    // =========================================================================
    // Compaction
    // =========================================================================

    /// Rewrite the backing file keeping only the live set.
    ///
    /// Every live folder gets a fresh marker and every live file its current
    /// content, written contiguously into `<name>_tmp`. The swap then runs
    /// in three steps: rename old → `<name>_bkp`, rename tmp into place,
    /// delete the backup. If the first rename fails the original file and
    /// index are untouched.
    pub fn compact(&mut self) -> Result<()> {
        self.require_ready()?;

        let storage = self.config.storage_path.clone();
        let tmp = sibling(&storage, Self::TMP_SUFFIX);
        let bkp = sibling(&storage, Self::BKP_SUFFIX);
        let sync = self.config.sync_strategy;

        let reclaimed_from = self.writer.as_ref().map(LogWriter::position).unwrap_or(0);

        // Write the new log before touching the old one.
        let mut new_writer = LogWriter::create(&tmp, sync)?;
        let mut new_offsets: BTreeMap<Path, u64> = BTreeMap::new();
        for folder in self.index.folders() {
            new_writer.append(&LogRecord::folder_marker(folder.clone()))?;
        }
        {
            let mut reader = LogReader::open(&storage)?;
            for (file, old_offset) in self.index.files() {
                let record = reader.read_at(old_offset)?;
                let content = match record.payload {
                    RecordPayload::Live(content) => content,
                    RecordPayload::Tombstone => {
                        return Err(CaskError::Corruption(format!(
                            "tombstone at offset {old_offset} indexed as live path {file}"
                        )))
                    }
                };
                let offset = new_writer.append(&LogRecord::file(file.clone(), content))?;
                new_offsets.insert(file.clone(), offset);
            }
        }
        new_writer.sync()?;
        let compacted_len = new_writer.position();
        drop(new_writer);

        // Release the old handle for the swap.
        self.writer = None;
        if let Err(e) = fs::rename(&storage, &bkp) {
            let _ = fs::remove_file(&tmp);
            self.writer = Some(LogWriter::open(&storage, sync)?);
            return Err(CaskError::Io(e));
        }
        if let Err(e) = fs::rename(&tmp, &storage) {
            // Put the old log back so the container keeps serving it.
            fs::rename(&bkp, &storage)?;
            let _ = fs::remove_file(&tmp);
            self.writer = Some(LogWriter::open(&storage, sync)?);
            return Err(CaskError::Io(e));
        }

        // The compacted log is in place; the index and writer must follow it
        // even if the backup cleanup below fails.
        self.index.replace_offsets(new_offsets);
        self.writer = Some(LogWriter::open(&storage, sync)?);
        if let Err(e) = fs::remove_file(&bkp) {
            warn!(backup = %bkp.display(), error = %e, "compaction backup could not be deleted");
        }
        info!(
            before = reclaimed_from,
            after = compacted_len,
            "compaction complete"
        );
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn require_state(&self, allowed: &[ContainerState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(CaskError::InvalidState(format!(
                "operation allowed in {allowed:?}, current state is {:?}",
                self.state
            )))
        }
    }

    fn require_ready(&self) -> Result<()> {
        self.require_state(&[ContainerState::ReadyToUse])
    }

    fn writer_mut(&mut self) -> Result<&mut LogWriter> {
        self.writer
            .as_mut()
            .ok_or_else(|| CaskError::InvalidState("backing file is not open".to_string()))
    }

    fn write_internal(&mut self, file: &Path, content: Vec<u8>) -> Result<()> {
        let record = LogRecord::file(file.clone(), content);
        let offset = self.writer_mut()?.append(&record)?;
        self.index.add(file, offset);
        Ok(())
    }

    fn read_internal(&self, file: &Path) -> Result<Vec<u8>> {
        let offset = self.index.offset(file)?;
        let record = LogReader::open(&self.config.storage_path)?.read_at(offset)?;
        match record.payload {
            RecordPayload::Live(content) => Ok(content),
            RecordPayload::Tombstone => Err(CaskError::Corruption(format!(
                "tombstone at offset {offset} indexed as live path {file}"
            ))),
        }
    }

    fn create_folder_internal(&mut self, folder: &Path) -> Result<()> {
        let record = LogRecord::folder_marker(folder.clone());
        let offset = self.writer_mut()?.append(&record)?;
        self.index.add(folder, offset);
        Ok(())
    }

    fn delete_internal(&mut self, path: &Path) -> Result<()> {
        if path.is_folder() {
            let kids: Vec<Path> = self.index.children(path)?.iter().cloned().collect();
            for child in &kids {
                self.delete_internal(child)?;
            }
        }
        self.writer_mut()?.append(&LogRecord::tombstone(path.clone()))?;
        self.index.remove(path);
        Ok(())
    }

    fn move_internal(&mut self, old: &Path, new: &Path) -> Result<()> {
        if old.is_file() {
            let content = self.read_internal(old)?;
            self.write_internal(new, content)?;
            self.delete_internal(old)
        } else {
            self.create_folder_internal(new)?;
            let kids: Vec<Path> = self.index.children(old)?.iter().cloned().collect();
            for child in &kids {
                self.move_internal(child, &new.append(&child.last()))?;
            }
            self.delete_internal(old)
        }
    }

    fn walk_internal<F: FnMut(&Path)>(&self, folder: &Path, visit: &mut F) -> Result<()> {
        for child in self.index.children(folder)? {
            visit(child);
            if child.is_folder() {
                self.walk_internal(child, visit)?;
            }
        }
        Ok(())
    }
}

fn expect_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CaskError::InvalidArgument(format!(
            "expected a file path, got folder: {path}"
        )))
    }
}

fn expect_folder(path: &Path) -> Result<()> {
    if path.is_folder() {
        Ok(())
    } else {
        Err(CaskError::InvalidArgument(format!(
            "expected a folder path, got file: {path}"
        )))
    }
}

/// A sibling path with the given suffix glued onto the file name
fn sibling(path: &FsPath, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
