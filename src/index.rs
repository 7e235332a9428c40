//! In-memory storage index
//!
//! Two flat maps rebuilt from the log mirror the namespace tree without any
//! owned node graph:
//!
//! - `offsets` stores the latest live record offset for every file.
//! - `children` stores the structure. Every folder is a key, and every
//!   nested path appears twice: as a member of its parent's child set and
//!   (folders only) as a key itself. `"level1/level2/level3"` is stored as:
//!   ```text
//!   (level1               : {level1/level2})
//!   (level1/level2        : {level1/level2/level3})
//!   (level1/level2/level3 : {})
//!   ```
//!   That gives constant-time listing for deeply nested folders, with parent
//!   paths recomputed on demand by string splitting instead of back-links.
//!
//! A path is live iff the newest record written for it was not a tombstone;
//! feeding records to [`add`](StorageIndex::add) / [`remove`](StorageIndex::remove)
//! in ascending file order keeps both maps equal to exactly the live set.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CaskError, Result};
use crate::path::Path;

/// The live-path view derived from log order
#[derive(Debug, Default)]
pub struct StorageIndex {
    /// Byte offset of the latest live record for every file
    offsets: BTreeMap<Path, u64>,

    /// Immediate children (files and folders) of every live folder
    children: BTreeMap<Path, BTreeSet<Path>>,
}

impl StorageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live record for `path` at `offset`.
    ///
    /// Files get their offset recorded; in both cases every ancestor implied
    /// by `path.split()` becomes a folder key with the ancestor-to-child
    /// edges filled in, so a deeply nested write implicitly creates the
    /// whole chain above it.
    pub fn add(&mut self, path: &Path, offset: u64) {
        if path.is_file() {
            self.offsets.insert(path.clone(), offset);
        }

        let chain = path.split();
        for node in &chain {
            if node.is_folder() {
                self.children.entry(node.clone()).or_default();
            }
        }
        for edge in chain.windows(2) {
            self.children
                .entry(edge[0].clone())
                .or_default()
                .insert(edge[1].clone());
        }
    }

    /// Remove `path` from the live set.
    ///
    /// A folder takes its whole current subtree with it; the path is then
    /// unlinked from its parent's child set. Removing an absent path is a
    /// no-op, which is what replay needs when a folder tombstone arrives
    /// after its children's own tombstones.
    pub fn remove(&mut self, path: &Path) {
        if path.is_folder() {
            if let Some(kids) = self.children.get(path).cloned() {
                for child in &kids {
                    self.remove(child);
                }
            }
        }

        self.offsets.remove(path);
        self.children.remove(path);
        if let Some(parent) = path.parent() {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.remove(path);
            }
        }
    }

    /// Whether the path is live: files by offset key, folders by children key
    pub fn contains(&self, path: &Path) -> bool {
        match path {
            Path::File(_) => self.offsets.contains_key(path),
            Path::Folder(_) => self.children.contains_key(path),
        }
    }

    /// Like [`contains`](Self::contains), but absence is a NotFound error
    pub fn ensure_exists(&self, path: &Path) -> Result<()> {
        if self.contains(path) {
            Ok(())
        } else {
            Err(CaskError::NotFound(path.value().to_string()))
        }
    }

    /// Latest live record offset for a file
    pub fn offset(&self, file: &Path) -> Result<u64> {
        self.offsets
            .get(file)
            .copied()
            .ok_or_else(|| CaskError::NotFound(file.value().to_string()))
    }

    /// Immediate children of a folder
    pub fn children(&self, folder: &Path) -> Result<&BTreeSet<Path>> {
        self.children
            .get(folder)
            .ok_or_else(|| CaskError::NotFound(folder.value().to_string()))
    }

    /// All live files with their current offsets, in path order
    pub fn files(&self) -> impl Iterator<Item = (&Path, u64)> {
        self.offsets.iter().map(|(path, offset)| (path, *offset))
    }

    /// All live folders, in path order
    pub fn folders(&self) -> impl Iterator<Item = &Path> {
        self.children.keys()
    }

    /// Swap in the offsets of a freshly compacted log.
    ///
    /// The structure map is kept: child relationships are unaffected by
    /// rewriting record positions.
    pub fn replace_offsets(&mut self, offsets: BTreeMap<Path, u64>) {
        self.offsets = offsets;
    }
}
