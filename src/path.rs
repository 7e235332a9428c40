//! Logical paths inside the container
//!
//! A [`Path`] names a file or folder in the emulated namespace using the
//! format `"folder1/folder2/file-or-folder"`. It is a closed sum type: the
//! kind (file vs. folder) is part of the value, and two paths are equal only
//! when both kind and string value match. These paths never touch the host
//! filesystem; they are pure string navigation.
//!
//! Callers are expected to pass well-formed values: `/`-separated segments
//! with no leading, trailing, or empty segments. Malformed input is a caller
//! error, not a recoverable failure.

use std::fmt;

/// A logical file or folder path in the container namespace
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Path {
    /// A file path; readable content may be stored under it
    File(String),

    /// A folder path; children may be listed under it
    Folder(String),
}

impl Path {
    /// Create a file path
    pub fn file(value: impl Into<String>) -> Self {
        Path::File(value.into())
    }

    /// Create a folder path
    pub fn folder(value: impl Into<String>) -> Self {
        Path::Folder(value.into())
    }

    /// The raw `/`-delimited string value
    pub fn value(&self) -> &str {
        match self {
            Path::File(value) | Path::Folder(value) => value,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Path::File(_))
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Path::Folder(_))
    }

    /// The containing folder, or `None` for a single-segment path
    pub fn parent(&self) -> Option<Path> {
        self.value()
            .rsplit_once('/')
            .map(|(parent, _)| Path::Folder(parent.to_string()))
    }

    /// The ordered ancestor chain from the shallowest segment down to the
    /// full path itself.
    ///
    /// Every ancestor is a Folder; only the last element keeps the original
    /// kind. `Folder("a/b/c").split()` yields
    /// `[Folder("a"), Folder("a/b"), Folder("a/b/c")]`.
    pub fn split(&self) -> Vec<Path> {
        let segments: Vec<&str> = self.value().split('/').collect();
        let mut chain = Vec::with_capacity(segments.len());
        let mut cumulative = String::new();
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                cumulative.push('/');
            }
            cumulative.push_str(segment);
            if i == segments.len() - 1 {
                chain.push(self.clone());
            } else {
                chain.push(Path::Folder(cumulative.clone()));
            }
        }
        chain
    }

    /// The final segment only, keeping this path's kind
    pub fn last(&self) -> Path {
        match self.value().rsplit_once('/') {
            Some((_, last)) => self.with_value(last.to_string()),
            None => self.clone(),
        }
    }

    /// Concatenate a child under this path; the result takes the child's kind
    pub fn append(&self, child: &Path) -> Path {
        child.with_value(format!("{}/{}", self.value(), child.value()))
    }

    fn with_value(&self, value: String) -> Path {
        match self {
            Path::File(_) => Path::File(value),
            Path::Folder(_) => Path::Folder(value),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}
