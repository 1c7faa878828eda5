//! Filesystem abstraction for manifest trees
//!
//! Manifests are read either from disk or from an in-memory tree, used for
//! the CRDs compiled into the binary and in tests. Paths handed out by a
//! [`FileSystem`] are relative to its root and use `/` separators.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{CoreError, Result};

/// Trait for manifest sources
///
/// This trait allows for different implementations:
/// - `DiskFileSystem`: A directory (or a single file) on disk
/// - `MemoryFileSystem`: In-memory files
pub trait FileSystem: Send + Sync {
    /// Every regular file in walk order, skipping `.git` directories
    fn walk(&self) -> Result<Vec<String>>;

    /// Read the contents of a file as bytes
    fn read(&self, path: &str) -> Result<Vec<u8>>;
}

/// Files under a directory on disk
///
/// The root may also be a single file, which is then the only entry.
#[derive(Debug, Clone)]
pub struct DiskFileSystem {
    root: PathBuf,
}

impl DiskFileSystem {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            return Err(CoreError::NotFound {
                path: root.display().to_string(),
            });
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_single_file(&self) -> bool {
        self.root.is_file()
    }
}

impl FileSystem for DiskFileSystem {
    fn walk(&self) -> Result<Vec<String>> {
        if self.is_single_file() {
            let name = self
                .root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            return Ok(vec![name]);
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git");

        for entry in walker {
            let entry = entry.map_err(|e| CoreError::Walk {
                path: self.root.display().to_string(),
                source: e,
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };

            let parts: Vec<_> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect();
            files.push(parts.join("/"));
        }

        Ok(files)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = if self.is_single_file() {
            self.root.clone()
        } else {
            self.root.join(path)
        };

        std::fs::read(&full_path).map_err(|e| CoreError::OpenFile {
            path: path.to_string(),
            source: e,
        })
    }
}

/// In-memory files keyed by relative path
#[derive(Debug, Default, Clone)]
pub struct MemoryFileSystem {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryFileSystem {
    /// Create a new empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file
    pub fn with_file(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }

    /// Add a text file
    pub fn with_text_file(self, path: &str, content: &str) -> Self {
        self.with_file(path, content.as_bytes().to_vec())
    }

    pub fn insert(&mut self, path: &str, content: impl Into<Vec<u8>>) {
        self.files.insert(path.to_string(), content.into());
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileSystem for MemoryFileSystem {
    fn walk(&self) -> Result<Vec<String>> {
        let mut paths: Vec<String> = self
            .files
            .keys()
            .filter(|path| !path.split('/').any(|part| part == ".git"))
            .cloned()
            .collect();

        // Same order as a directory walk: entries compared name by name
        paths.sort_by(|a, b| compare_components(a, b));

        Ok(paths)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                path: path.to_string(),
            })
    }
}

fn compare_components(a: &str, b: &str) -> Ordering {
    a.split('/').cmp(b.split('/'))
}
