//! File access used by the loading pipeline.
//!
//! The pipeline never touches the filesystem directly. It goes through a
//! [`SourceReader`], which allows code to run against different backends:
//! - [`NativeReader`]: reads from disk using std
//! - [`MemoryReader`]: serves files from an in-memory table

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Trait defining the file operations the loader needs.
pub trait SourceReader {
    /// Whether `path` names an existing regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Read the whole file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Turn a user-supplied path into the absolute, normalized form used as
    /// the file's identity.
    fn absolute(&self, path: &Path) -> io::Result<PathBuf> {
        absolute_path(path)
    }
}

/// Reads config files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeReader;

impl NativeReader {
    pub fn new() -> Self {
        Self
    }
}

impl SourceReader for NativeReader {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Serves config files from memory.
///
/// Paths are normalized on insertion and lookup, so `a/./b.yaml` and
/// `a/c/../b.yaml` name the same file.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    files: HashMap<PathBuf, String>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file (builder style).
    pub fn with_file(mut self, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files
            .insert(normalize_path(path.as_ref()), content.into());
    }
}

impl SourceReader for MemoryReader {
    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    // In-memory paths are used as given; the working directory is irrelevant.
    fn absolute(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(normalize_path(path))
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} not found in memory", path.display()),
                )
            })
    }
}

impl<R: SourceReader + ?Sized> SourceReader for &R {
    fn is_file(&self, path: &Path) -> bool {
        (**self).is_file(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        (**self).read_to_string(path)
    }

    fn absolute(&self, path: &Path) -> io::Result<PathBuf> {
        (**self).absolute(path)
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. Symlinks are not resolved.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if out.file_name().is_some() {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Make `path` absolute (relative to the current directory) and normalized.
pub fn absolute_path(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(normalize_path(path))
    } else {
        Ok(normalize_path(&std::env::current_dir()?.join(path)))
    }
}
