use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of a filesystem traversal step.
#[derive(Debug)]
pub struct WalkEntry {
    pub(crate) full_path: PathBuf,
    pub(crate) relative_path: PathBuf,
    pub(crate) metadata: fs::Metadata,
    pub(crate) resolved: Option<fs::Metadata>,
    pub(crate) depth: usize,
    pub(crate) is_root: bool,
}

impl WalkEntry {
    /// Returns the absolute path to the filesystem entry.
    #[must_use]
    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    /// Returns the path relative to the traversal root.
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Metadata of the entry itself, without following symlinks.
    #[must_use]
    pub fn metadata(&self) -> &fs::Metadata {
        &self.metadata
    }

    /// Metadata of the symlink target when symlinks are followed and the
    /// target exists.
    #[must_use]
    pub fn resolved_metadata(&self) -> Option<&fs::Metadata> {
        self.resolved.as_ref()
    }

    /// Metadata describing what the entry stands for: the symlink target when
    /// it was resolved, the entry itself otherwise.
    #[must_use]
    pub fn effective_metadata(&self) -> &fs::Metadata {
        self.resolved.as_ref().unwrap_or(&self.metadata)
    }

    /// Reports whether the entry is, or resolves to, a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.effective_metadata().is_dir()
    }

    /// Reports whether the entry is, or resolves to, a regular file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.effective_metadata().is_file()
    }

    /// Reports whether the entry itself is a symlink.
    #[must_use]
    pub fn is_symlink(&self) -> bool {
        self.metadata.file_type().is_symlink()
    }

    /// Returns the file name associated with the entry, if any.
    ///
    /// The root entry yields `None`.
    #[must_use]
    pub fn file_name(&self) -> Option<&OsStr> {
        if self.is_root {
            None
        } else {
            self.relative_path.file_name()
        }
    }

    /// Reports the depth of the entry relative to the root (root depth is `0`).
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Indicates whether this entry corresponds to the traversal root.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.is_root
    }
}
