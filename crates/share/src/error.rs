use std::io;
use std::path::{Path, PathBuf};

use acl::AclError;
use walk::WalkError;

/// Error produced by share operations.
#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    /// The share path exists as a plain file.
    #[error("'{}' should be non-existent or a directory", .path.display())]
    IllegalSetup {
        /// The offending path.
        path: PathBuf,
    },
    /// The share directory exists and reuse was not allowed.
    #[error("share directory '{}' already exists", .path.display())]
    AlreadyExists {
        /// The existing path.
        path: PathBuf,
    },
    /// A filesystem call failed.
    #[error("failed to {context} '{}': {source}", .path.display())]
    Io {
        /// The operation being performed.
        context: &'static str,
        /// The path involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Reading or writing an ACL failed.
    #[error(transparent)]
    Acl(#[from] AclError),
    /// Traversing a tree failed.
    #[error(transparent)]
    Walk(#[from] WalkError),
    /// The file's only hard link is the share's; removing it would delete the
    /// content.
    #[error("'{}' has ONE hard link; un-sharing it would delete it (force required)", .path.display())]
    WouldDestroyContent {
        /// The file that was kept.
        path: PathBuf,
    },
    /// A tree was un-shared except for files whose only hard link is the
    /// share's, which were kept together with their directories.
    #[error("kept {} file(s) whose only hard link is in the share", .paths.len())]
    Retained {
        /// The files that were kept.
        paths: Vec<PathBuf>,
    },
    /// An entry still existed after un-sharing it once.
    #[error("'{}' still exists after un-sharing it", .path.display())]
    Conflict {
        /// The conflicting path.
        path: PathBuf,
    },
}

impl ShareError {
    pub(crate) fn io(context: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            context,
            path: path.to_path_buf(),
            source,
        }
    }

    /// The I/O error class the failure corresponds to, if any.
    ///
    /// Refusing to delete the last copy of a file is reported as
    /// [`io::ErrorKind::NotFound`].
    #[must_use]
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io { source, .. } => Some(source.kind()),
            Self::AlreadyExists { .. } | Self::Conflict { .. } => Some(io::ErrorKind::AlreadyExists),
            Self::WouldDestroyContent { .. } | Self::Retained { .. } => Some(io::ErrorKind::NotFound),
            Self::Walk(error) => Some(error.io_kind()),
            Self::IllegalSetup { .. } | Self::Acl(_) => None,
        }
    }
}
