use std::io;
use std::path::{Path, PathBuf};

/// Error returned when traversal fails.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct WalkError {
    kind: WalkErrorKind,
}

impl WalkError {
    pub(crate) const fn new(kind: WalkErrorKind) -> Self {
        Self { kind }
    }

    pub(crate) const fn root_metadata(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::RootMetadata { path, source })
    }

    pub(crate) const fn read_dir(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::ReadDir { path, source })
    }

    pub(crate) const fn metadata(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::Metadata { path, source })
    }

    pub(crate) const fn canonicalize(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::Canonicalize { path, source })
    }

    /// Returns the specific failure that terminated traversal.
    #[must_use]
    pub const fn kind(&self) -> &WalkErrorKind {
        &self.kind
    }

    /// Returns the filesystem path associated with the error.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.kind.path()
    }

    /// Returns the I/O error kind of the underlying failure.
    #[must_use]
    pub fn io_kind(&self) -> io::ErrorKind {
        self.kind.source_error().kind()
    }
}

/// Classification of traversal failures.
#[derive(Debug, thiserror::Error)]
pub enum WalkErrorKind {
    /// Failed to query metadata for the traversal root.
    #[error("failed to inspect traversal root '{}': {source}", .path.display())]
    RootMetadata {
        /// Path that failed to provide metadata.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        #[source]
        source: io::Error,
    },
    /// Failed to list a directory or one of its entries.
    #[error("failed to read directory '{}': {source}", .path.display())]
    ReadDir {
        /// Directory whose contents could not be read.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        #[source]
        source: io::Error,
    },
    /// Failed to retrieve metadata for an entry.
    #[error("failed to inspect metadata for '{}': {source}", .path.display())]
    Metadata {
        /// Path whose metadata could not be retrieved.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        #[source]
        source: io::Error,
    },
    /// Failed to canonicalize a directory path while preventing cycles.
    #[error("failed to canonicalize '{}': {source}", .path.display())]
    Canonicalize {
        /// Directory path that failed to canonicalize.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        #[source]
        source: io::Error,
    },
}

impl WalkErrorKind {
    /// Returns the filesystem path tied to the failure.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::RootMetadata { path, .. }
            | Self::ReadDir { path, .. }
            | Self::Metadata { path, .. }
            | Self::Canonicalize { path, .. } => path,
        }
    }

    const fn source_error(&self) -> &io::Error {
        match self {
            Self::RootMetadata { source, .. }
            | Self::ReadDir { source, .. }
            | Self::Metadata { source, .. }
            | Self::Canonicalize { source, .. } => source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn walk_error_reports_variant_path_and_message() {
        let error = WalkError::read_dir(
            PathBuf::from("dir"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(error.path(), Path::new("dir"));
        assert_eq!(error.io_kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(error.to_string(), "failed to read directory 'dir': denied");
    }

    #[test]
    fn walk_error_source_refers_to_underlying_io_error() {
        let error = WalkError::metadata(PathBuf::from("meta"), io::Error::other("source"));
        let inner = error
            .source()
            .and_then(|err| err.downcast_ref::<io::Error>())
            .expect("walk error should expose the underlying io::Error");
        assert_eq!(inner.to_string(), "source");
    }
}
