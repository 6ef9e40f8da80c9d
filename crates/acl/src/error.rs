use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// Error produced while parsing, reading, or applying an ACL.
#[derive(Debug, thiserror::Error)]
pub enum AclError {
    /// Text could not be parsed as an ACL entry.
    #[error("invalid ACL entry '{text}': {reason}")]
    Parse {
        /// The offending text.
        text: String,
        /// What was wrong with it.
        reason: String,
    },
    /// An I/O operation failed.
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
    /// An ACL tool exited unsuccessfully.
    #[error("{} failed on '{}' ({status}): {stderr}", .program.display(), .path.display())]
    Tool {
        /// The program that was run.
        program: PathBuf,
        /// The path it was run against.
        path: PathBuf,
        /// Its exit status.
        status: ExitStatus,
        /// Its trimmed standard error.
        stderr: String,
    },
    /// An empty list cannot replace a path's ACL.
    #[error("refusing to set an empty ACL on '{}'", .path.display())]
    EmptyAcl {
        /// The path that would have lost every entry.
        path: PathBuf,
    },
}

impl AclError {
    pub(crate) fn parse(text: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            text: text.to_owned(),
            reason: reason.into(),
        }
    }

    /// Creates an I/O error with path context.
    pub fn io(context: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            context,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns the path the error refers to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Parse { .. } => None,
            Self::Io { path, .. } | Self::Tool { path, .. } | Self::EmptyAcl { path } => {
                Some(path)
            }
        }
    }

    /// Reports whether the failure was a permission problem.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Io { source, .. } => source.kind() == io::ErrorKind::PermissionDenied,
            Self::Tool { stderr, .. } => {
                stderr.contains("Permission denied") || stderr.contains("Operation not permitted")
            }
            Self::Parse { .. } | Self::EmptyAcl { .. } => false,
        }
    }
}
