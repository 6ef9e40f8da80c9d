//! The hard link count precondition for removing a file from a share.

use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

/// Decision on whether a share may drop its link to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalCheck {
    /// Other links keep the content alive, or removal was forced.
    Permitted,
    /// The share holds the only link; removing it deletes the content.
    WouldDestroyContent,
}

impl RemovalCheck {
    /// Evaluates the guard for a file with `nlink` hard links.
    #[must_use]
    pub const fn evaluate(nlink: u64, force: bool) -> Self {
        if nlink == 1 && !force {
            Self::WouldDestroyContent
        } else {
            Self::Permitted
        }
    }

    /// Reports whether removal may proceed.
    #[must_use]
    pub const fn is_permitted(self) -> bool {
        matches!(self, Self::Permitted)
    }
}

/// Source of hard link counts.
pub trait LinkCounter {
    /// Returns the number of hard links of `path`.
    fn link_count(&self, path: &Path) -> io::Result<u64>;
}

/// [`LinkCounter`] backed by `lstat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsLinkCounter;

impl LinkCounter for FsLinkCounter {
    fn link_count(&self, path: &Path) -> io::Result<u64> {
        fs::symlink_metadata(path).map(|metadata| metadata.nlink())
    }
}

impl<C: LinkCounter + ?Sized> LinkCounter for &C {
    fn link_count(&self, path: &Path) -> io::Result<u64> {
        (**self).link_count(path)
    }
}
