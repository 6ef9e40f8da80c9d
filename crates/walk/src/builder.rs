use crate::error::WalkError;
use crate::walker::Walker;
use std::path::PathBuf;

/// Position of a directory relative to its contents in the yielded sequence.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum WalkOrder {
    /// Directories are yielded before their contents (top-down).
    #[default]
    PreOrder,
    /// Directories are yielded after their contents (bottom-up).
    PostOrder,
}

/// Configures a filesystem traversal rooted at a specific path.
#[derive(Clone, Debug)]
pub struct WalkBuilder {
    root: PathBuf,
    follow_symlinks: bool,
    include_root: bool,
    order: WalkOrder,
}

impl WalkBuilder {
    /// Creates a new builder that will traverse the provided root path.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            follow_symlinks: false,
            include_root: true,
            order: WalkOrder::PreOrder,
        }
    }

    /// Configures whether symlinks should be resolved and directory symlinks
    /// traversed.
    ///
    /// The walker always yields the symlink entry itself. When enabled, the
    /// target's metadata is exposed through
    /// [`WalkEntry::resolved_metadata`](crate::WalkEntry::resolved_metadata)
    /// and a directory target is descended while keeping the symlink's
    /// relative path in the emitted entries.
    #[must_use]
    pub const fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Controls whether the root entry should be included in the output.
    #[must_use]
    pub const fn include_root(mut self, include: bool) -> Self {
        self.include_root = include;
        self
    }

    /// Selects top-down or bottom-up traversal.
    #[must_use]
    pub const fn order(mut self, order: WalkOrder) -> Self {
        self.order = order;
        self
    }

    /// Builds a [`Walker`] using the configured options.
    pub fn build(self) -> Result<Walker, WalkError> {
        Walker::new(
            self.root,
            self.follow_symlinks,
            self.include_root,
            self.order,
        )
    }
}
