//! Per-item outcomes of bulk share operations.

use std::fmt;
use std::path::{Path, PathBuf};

use acl::AccessControlList;

/// Something that happened to one item while adding to a share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareEvent {
    /// A directory was created inside the share.
    DirectoryCreated {
        /// The new directory.
        path: PathBuf,
    },
    /// A hard link to `source` was created at `target`.
    Linked {
        /// The original file.
        source: PathBuf,
        /// The link inside the share.
        target: PathBuf,
    },
    /// A stale entry was un-shared so it could be added again.
    Replaced {
        /// The entry that was removed.
        path: PathBuf,
    },
    /// Linking was refused by the filesystem.
    PermissionDenied {
        /// The file that could not be linked.
        path: PathBuf,
        /// Its ACL at the time, when readable.
        acl: Option<AccessControlList>,
    },
    /// The item is neither a regular file nor a directory and was skipped.
    Unhandled {
        /// The skipped item.
        path: PathBuf,
    },
}

impl ShareEvent {
    /// Reports whether the event describes an item that was not shared.
    #[must_use]
    pub const fn is_problem(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. } | Self::Unhandled { .. })
    }
}

impl fmt::Display for ShareEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectoryCreated { path } => write!(f, "created {}", path.display()),
            Self::Linked { source, target } => {
                write!(f, "linked {} -> {}", source.display(), target.display())
            }
            Self::Replaced { path } => write!(f, "replaced {}", path.display()),
            Self::PermissionDenied { path, acl } => {
                write!(
                    f,
                    "insufficient rights on {}; source files must be writable/appendable when \
                     fs.protected_hardlinks is enabled",
                    path.display()
                )?;
                if let Some(acl) = acl {
                    write!(f, " (permissions: {})", acl.to_spec())?;
                }
                Ok(())
            }
            Self::Unhandled { path } => write!(f, "did not handle input item {}", path.display()),
        }
    }
}

/// Outcome of [`Share::add`](crate::Share::add).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddReport {
    events: Vec<ShareEvent>,
}

impl AddReport {
    pub(crate) fn push(&mut self, event: ShareEvent) {
        self.events.push(event);
    }

    /// Every event in the order it happened.
    #[must_use]
    pub fn events(&self) -> &[ShareEvent] {
        &self.events
    }

    /// Events describing items that were not shared.
    pub fn problems(&self) -> impl Iterator<Item = &ShareEvent> {
        self.events.iter().filter(|event| event.is_problem())
    }

    /// Reports whether any item was skipped or refused.
    #[must_use]
    pub fn has_problems(&self) -> bool {
        self.problems().next().is_some()
    }

    /// Links created inside the share.
    pub fn linked(&self) -> impl Iterator<Item = &Path> {
        self.events.iter().filter_map(|event| match event {
            ShareEvent::Linked { target, .. } => Some(target.as_path()),
            _ => None,
        })
    }

    /// Items skipped because they were neither files nor directories.
    pub fn unhandled(&self) -> impl Iterator<Item = &Path> {
        self.events.iter().filter_map(|event| match event {
            ShareEvent::Unhandled { path } => Some(path.as_path()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problems_are_filtered_from_other_events() {
        let mut report = AddReport::default();
        report.push(ShareEvent::Linked {
            source: PathBuf::from("/data/a"),
            target: PathBuf::from("/share/a"),
        });
        report.push(ShareEvent::Unhandled {
            path: PathBuf::from("/data/socket"),
        });

        assert!(report.has_problems());
        assert_eq!(report.problems().count(), 1);
        assert_eq!(report.linked().collect::<Vec<_>>(), [Path::new("/share/a")]);
        assert_eq!(report.unhandled().collect::<Vec<_>>(), [Path::new("/data/socket")]);
    }

    #[test]
    fn permission_denied_mentions_acl_when_known() {
        let event = ShareEvent::PermissionDenied {
            path: PathBuf::from("/data/a"),
            acl: Some("A::OWNER@:r".parse().unwrap()),
        };
        let text = event.to_string();
        assert!(text.contains("/data/a"));
        assert!(text.contains("A::OWNER@:r"));
    }
}
