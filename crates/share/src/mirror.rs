//! Bringing files and directory trees into a share.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use acl::{AccessControlList, AclBackend, Recursion};
use tracing::{debug, error};
use walk::WalkBuilder;

use crate::guard::LinkCounter;
use crate::report::{AddReport, ShareEvent};
use crate::{Share, ShareError};

/// Result of a single link attempt.
#[derive(Debug)]
enum LinkOutcome {
    Linked,
    Conflict,
    PermissionDenied(io::Error),
}

/// Result of creating one directory inside the share.
#[derive(Debug, PartialEq, Eq)]
enum DirOutcome {
    Created,
    Conflict,
}

/// Result of one tree duplication pass.
#[derive(Debug)]
enum Duplication {
    Complete,
    Conflict(PathBuf),
}

impl<A: AclBackend, L: LinkCounter> Share<A, L> {
    /// Adds files and directory trees to the share.
    ///
    /// Files are hardlinked into the share root under their base name;
    /// directories are mirrored under their base name. Entries left over from
    /// an earlier add are un-shared and added again. Items that are neither
    /// files nor directories, and files the filesystem refuses to link, are
    /// reported in the returned [`AddReport`] without stopping the others.
    ///
    /// There is no rollback: an error leaves whatever was mirrored so far in
    /// place, and a later `add` repairs it. A stale entry holding the only
    /// link to its content is not replaced; the resulting
    /// [`ShareError::WouldDestroyContent`] aborts the whole call.
    pub fn add<I, P>(&self, items: I) -> Result<AddReport, ShareError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let items: Vec<PathBuf> = items
            .into_iter()
            .map(|item| item.as_ref().to_path_buf())
            .collect();
        debug!(target: "share::add", directory = %self.directory.display(), ?items, "adding items");

        let ambient = self.permissions()?;
        let mut report = AddReport::default();
        let mut directories = Vec::new();

        for item in items {
            let kind = fs::metadata(&item).ok().map(|metadata| metadata.file_type());
            match (kind, item.file_name()) {
                (Some(kind), Some(name)) if kind.is_file() => {
                    let target = self.directory.join(name);
                    self.link_file(&item, &target, &ambient, &mut report)?;
                }
                (Some(kind), Some(_)) if kind.is_dir() => directories.push(item),
                _ => {
                    error!(target: "share::add", item = %item.display(), "did not handle input item");
                    report.push(ShareEvent::Unhandled { path: item });
                }
            }
        }

        for directory in directories {
            self.mirror_directory(&directory, &ambient, &mut report)?;
        }

        Ok(report)
    }

    fn mirror_directory(
        &self,
        source_root: &Path,
        ambient: &AccessControlList,
        report: &mut AddReport,
    ) -> Result<(), ShareError> {
        // Each pass removes the subtree it collided with; a stale nested
        // directory is followed by a collision on the mirror root itself.
        let mut resolved: Vec<PathBuf> = Vec::new();
        loop {
            match self.duplicate_tree(source_root, ambient, report)? {
                Duplication::Complete => return Ok(()),
                Duplication::Conflict(path) if resolved.contains(&path) => {
                    return Err(ShareError::Conflict { path });
                }
                Duplication::Conflict(path) => {
                    debug!(target: "share::add", path = %path.display(), "directory already exists; removing and re-adding it");
                    self.unshare_tree(&path, false, ambient)?;
                    report.push(ShareEvent::Replaced { path: path.clone() });
                    resolved.push(path);
                }
            }
        }
    }

    /// Recreates the directories of `source_root` under the share and
    /// hardlinks its files, stopping at the first directory that already
    /// exists.
    fn duplicate_tree(
        &self,
        source_root: &Path,
        ambient: &AccessControlList,
        report: &mut AddReport,
    ) -> Result<Duplication, ShareError> {
        debug!(target: "share::add", source = %source_root.display(), "duplicating tree as links");
        let Some(name) = source_root.file_name() else {
            report.push(ShareEvent::Unhandled {
                path: source_root.to_path_buf(),
            });
            return Ok(Duplication::Complete);
        };

        let mirror_root = self.directory.join(name);
        if self.make_dir(&mirror_root, ambient)? == DirOutcome::Conflict {
            return Ok(Duplication::Conflict(mirror_root));
        }
        report.push(ShareEvent::DirectoryCreated {
            path: mirror_root.clone(),
        });

        let walker = WalkBuilder::new(source_root)
            .follow_symlinks(true)
            .include_root(false)
            .build()?;

        for entry in walker {
            let entry = entry?;
            if self.contains(entry.full_path()) {
                debug!(target: "share::add", path = %entry.full_path().display(), "skipping entry inside the share");
                continue;
            }

            let target = mirror_root.join(entry.relative_path());
            if entry.is_dir() {
                if self.make_dir(&target, ambient)? == DirOutcome::Conflict {
                    return Ok(Duplication::Conflict(target));
                }
                report.push(ShareEvent::DirectoryCreated { path: target });
            } else if entry.is_file() {
                self.link_file(entry.full_path(), &target, ambient, report)?;
            } else {
                error!(target: "share::add", item = %entry.full_path().display(), "did not handle tree entry");
                report.push(ShareEvent::Unhandled {
                    path: entry.full_path().to_path_buf(),
                });
            }
        }

        Ok(Duplication::Complete)
    }

    /// Reports whether `path` resolves to a location inside the share.
    fn contains(&self, path: &Path) -> bool {
        fs::canonicalize(path)
            .unwrap_or_else(|_| path.to_path_buf())
            .starts_with(&self.directory)
    }

    /// Creates one directory and gives it the ambient permissions.
    fn make_dir(&self, path: &Path, ambient: &AccessControlList) -> Result<DirOutcome, ShareError> {
        debug!(target: "share::add", path = %path.display(), "creating directory");
        match fs::create_dir(path) {
            Ok(()) => {
                if !ambient.is_empty() {
                    ambient.set(&self.acls, path)?;
                }
                Ok(DirOutcome::Created)
            }
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => Ok(DirOutcome::Conflict),
            Err(error) => Err(ShareError::io("create directory", path, error)),
        }
    }

    /// Links `source` at `target`, un-sharing a stale `target` once.
    fn link_file(
        &self,
        source: &Path,
        target: &Path,
        ambient: &AccessControlList,
        report: &mut AddReport,
    ) -> Result<(), ShareError> {
        let mut retried = false;
        loop {
            match self.try_link(source, target, ambient)? {
                LinkOutcome::Linked => {
                    report.push(ShareEvent::Linked {
                        source: source.to_path_buf(),
                        target: target.to_path_buf(),
                    });
                    return Ok(());
                }
                LinkOutcome::Conflict if !retried => {
                    debug!(target: "share::add", path = %target.display(), "file already exists; removing and re-adding it");
                    self.unshare_file(target, false, ambient)?;
                    report.push(ShareEvent::Replaced {
                        path: target.to_path_buf(),
                    });
                    retried = true;
                }
                LinkOutcome::Conflict => {
                    return Err(ShareError::Conflict {
                        path: target.to_path_buf(),
                    });
                }
                LinkOutcome::PermissionDenied(cause) => {
                    let acl = AccessControlList::from_file(&self.acls, source).ok();
                    error!(
                        target: "share::add",
                        path = %source.display(),
                        permissions = %acl.as_ref().map(AccessControlList::to_spec).unwrap_or_default(),
                        %cause,
                        "insufficient rights; source files need to be writable/appendable when fs.protected_hardlinks is enabled"
                    );
                    report.push(ShareEvent::PermissionDenied {
                        path: source.to_path_buf(),
                        acl,
                    });
                    return Ok(());
                }
            }
        }
    }

    fn try_link(
        &self,
        source: &Path,
        target: &Path,
        ambient: &AccessControlList,
    ) -> Result<LinkOutcome, ShareError> {
        // A source that already sits in a locked share carries the lock
        // entry, which would block setting permissions on the new link.
        let current = AccessControlList::from_file(&self.acls, source)?;
        if self.lock_acl.iter().any(|entry| current.contains(entry)) {
            self.lock_acl.unset(&self.acls, source, Recursion::Single)?;
        }

        let original = fs::canonicalize(source)
            .map_err(|error| ShareError::io("resolve", source, error))?;
        debug!(target: "share::add", source = %original.display(), target = %target.display(), "linking");

        match fs::hard_link(&original, target) {
            Ok(()) => {
                ambient.append(&self.acls, target, Recursion::Single)?;
                Ok(LinkOutcome::Linked)
            }
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => Ok(LinkOutcome::Conflict),
            Err(error) if error.kind() == io::ErrorKind::PermissionDenied => {
                Ok(LinkOutcome::PermissionDenied(error))
            }
            Err(error) => Err(ShareError::io("hard link", target, error)),
        }
    }
}
