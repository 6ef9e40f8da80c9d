#![deny(unsafe_code)]

//! Test doubles and scratch-tree helpers shared by the workspace's tests.
//!
//! [`MemoryAcls`] stands in for `nfs4_getfacl`/`nfs4_setfacl` on filesystems
//! without NFSv4 ACL support. ACLs are stored per inode, so every hardlink of
//! a file observes the same list, exactly like the real thing.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use acl::{AccessControlList, AclBackend, AclError, Recursion};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
struct InodeKey {
    device: u64,
    inode: u64,
}

/// In-memory [`AclBackend`] keyed by device and inode.
///
/// Inodes that were never written report the default list given to
/// [`MemoryAcls::new`].
#[derive(Debug)]
pub struct MemoryAcls {
    default_acl: AccessControlList,
    acls: Mutex<HashMap<InodeKey, AccessControlList>>,
    writes: Mutex<Vec<PathBuf>>,
}

impl MemoryAcls {
    /// Creates a backend reporting `default_acl` for untouched inodes.
    #[must_use]
    pub fn new(default_acl: AccessControlList) -> Self {
        Self {
            default_acl,
            acls: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Paths that received a write, in call order.
    #[must_use]
    pub fn writes(&self) -> Vec<PathBuf> {
        lock(&self.writes).clone()
    }

    /// Reads an ACL, panicking on failure.
    #[must_use]
    pub fn acl_of(&self, path: &Path) -> AccessControlList {
        self.read(path)
            .unwrap_or_else(|error| panic!("read ACL of {}: {error}", path.display()))
    }

    fn key(path: &Path) -> Result<InodeKey, AclError> {
        let metadata = fs::metadata(path).map_err(|error| AclError::io("stat", path, error))?;
        Ok(InodeKey {
            device: metadata.dev(),
            inode: metadata.ino(),
        })
    }

    fn update(
        &self,
        path: &Path,
        recursion: Recursion,
        change: &dyn Fn(&AccessControlList) -> AccessControlList,
    ) -> Result<(), AclError> {
        for target in targets(path, recursion)? {
            let key = Self::key(&target)?;
            let mut acls = lock(&self.acls);
            let current = acls.get(&key).unwrap_or(&self.default_acl);
            let next = change(current);
            acls.insert(key, next);
            lock(&self.writes).push(target);
        }
        Ok(())
    }
}

impl AclBackend for MemoryAcls {
    fn read(&self, path: &Path) -> Result<AccessControlList, AclError> {
        let key = Self::key(path)?;
        Ok(lock(&self.acls)
            .get(&key)
            .unwrap_or(&self.default_acl)
            .clone())
    }

    fn set(&self, path: &Path, acl: &AccessControlList) -> Result<(), AclError> {
        self.update(path, Recursion::Single, &|_| acl.clone())
    }

    fn append(
        &self,
        path: &Path,
        acl: &AccessControlList,
        recursion: Recursion,
    ) -> Result<(), AclError> {
        self.update(path, recursion, &|current| {
            let mut next = current.clone();
            for entry in acl {
                if !next.contains(entry) {
                    next.push(entry.clone());
                }
            }
            next
        })
    }

    fn unset(
        &self,
        path: &Path,
        acl: &AccessControlList,
        recursion: Recursion,
    ) -> Result<(), AclError> {
        self.update(path, recursion, &|current| current - acl)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lists `path` and, when recursive, everything beneath it without following
/// symlinks.
fn targets(path: &Path, recursion: Recursion) -> Result<Vec<PathBuf>, AclError> {
    let mut found = vec![path.to_path_buf()];
    if !recursion.is_recursive() {
        return Ok(found);
    }
    let mut index = 0;
    while let Some(current) = found.get(index).cloned() {
        index += 1;
        let metadata =
            fs::symlink_metadata(&current).map_err(|error| AclError::io("stat", &current, error))?;
        if metadata.is_dir() {
            let mut children = fs::read_dir(&current)
                .and_then(|entries| {
                    entries
                        .map(|entry| entry.map(|entry| entry.path()))
                        .collect::<io::Result<Vec<_>>>()
                })
                .map_err(|error| AclError::io("list", &current, error))?;
            children.sort();
            found.extend(children);
        }
    }
    Ok(found)
}

/// A temporary directory holding a source tree and a share location.
pub struct Scratch {
    dir: tempfile::TempDir,
}

impl Scratch {
    /// Creates an empty scratch directory.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Canonical path of the scratch directory.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        fs::canonicalize(self.dir.path()).unwrap_or_else(|_| self.dir.path().to_path_buf())
    }

    /// Writes a file, creating parent directories as needed.
    pub fn write_file(&self, relative: &str, contents: &[u8]) -> io::Result<PathBuf> {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Creates a directory and its parents.
    pub fn mkdir(&self, relative: &str) -> io::Result<PathBuf> {
        let path = self.path().join(relative);
        fs::create_dir_all(&path)?;
        Ok(path)
    }
}

/// Current hardlink count of `path`.
#[must_use]
pub fn nlink(path: &Path) -> u64 {
    fs::symlink_metadata(path)
        .unwrap_or_else(|error| panic!("stat {}: {error}", path.display()))
        .nlink()
}
