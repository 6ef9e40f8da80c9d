use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use acl::{
    AccessControlEntry, AccessControlList, AccessMask, AceFlags, AceType, AclBackend,
    Nfs4AclTool, Recursion,
};
use tracing::debug;

use crate::ShareError;
use crate::guard::{FsLinkCounter, LinkCounter};

/// Permissions denied to everyone while a share is locked: write data,
/// append data, delete, write named attributes, write attributes and change
/// owner (`wadNTo`).
pub const LOCK_PERMISSIONS: u32 = AccessMask::WRITE_DATA
    | AccessMask::APPEND_DATA
    | AccessMask::DELETE
    | AccessMask::WRITE_NAMED_ATTRS
    | AccessMask::WRITE_ATTRIBUTES
    | AccessMask::WRITE_OWNER;

/// The deny-everyone entry layered over a locked share.
#[must_use]
pub fn lock_entry() -> AccessControlEntry {
    AccessControlEntry::new(
        AceType::Deny,
        AceFlags::empty(),
        "EVERYONE",
        "",
        AccessMask::from_raw(LOCK_PERMISSIONS),
    )
}

/// A directory presenting hardlinked, ACL-controlled copies of files and
/// trees from elsewhere on the same filesystem.
///
/// All state lives on disk: opening the same directory again yields an
/// equivalent `Share`, and ACLs are re-read for every operation.
#[derive(Debug)]
pub struct Share<A = Nfs4AclTool, L = FsLinkCounter> {
    pub(crate) directory: PathBuf,
    pub(crate) lock_acl: AccessControlList,
    pub(crate) acls: A,
    pub(crate) links: L,
}

impl Share {
    /// Opens or creates the share at `directory` using the NFSv4 ACL tools.
    ///
    /// Fails with [`ShareError::IllegalSetup`] when the path is a plain file,
    /// and with [`ShareError::AlreadyExists`] when it exists and `exist_ok`
    /// is false.
    pub fn open(directory: impl Into<PathBuf>, exist_ok: bool) -> Result<Self, ShareError> {
        ShareBuilder::new(directory).exist_ok(exist_ok).open()
    }
}

impl<A: AclBackend, L: LinkCounter> Share<A, L> {
    /// Canonical path of the share directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The single-entry list applied by [`lock`](Self::lock).
    #[must_use]
    pub fn lock_acl(&self) -> &AccessControlList {
        &self.lock_acl
    }

    /// The ACL backend in use.
    #[must_use]
    pub fn acl_backend(&self) -> &A {
        &self.acls
    }

    /// The ambient permissions: the share directory's current ACL, applied to
    /// every entry created inside the share.
    pub fn permissions(&self) -> Result<AccessControlList, ShareError> {
        Ok(AccessControlList::from_file(&self.acls, &self.directory)?)
    }

    /// Replaces the share directory's ACL, and with it the ambient
    /// permissions for entries added from now on.
    pub fn set_permissions(&self, acl: &AccessControlList) -> Result<(), ShareError> {
        debug!(target: "share::acl", directory = %self.directory.display(), acl = %acl.to_spec(), "setting permissions");
        acl.set(&self.acls, &self.directory)?;
        Ok(())
    }

    /// Denies structural changes to everyone by appending the lock entry to
    /// the share directory and everything beneath it.
    pub fn lock(&self) -> Result<(), ShareError> {
        debug!(target: "share::lock", directory = %self.directory.display(), "locking recursively");
        self.lock_acl
            .append(&self.acls, &self.directory, Recursion::Recursive)?;
        Ok(())
    }

    /// Removes the lock entry from the share directory and everything
    /// beneath it.
    pub fn unlock(&self) -> Result<(), ShareError> {
        debug!(target: "share::lock", directory = %self.directory.display(), "unlocking recursively");
        self.lock_acl
            .unset(&self.acls, &self.directory, Recursion::Recursive)?;
        Ok(())
    }
}

impl<A, L> fmt::Display for Share<A, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .directory
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        write!(f, "Share({name:?})")
    }
}

/// Configures how a [`Share`] is opened.
#[derive(Debug, Clone)]
pub struct ShareBuilder<A = Nfs4AclTool, L = FsLinkCounter> {
    directory: PathBuf,
    exist_ok: bool,
    acls: A,
    links: L,
}

impl ShareBuilder {
    /// Starts configuring the share at `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            exist_ok: false,
            acls: Nfs4AclTool::default(),
            links: FsLinkCounter,
        }
    }
}

impl<A, L> ShareBuilder<A, L> {
    /// Accepts an existing share directory instead of failing.
    #[must_use]
    pub fn exist_ok(mut self, exist_ok: bool) -> Self {
        self.exist_ok = exist_ok;
        self
    }

    /// Uses `acls` to read and write ACLs.
    pub fn acl_backend<B: AclBackend>(self, acls: B) -> ShareBuilder<B, L> {
        ShareBuilder {
            directory: self.directory,
            exist_ok: self.exist_ok,
            acls,
            links: self.links,
        }
    }

    /// Uses `links` to count hard links before removing files.
    pub fn link_counter<C: LinkCounter>(self, links: C) -> ShareBuilder<A, C> {
        ShareBuilder {
            directory: self.directory,
            exist_ok: self.exist_ok,
            acls: self.acls,
            links,
        }
    }

    /// Creates the share directory if needed and binds a [`Share`] to it.
    /// Nothing is written to ACLs.
    pub fn open(self) -> Result<Share<A, L>, ShareError>
    where
        A: AclBackend,
        L: LinkCounter,
    {
        let requested = self.directory;
        match fs::metadata(&requested) {
            Ok(metadata) if metadata.is_file() => {
                return Err(ShareError::IllegalSetup { path: requested });
            }
            Ok(metadata) => {
                debug!(target: "share::open", path = %requested.display(), "share path exists");
                if !(self.exist_ok && metadata.is_dir()) {
                    return Err(ShareError::AlreadyExists { path: requested });
                }
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&requested)
                    .map_err(|error| ShareError::io("create share directory", &requested, error))?;
            }
            Err(error) => return Err(ShareError::io("inspect", &requested, error)),
        }

        let directory = fs::canonicalize(&requested)
            .map_err(|error| ShareError::io("resolve", &requested, error))?;

        Ok(Share {
            directory,
            lock_acl: AccessControlList::from(vec![lock_entry()]),
            acls: self.acls,
            links: self.links,
        })
    }
}
