use std::path::Path;

use crate::{AccessControlList, AclError};

/// Whether an ACL change applies to a single path or to a whole tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Recursion {
    /// Only the named path.
    #[default]
    Single,
    /// The named path and everything beneath it.
    Recursive,
}

impl Recursion {
    /// Reports whether the change descends into directories.
    #[must_use]
    pub const fn is_recursive(self) -> bool {
        matches!(self, Self::Recursive)
    }
}

/// Reads and writes NFSv4 ACLs on filesystem paths.
///
/// Implementations never cache: every [`read`](Self::read) reflects the
/// current on-disk state.
pub trait AclBackend {
    /// Reads the current ACL of `path`.
    fn read(&self, path: &Path) -> Result<AccessControlList, AclError>;

    /// Replaces the ACL of `path` with `acl`.
    fn set(&self, path: &Path, acl: &AccessControlList) -> Result<(), AclError>;

    /// Adds the entries of `acl` to the ACL of `path`.
    fn append(
        &self,
        path: &Path,
        acl: &AccessControlList,
        recursion: Recursion,
    ) -> Result<(), AclError>;

    /// Removes the entries of `acl` from the ACL of `path`.
    fn unset(
        &self,
        path: &Path,
        acl: &AccessControlList,
        recursion: Recursion,
    ) -> Result<(), AclError>;
}

impl<B: AclBackend + ?Sized> AclBackend for &B {
    fn read(&self, path: &Path) -> Result<AccessControlList, AclError> {
        (**self).read(path)
    }

    fn set(&self, path: &Path, acl: &AccessControlList) -> Result<(), AclError> {
        (**self).set(path, acl)
    }

    fn append(
        &self,
        path: &Path,
        acl: &AccessControlList,
        recursion: Recursion,
    ) -> Result<(), AclError> {
        (**self).append(path, acl, recursion)
    }

    fn unset(
        &self,
        path: &Path,
        acl: &AccessControlList,
        recursion: Recursion,
    ) -> Result<(), AclError> {
        (**self).unset(path, acl, recursion)
    }
}
