use std::fmt;
use std::ops::Sub;
use std::path::Path;
use std::slice;
use std::str::FromStr;

use crate::{AccessControlEntry, AclBackend, AclError, Recursion};

/// An ordered NFSv4 Access Control List.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessControlList {
    entries: Vec<AccessControlEntry>,
}

impl AccessControlList {
    /// Creates an empty ACL.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Returns the entries in evaluation order.
    #[must_use]
    pub fn entries(&self) -> &[AccessControlEntry] {
        &self.entries
    }

    /// Iterates over the entries in evaluation order.
    pub fn iter(&self) -> slice::Iter<'_, AccessControlEntry> {
        self.entries.iter()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the ACL has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reports whether an equal entry is present.
    #[must_use]
    pub fn contains(&self, entry: &AccessControlEntry) -> bool {
        self.entries.contains(entry)
    }

    /// Appends an entry at the end of the list.
    pub fn push(&mut self, entry: AccessControlEntry) {
        self.entries.push(entry);
    }

    /// Keeps, in order, every entry that has no equal entry in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        self.entries
            .iter()
            .filter(|entry| !other.contains(entry))
            .cloned()
            .collect()
    }

    /// Renders the comma-separated spec accepted by `nfs4_setfacl`.
    #[must_use]
    pub fn to_spec(&self) -> String {
        self.entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Reads the current ACL of `path`.
    pub fn from_file<B: AclBackend + ?Sized>(backend: &B, path: &Path) -> Result<Self, AclError> {
        backend.read(path)
    }

    /// Replaces the ACL of `path` with this list. An empty list is rejected,
    /// since it would leave the path without any entry.
    pub fn set<B: AclBackend + ?Sized>(&self, backend: &B, path: &Path) -> Result<(), AclError> {
        if self.is_empty() {
            return Err(AclError::EmptyAcl {
                path: path.to_path_buf(),
            });
        }
        backend.set(path, self)
    }

    /// Adds these entries to the ACL of `path`; a no-op for an empty list.
    pub fn append<B: AclBackend + ?Sized>(
        &self,
        backend: &B,
        path: &Path,
        recursion: Recursion,
    ) -> Result<(), AclError> {
        if self.is_empty() {
            return Ok(());
        }
        backend.append(path, self, recursion)
    }

    /// Removes these entries from the ACL of `path`; a no-op for an empty list.
    pub fn unset<B: AclBackend + ?Sized>(
        &self,
        backend: &B,
        path: &Path,
        recursion: Recursion,
    ) -> Result<(), AclError> {
        if self.is_empty() {
            return Ok(());
        }
        backend.unset(path, self, recursion)
    }
}

impl From<Vec<AccessControlEntry>> for AccessControlList {
    fn from(entries: Vec<AccessControlEntry>) -> Self {
        Self { entries }
    }
}

impl FromIterator<AccessControlEntry> for AccessControlList {
    fn from_iter<I: IntoIterator<Item = AccessControlEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a AccessControlList {
    type Item = &'a AccessControlEntry;
    type IntoIter = slice::Iter<'a, AccessControlEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Sub for &AccessControlList {
    type Output = AccessControlList;

    fn sub(self, rhs: Self) -> AccessControlList {
        self.difference(rhs)
    }
}

impl Sub for AccessControlList {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.difference(&rhs)
    }
}

impl Sub<&AccessControlList> for AccessControlList {
    type Output = Self;

    fn sub(self, rhs: &Self) -> Self {
        self.difference(rhs)
    }
}

/// Parses `nfs4_getfacl` output: one entry per line, `#` comments and blank
/// lines ignored. Entries may also be separated by commas, as in a
/// `nfs4_setfacl` spec.
impl FromStr for AccessControlList {
    type Err = AclError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .flat_map(|line| line.split(','))
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::parse::<AccessControlEntry>)
            .collect()
    }
}

/// Renders one entry per line, the way `nfs4_getfacl` prints them.
impl fmt::Display for AccessControlList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, entry) in self.entries.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AccessMask, AceFlags, AceType};

    const GETFACL_OUTPUT: &str = "\
# file: /srv/share/report.txt
A::OWNER@:rwatTnNcCy
A:g:GROUP@:rtncy
A::alice@example.com:rwatTnNcCy

A::EVERYONE@:rtncy
";

    #[test]
    fn parses_getfacl_output_skipping_comments() {
        let acl: AccessControlList = GETFACL_OUTPUT.parse().unwrap();
        assert_eq!(acl.len(), 4);
        assert_eq!(acl.entries()[2].identity, "alice");
        assert_eq!(acl.entries()[1].flags, AceFlags::from_raw(AceFlags::IDENTIFIER_GROUP));
    }

    #[test]
    fn display_matches_getfacl_lines() {
        let acl: AccessControlList = GETFACL_OUTPUT.parse().unwrap();
        let rendered = acl.to_string();
        assert_eq!(rendered.lines().count(), 4);
        assert_eq!(rendered.parse::<AccessControlList>().unwrap(), acl);
    }

    #[test]
    fn spec_is_comma_joined_and_parses_back() {
        let acl: AccessControlList = GETFACL_OUTPUT.parse().unwrap();
        let spec = acl.to_spec();
        assert_eq!(spec.matches(',').count(), 3);
        assert_eq!(spec.parse::<AccessControlList>().unwrap(), acl);
    }

    #[test]
    fn difference_keeps_order_and_removes_equal_entries() {
        let acl: AccessControlList = GETFACL_OUTPUT.parse().unwrap();
        let ambient: AccessControlList = "A::alice@example.com:yCcNnTtawr\nA::nobody@:r"
            .parse()
            .unwrap();

        let restored = &acl - &ambient;
        let identities: Vec<_> = restored.iter().map(|e| e.identity.as_str()).collect();
        assert_eq!(identities, ["OWNER", "GROUP", "EVERYONE"]);
    }

    #[test]
    fn difference_requires_matching_permissions() {
        let acl: AccessControlList = "A::alice@example.com:rwx".parse().unwrap();
        let other: AccessControlList = "A::alice@example.com:r".parse().unwrap();
        assert_eq!(acl.clone() - other, acl);
    }

    #[test]
    fn empty_input_yields_empty_list() {
        let acl: AccessControlList = "# file: /x\n\n".parse().unwrap();
        assert!(acl.is_empty());
        assert_eq!(acl.to_spec(), "");
        assert_eq!(acl.to_string(), "");
    }

    #[test]
    fn bad_line_is_reported() {
        let error = "A::OWNER@:rw\nbogus".parse::<AccessControlList>().unwrap_err();
        assert!(matches!(error, AclError::Parse { ref text, .. } if text == "bogus"));
    }

    #[test]
    fn collects_from_entries() {
        let entry = AccessControlEntry::new(
            AceType::Deny,
            AceFlags::empty(),
            "EVERYONE",
            "",
            AccessMask::from_raw(AccessMask::WRITE_DATA),
        );
        let acl: AccessControlList = std::iter::once(entry.clone()).collect();
        assert!(acl.contains(&entry));
        assert_eq!(acl.to_spec(), "D::EVERYONE@:w");
    }
}
