//! Access control entries and their bit-level building blocks.

use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use crate::AclError;

/// NFSv4 ACE type values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum AceType {
    /// Access allowed (`A`).
    Allow = 0,
    /// Access denied (`D`).
    Deny = 1,
    /// Audit access attempts (`U`).
    Audit = 2,
    /// Trigger an alarm on access (`L`).
    Alarm = 3,
}

impl AceType {
    /// Returns the single-letter code used by `nfs4_getfacl`.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Allow => 'A',
            Self::Deny => 'D',
            Self::Audit => 'U',
            Self::Alarm => 'L',
        }
    }

    fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "A" => Some(Self::Allow),
            "D" => Some(Self::Deny),
            "U" => Some(Self::Audit),
            "L" => Some(Self::Alarm),
            _ => None,
        }
    }
}

/// Maps single-letter codes to bits, in the order they are rendered.
type LetterTable = [(char, u32)];

fn bits_from_letters(text: &str, table: &LetterTable, what: &str) -> Result<u32, AclError> {
    text.chars().try_fold(0, |bits, letter| {
        table
            .iter()
            .find(|(candidate, _)| *candidate == letter)
            .map(|(_, bit)| bits | bit)
            .ok_or_else(|| AclError::parse(text, format!("unknown {what} letter '{letter}'")))
    })
}

fn letters_from_bits(bits: u32, table: &LetterTable) -> String {
    table
        .iter()
        .filter(|(_, bit)| bits & bit != 0)
        .map(|(letter, _)| *letter)
        .collect()
}

/// NFSv4 ACE flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AceFlags(u32);

impl AceFlags {
    /// ACE applies to files in this directory.
    pub const FILE_INHERIT: u32 = 0x0001;
    /// ACE applies to subdirectories.
    pub const DIRECTORY_INHERIT: u32 = 0x0002;
    /// Don't propagate inheritance to children of children.
    pub const NO_PROPAGATE_INHERIT: u32 = 0x0004;
    /// ACE is for inheritance only, doesn't apply to this object.
    pub const INHERIT_ONLY: u32 = 0x0008;
    /// Audit successful accesses.
    pub const SUCCESSFUL_ACCESS: u32 = 0x0010;
    /// Audit failed accesses.
    pub const FAILED_ACCESS: u32 = 0x0020;
    /// Principal is a group.
    pub const IDENTIFIER_GROUP: u32 = 0x0040;
    /// ACE was inherited from parent.
    pub const INHERITED: u32 = 0x0080;

    const LETTERS: [(char, u32); 8] = [
        ('f', Self::FILE_INHERIT),
        ('d', Self::DIRECTORY_INHERIT),
        ('n', Self::NO_PROPAGATE_INHERIT),
        ('i', Self::INHERIT_ONLY),
        ('S', Self::SUCCESSFUL_ACCESS),
        ('F', Self::FAILED_ACCESS),
        ('g', Self::IDENTIFIER_GROUP),
        ('I', Self::INHERITED),
    ];

    /// No flags set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Creates flags from raw value.
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw flags value.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// Checks if a flag is set.
    #[must_use]
    pub const fn contains(self, flag: u32) -> bool {
        (self.0 & flag) != 0
    }

    /// Parses the flag letters of an entry (`fd`, `g`, ...).
    pub fn from_letters(text: &str) -> Result<Self, AclError> {
        bits_from_letters(text, &Self::LETTERS, "flag").map(Self)
    }

    /// Renders the flags as letters.
    #[must_use]
    pub fn letters(self) -> String {
        letters_from_bits(self.0, &Self::LETTERS)
    }
}

/// NFSv4 access mask (permission bits).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AccessMask(u32);

impl AccessMask {
    /// Read data from file / list directory.
    pub const READ_DATA: u32 = 0x0001;
    /// Write data to file / create file in directory.
    pub const WRITE_DATA: u32 = 0x0002;
    /// Append data to file / create subdirectory.
    pub const APPEND_DATA: u32 = 0x0004;
    /// Read named attributes.
    pub const READ_NAMED_ATTRS: u32 = 0x0008;
    /// Write named attributes.
    pub const WRITE_NAMED_ATTRS: u32 = 0x0010;
    /// Execute file / search directory.
    pub const EXECUTE: u32 = 0x0020;
    /// Delete a file within a directory.
    pub const DELETE_CHILD: u32 = 0x0040;
    /// Read file attributes.
    pub const READ_ATTRIBUTES: u32 = 0x0080;
    /// Write file attributes.
    pub const WRITE_ATTRIBUTES: u32 = 0x0100;
    /// Delete the file itself.
    pub const DELETE: u32 = 0x10000;
    /// Read the ACL.
    pub const READ_ACL: u32 = 0x20000;
    /// Write the ACL.
    pub const WRITE_ACL: u32 = 0x40000;
    /// Change owner.
    pub const WRITE_OWNER: u32 = 0x80000;
    /// Synchronize (Windows semantics).
    pub const SYNCHRONIZE: u32 = 0x100000;

    /// Canonical rendering order, matching `nfs4_getfacl` output.
    const LETTERS: [(char, u32); 14] = [
        ('r', Self::READ_DATA),
        ('w', Self::WRITE_DATA),
        ('a', Self::APPEND_DATA),
        ('D', Self::DELETE_CHILD),
        ('d', Self::DELETE),
        ('x', Self::EXECUTE),
        ('t', Self::READ_ATTRIBUTES),
        ('T', Self::WRITE_ATTRIBUTES),
        ('n', Self::READ_NAMED_ATTRS),
        ('N', Self::WRITE_NAMED_ATTRS),
        ('c', Self::READ_ACL),
        ('C', Self::WRITE_ACL),
        ('o', Self::WRITE_OWNER),
        ('y', Self::SYNCHRONIZE),
    ];

    /// Generic read alias accepted by `nfs4_setfacl` (`R`).
    const GENERIC_READ: u32 =
        Self::READ_DATA | Self::READ_NAMED_ATTRS | Self::READ_ATTRIBUTES | Self::READ_ACL | Self::SYNCHRONIZE;
    /// Generic write alias accepted by `nfs4_setfacl` (`W`).
    const GENERIC_WRITE: u32 = Self::WRITE_DATA
        | Self::APPEND_DATA
        | Self::WRITE_ATTRIBUTES
        | Self::WRITE_NAMED_ATTRS
        | Self::READ_ACL
        | Self::SYNCHRONIZE;
    /// Generic execute alias accepted by `nfs4_setfacl` (`X`).
    const GENERIC_EXECUTE: u32 =
        Self::EXECUTE | Self::READ_ATTRIBUTES | Self::READ_ACL | Self::SYNCHRONIZE;

    /// No permissions.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Creates a mask from raw value.
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw mask value.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// Checks whether every bit of `bits` is set.
    #[must_use]
    pub const fn contains(self, bits: u32) -> bool {
        (self.0 & bits) == bits
    }

    /// Parses permission letters in any order. The generic aliases `R`, `W`
    /// and `X` expand to their constituent bits.
    pub fn from_letters(text: &str) -> Result<Self, AclError> {
        let mut table = Self::LETTERS.to_vec();
        table.extend([
            ('R', Self::GENERIC_READ),
            ('W', Self::GENERIC_WRITE),
            ('X', Self::GENERIC_EXECUTE),
        ]);
        bits_from_letters(text, &table, "permission").map(Self)
    }

    /// Renders the mask in canonical letter order.
    #[must_use]
    pub fn letters(self) -> String {
        letters_from_bits(self.0, &Self::LETTERS)
    }
}

impl BitOr for AccessMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

const SPECIAL_PRINCIPALS: [&str; 3] = ["OWNER", "GROUP", "EVERYONE"];

/// A single NFSv4 Access Control Entry.
///
/// Two entries are equal when type, flags, principal and the *set* of
/// permission bits match; letter order in the source text is irrelevant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessControlEntry {
    /// Type of ACE (allow/deny/audit/alarm).
    pub entry_type: AceType,
    /// ACE flags (inheritance, etc.).
    pub flags: AceFlags,
    /// User or group name, or one of `OWNER`, `GROUP`, `EVERYONE`.
    pub identity: String,
    /// NFSv4 id-mapping domain, empty for special principals.
    pub domain: String,
    /// Access mask (permissions).
    pub permissions: AccessMask,
}

impl AccessControlEntry {
    /// Creates an entry from its parts.
    pub fn new(
        entry_type: AceType,
        flags: AceFlags,
        identity: impl Into<String>,
        domain: impl Into<String>,
        permissions: AccessMask,
    ) -> Self {
        Self {
            entry_type,
            flags,
            identity: identity.into(),
            domain: domain.into(),
            permissions,
        }
    }

    /// Renders the principal field (`EVERYONE@`, `alice@example.com`).
    #[must_use]
    pub fn principal(&self) -> String {
        if !self.domain.is_empty() {
            format!("{}@{}", self.identity, self.domain)
        } else if SPECIAL_PRINCIPALS.contains(&self.identity.as_str()) {
            format!("{}@", self.identity)
        } else {
            self.identity.clone()
        }
    }
}

impl fmt::Display for AccessControlEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.entry_type.letter(),
            self.flags.letters(),
            self.principal(),
            self.permissions.letters()
        )
    }
}

impl FromStr for AccessControlEntry {
    type Err = AclError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        let fields: Vec<&str> = trimmed.splitn(4, ':').collect();
        let [entry_type, flags, principal, permissions] = fields.as_slice() else {
            return Err(AclError::parse(trimmed, "expected type:flags:principal:permissions"));
        };

        let entry_type = AceType::from_letter(entry_type)
            .ok_or_else(|| AclError::parse(trimmed, format!("unknown entry type '{entry_type}'")))?;
        if principal.is_empty() {
            return Err(AclError::parse(trimmed, "empty principal"));
        }
        let (identity, domain) = principal.rsplit_once('@').unwrap_or((*principal, ""));

        Ok(Self {
            entry_type,
            flags: AceFlags::from_letters(flags)?,
            identity: identity.to_owned(),
            domain: domain.to_owned(),
            permissions: AccessMask::from_letters(permissions)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_special_principal_entry() {
        let entry: AccessControlEntry = "D::EVERYONE@:wadNTo".parse().unwrap();
        assert_eq!(entry.entry_type, AceType::Deny);
        assert_eq!(entry.flags, AceFlags::empty());
        assert_eq!(entry.identity, "EVERYONE");
        assert_eq!(entry.domain, "");
        assert!(entry.permissions.contains(
            AccessMask::WRITE_DATA
                | AccessMask::APPEND_DATA
                | AccessMask::DELETE
                | AccessMask::WRITE_NAMED_ATTRS
                | AccessMask::WRITE_ATTRIBUTES
                | AccessMask::WRITE_OWNER
        ));
        assert_eq!(entry.to_string(), "D::EVERYONE@:wadTNo");
    }

    #[test]
    fn parses_domain_principal_with_flags() {
        let entry: AccessControlEntry = "A:fdg:staff@example.com:rxtncy".parse().unwrap();
        assert_eq!(entry.identity, "staff");
        assert_eq!(entry.domain, "example.com");
        assert!(entry.flags.contains(AceFlags::FILE_INHERIT));
        assert!(entry.flags.contains(AceFlags::DIRECTORY_INHERIT));
        assert!(entry.flags.contains(AceFlags::IDENTIFIER_GROUP));
        assert_eq!(entry.principal(), "staff@example.com");
        assert_eq!(entry.to_string(), "A:fdg:staff@example.com:rxtncy");
    }

    #[test]
    fn numeric_principal_renders_bare() {
        let entry: AccessControlEntry = "A::1000:r".parse().unwrap();
        assert_eq!(entry.identity, "1000");
        assert_eq!(entry.principal(), "1000");
    }

    #[test]
    fn permission_letter_order_does_not_affect_equality() {
        let left: AccessControlEntry = "D::EVERYONE@:wadNTo".parse().unwrap();
        let right: AccessControlEntry = "D::EVERYONE@:oTNdaw".parse().unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn generic_aliases_expand() {
        let mask = AccessMask::from_letters("RX").unwrap();
        assert_eq!(mask.letters(), "rxtncy");
    }

    #[test]
    fn rejects_malformed_entries() {
        for text in ["", "A::OWNER@", "Q::OWNER@:r", "A::OWNER@:rq", "A:z:OWNER@:r", "A:::r"] {
            assert!(
                text.parse::<AccessControlEntry>().is_err(),
                "'{text}' should not parse"
            );
        }
    }

    #[test]
    fn ace_type_letters_round_trip() {
        for ace_type in [AceType::Allow, AceType::Deny, AceType::Audit, AceType::Alarm] {
            let letter = ace_type.letter().to_string();
            assert_eq!(AceType::from_letter(&letter), Some(ace_type));
        }
        assert_eq!(AceType::from_letter("X"), None);
    }
}
