#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `acl` models NFSv4 access control lists the way the `nfs4-acl-tools`
//! utilities present them, and applies them to paths through a pluggable
//! [`AclBackend`].
//!
//! NFSv4 ACLs differ significantly from POSIX ACLs:
//!
//! - **ACE-based model**: each Access Control Entry (ACE) allows or denies a
//!   set of permissions to one principal (user, group, or a special
//!   identifier such as `EVERYONE@`).
//! - **Granular permissions**: 14 distinct permission bits instead of `rwx`.
//! - **Order matters**: ACEs are evaluated in order; the first match wins.
//!
//! # Text format
//!
//! `nfs4_getfacl` prints one entry per line as
//! `type:flags:principal:permissions`, for example `D::EVERYONE@:wadTNo`.
//! [`AccessControlList`] parses that output and renders the comma-joined
//! spec accepted by `nfs4_setfacl`.
//!
//! # Examples
//!
//! ```
//! use acl::{AccessControlEntry, AccessControlList};
//!
//! let current: AccessControlList = "A::OWNER@:rwatTnNcCy\nA::alice@example.com:rxtncy"
//!     .parse()
//!     .unwrap();
//! let ambient: AccessControlList = "A::alice@example.com:rtxcny".parse().unwrap();
//!
//! let restored = &current - &ambient;
//! assert_eq!(restored.len(), 1);
//! assert_eq!(restored.to_spec(), "A::OWNER@:rwatTnNcCy");
//! ```

mod backend;
mod entry;
mod error;
mod list;
mod tool;

pub use backend::{AclBackend, Recursion};
pub use entry::{AccessControlEntry, AccessMask, AceFlags, AceType};
pub use error::AclError;
pub use list::AccessControlList;
pub use tool::{DEFAULT_GETFACL, DEFAULT_SETFACL, Nfs4AclTool};
