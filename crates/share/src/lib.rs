#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `share` maintains share directories: directories on an NFSv4 filesystem
//! that present files and whole trees from elsewhere on the same filesystem
//! as hard links, with access granted through NFSv4 ACLs instead of copies.
//!
//! The share directory's own ACL is the share's *ambient permissions*. Every
//! directory created inside the share gets that ACL, and every linked file
//! has it appended. Un-sharing a file subtracts the ambient entries again
//! before the link is removed, so the original file ends up with the ACL it
//! had before it was shared.
//!
//! # Lifecycle
//!
//! - [`Share::open`] (or [`ShareBuilder`]) binds to a directory, creating it
//!   when absent.
//! - [`Share::add`] links files under their base name and mirrors
//!   directories as trees of links. Re-adding replaces stale entries.
//! - [`Share::lock`] and [`Share::unlock`] layer a deny-everyone entry
//!   (`D::EVERYONE@:wadTNo`) over the whole share.
//! - [`Share::self_destruct`] un-shares everything and removes the
//!   directory. Files whose only remaining link lives in the share are kept
//!   unless removal is forced.
//!
//! Nothing is cached between calls; all state is on disk.
//!
//! # Examples
//!
//! ```no_run
//! use share::Share;
//!
//! let share = Share::open("/srv/nfs/projects-for-alice", true)?;
//! let report = share.add(["/srv/nfs/projects/report.pdf", "/srv/nfs/projects/data"])?;
//! for problem in report.problems() {
//!     eprintln!("{problem}");
//! }
//! share.lock()?;
//! # Ok::<(), share::ShareError>(())
//! ```

mod error;
mod guard;
mod mirror;
mod report;
mod share;
mod unshare;

pub use error::ShareError;
pub use guard::{FsLinkCounter, LinkCounter, RemovalCheck};
pub use report::{AddReport, ShareEvent};
pub use share::{LOCK_PERMISSIONS, Share, ShareBuilder, lock_entry};
