#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `walk` provides the deterministic filesystem traversal used by the share
//! engine. Mirroring a source tree needs a top-down pass (directories before
//! the files they contain) while tearing a mirror down needs a bottom-up pass
//! (contents before the directory holding them). Both are served by the same
//! [`Walker`], selected through [`WalkOrder`].
//!
//! # Design
//!
//! - [`WalkBuilder`] configures the root, the [`WalkOrder`], whether the root
//!   entry is emitted and whether directory symlinks are followed.
//! - [`Walker`] implements [`Iterator`] and yields [`WalkEntry`] values
//!   depth-first. Directory contents are sorted by name before they are
//!   yielded, so the sequence does not depend on the filesystem's own order.
//! - [`WalkError`] describes I/O failures together with the offending path.
//!
//! # Invariants
//!
//! - Returned relative paths never contain `..` segments.
//! - A directory is never entered from inside itself. When symlink following
//!   is enabled the canonical paths of the directories being walked are
//!   tracked, so a link back to an ancestor is yielded but not descended.
//!   A directory reachable both directly and through a sibling symlink is
//!   walked under both paths.
//! - In [`WalkOrder::PostOrder`] every entry below a directory is yielded
//!   before the directory itself, and the root comes last.
//! - A dangling symlink is yielded as a symlink entry without resolved
//!   metadata instead of terminating traversal.
//!
//! # Examples
//!
//! ```
//! use walk::{WalkBuilder, WalkOrder};
//! use std::fs;
//! use std::path::PathBuf;
//!
//! # fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let temp = tempfile::tempdir()?;
//! let root = temp.path().join("src");
//! fs::create_dir_all(root.join("nested"))?;
//! fs::write(root.join("nested/more.txt"), b"data")?;
//!
//! let walker = WalkBuilder::new(&root).order(WalkOrder::PostOrder).build()?;
//! let mut seen = Vec::new();
//! for entry in walker {
//!     seen.push(entry?.relative_path().to_path_buf());
//! }
//!
//! assert_eq!(
//!     seen,
//!     vec![PathBuf::from("nested/more.txt"), PathBuf::from("nested"), PathBuf::new()]
//! );
//! # Ok(())
//! # }
//! # demo().unwrap();
//! ```

mod builder;
mod entry;
mod error;
mod walker;

pub use builder::{WalkBuilder, WalkOrder};
pub use entry::WalkEntry;
pub use error::{WalkError, WalkErrorKind};
pub use walker::Walker;
