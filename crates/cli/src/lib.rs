#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` implements the `nfs4-share` command:
//!
//! ```text
//! nfs4-share [-v]... [--getfacl PATH] [--setfacl PATH] <SHARE> <COMMAND>
//! ```
//!
//! with the commands `create [--exist-ok]`, `add <ITEM>...`, `lock`,
//! `unlock`, `show` and `destroy [--force]`.
//!
//! # Design
//!
//! [`run`] accepts an iterator of arguments together with handles for
//! standard output and error and returns the process exit code, so the whole
//! front-end can be driven from tests. Diagnostics from the share engine go
//! through `tracing` to the process's stderr; results and errors are written
//! to the supplied handles.
//!
//! # Exit codes
//!
//! - `0`: success.
//! - `1`: invalid usage or a failed operation.
//! - `2`: `add` finished but skipped or could not link some items.
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let exit_code = cli::run(["nfs4-share", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(exit_code, 0);
//! assert!(String::from_utf8_lossy(&stdout).contains("nfs4-share"));
//! ```

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};

use acl::Nfs4AclTool;
use clap::error::ErrorKind;
use share::{Share, ShareBuilder, ShareError};
use tracing::debug;

mod arguments;
mod logging;

pub use arguments::{Action, PROGRAM_NAME, ParsedArgs, parse_args};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for usage errors and failed operations.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for an `add` that skipped some items.
pub const EXIT_PARTIAL: i32 = 2;

/// Runs the CLI using the provided argument iterator and output handles.
///
/// The function returns the process exit code that should be used by the
/// caller.
#[allow(clippy::module_name_repetitions)]
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
    Out: Write,
    Err: Write,
{
    let parsed = match parse_args(arguments) {
        Ok(parsed) => parsed,
        Err(error) => return report_usage(&error, stdout, stderr),
    };

    logging::init_tracing(parsed.verbosity);

    match execute(&parsed, stdout, stderr) {
        Ok(code) => code,
        Err(error) => {
            report_error(&error, stderr);
            EXIT_FAILURE
        }
    }
}

fn report_usage<Out: Write, Err: Write>(
    error: &clap::Error,
    stdout: &mut Out,
    stderr: &mut Err,
) -> i32 {
    let rendered = error.render();
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            if write!(stdout, "{rendered}").is_err() {
                return EXIT_FAILURE;
            }
            EXIT_SUCCESS
        }
        _ => {
            let _ = write!(stderr, "{rendered}");
            EXIT_FAILURE
        }
    }
}

fn report_error<Err: Write>(error: &ShareError, stderr: &mut Err) {
    let _ = writeln!(stderr, "{PROGRAM_NAME}: {error}");
    if let ShareError::Retained { paths } = error {
        for path in paths {
            let _ = writeln!(stderr, "{PROGRAM_NAME}: kept {}", path.display());
        }
    }
}

fn open_share(parsed: &ParsedArgs, exist_ok: bool) -> Result<Share<Nfs4AclTool>, ShareError> {
    ShareBuilder::new(&parsed.share)
        .exist_ok(exist_ok)
        .acl_backend(Nfs4AclTool::new(&parsed.getfacl, &parsed.setfacl))
        .open()
}

/// Opens a share that must already exist.
fn open_existing(parsed: &ParsedArgs) -> Result<Share<Nfs4AclTool>, ShareError> {
    match fs::symlink_metadata(&parsed.share) {
        Ok(_) => open_share(parsed, true),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Err(ShareError::Io {
            context: "open share directory",
            path: parsed.share.clone(),
            source: error,
        }),
        Err(error) => Err(ShareError::Io {
            context: "inspect",
            path: parsed.share.clone(),
            source: error,
        }),
    }
}

fn execute<Out: Write, Err: Write>(
    parsed: &ParsedArgs,
    stdout: &mut Out,
    stderr: &mut Err,
) -> Result<i32, ShareError> {
    debug!(target: "cli", share = %parsed.share.display(), action = ?parsed.action, "executing");
    match &parsed.action {
        Action::Create { exist_ok } => {
            let share = open_share(parsed, *exist_ok)?;
            let _ = writeln!(stdout, "{}", share.directory().display());
            Ok(EXIT_SUCCESS)
        }
        Action::Add { items } => {
            let share = open_existing(parsed)?;
            let report = share.add(items)?;
            for event in report.events() {
                if event.is_problem() {
                    let _ = writeln!(stderr, "{PROGRAM_NAME}: {event}");
                } else {
                    let _ = writeln!(stdout, "{event}");
                }
            }
            Ok(if report.has_problems() {
                EXIT_PARTIAL
            } else {
                EXIT_SUCCESS
            })
        }
        Action::Lock => {
            open_existing(parsed)?.lock()?;
            Ok(EXIT_SUCCESS)
        }
        Action::Unlock => {
            open_existing(parsed)?.unlock()?;
            Ok(EXIT_SUCCESS)
        }
        Action::Show => {
            let permissions = open_existing(parsed)?.permissions()?;
            if !permissions.is_empty() {
                let _ = writeln!(stdout, "{permissions}");
            }
            Ok(EXIT_SUCCESS)
        }
        Action::Destroy { force } => {
            let share = open_existing(parsed)?;
            share.unlock()?;
            share.self_destruct(*force)?;
            Ok(EXIT_SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests;
