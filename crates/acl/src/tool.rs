//! Backend driving the `nfs4-acl-tools` command line utilities.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

use crate::{AccessControlList, AclBackend, AclError, Recursion};

/// Default location of `nfs4_getfacl`.
pub const DEFAULT_GETFACL: &str = "/usr/bin/nfs4_getfacl";
/// Default location of `nfs4_setfacl`.
pub const DEFAULT_SETFACL: &str = "/usr/bin/nfs4_setfacl";

/// `nfs4_setfacl` action selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetAction {
    Replace,
    Add,
    Remove,
}

impl SetAction {
    const fn flag(self) -> &'static str {
        match self {
            Self::Replace => "-s",
            Self::Add => "-a",
            Self::Remove => "-x",
        }
    }
}

/// [`AclBackend`] running `nfs4_getfacl` and `nfs4_setfacl`.
///
/// Only works on an NFSv4 mount; other filesystems make the tools fail,
/// which surfaces as [`AclError::Tool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nfs4AclTool {
    getfacl: PathBuf,
    setfacl: PathBuf,
}

impl Default for Nfs4AclTool {
    fn default() -> Self {
        Self::new(DEFAULT_GETFACL, DEFAULT_SETFACL)
    }
}

impl Nfs4AclTool {
    /// Uses the given program locations.
    pub fn new(getfacl: impl Into<PathBuf>, setfacl: impl Into<PathBuf>) -> Self {
        Self {
            getfacl: getfacl.into(),
            setfacl: setfacl.into(),
        }
    }

    /// Location of `nfs4_getfacl`.
    #[must_use]
    pub fn getfacl(&self) -> &Path {
        &self.getfacl
    }

    /// Location of `nfs4_setfacl`.
    #[must_use]
    pub fn setfacl(&self) -> &Path {
        &self.setfacl
    }

    fn run(&self, program: &Path, arguments: Vec<OsString>, path: &Path) -> Result<Output, AclError> {
        debug!(target: "acl::tool", program = %program.display(), ?arguments, path = %path.display(), "running ACL tool");
        let output = Command::new(program)
            .args(arguments)
            .arg(path)
            .output()
            .map_err(|error| AclError::io("run ACL tool on", path, error))?;

        if output.status.success() {
            Ok(output)
        } else {
            Err(AclError::Tool {
                program: program.to_path_buf(),
                path: path.to_path_buf(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            })
        }
    }

    fn modify(
        &self,
        action: SetAction,
        path: &Path,
        acl: &AccessControlList,
        recursion: Recursion,
    ) -> Result<(), AclError> {
        self.run(&self.setfacl, setfacl_arguments(action, acl, recursion), path)
            .map(drop)
    }
}

fn setfacl_arguments(
    action: SetAction,
    acl: &AccessControlList,
    recursion: Recursion,
) -> Vec<OsString> {
    let mut arguments = Vec::with_capacity(3);
    if recursion.is_recursive() {
        arguments.push(OsString::from("-R"));
    }
    arguments.push(OsString::from(action.flag()));
    arguments.push(OsString::from(acl.to_spec()));
    arguments
}

impl AclBackend for Nfs4AclTool {
    fn read(&self, path: &Path) -> Result<AccessControlList, AclError> {
        let output = self.run(&self.getfacl, Vec::new(), path)?;
        String::from_utf8_lossy(&output.stdout).parse()
    }

    fn set(&self, path: &Path, acl: &AccessControlList) -> Result<(), AclError> {
        self.modify(SetAction::Replace, path, acl, Recursion::Single)
    }

    fn append(
        &self,
        path: &Path,
        acl: &AccessControlList,
        recursion: Recursion,
    ) -> Result<(), AclError> {
        self.modify(SetAction::Add, path, acl, recursion)
    }

    fn unset(
        &self,
        path: &Path,
        acl: &AccessControlList,
        recursion: Recursion,
    ) -> Result<(), AclError> {
        self.modify(SetAction::Remove, path, acl, recursion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn lock_list() -> AccessControlList {
        "D::EVERYONE@:wadNTo".parse().unwrap()
    }

    fn os(arguments: &[&str]) -> Vec<OsString> {
        arguments.iter().map(OsString::from).collect()
    }

    #[test]
    fn setfacl_arguments_for_recursive_add() {
        let arguments = setfacl_arguments(SetAction::Add, &lock_list(), Recursion::Recursive);
        assert_eq!(arguments, os(&["-R", "-a", "D::EVERYONE@:wadTNo"]));
    }

    #[test]
    fn setfacl_arguments_for_single_replace_and_remove() {
        let replace = setfacl_arguments(SetAction::Replace, &lock_list(), Recursion::Single);
        assert_eq!(replace, os(&["-s", "D::EVERYONE@:wadTNo"]));
        let remove = setfacl_arguments(SetAction::Remove, &lock_list(), Recursion::Single);
        assert_eq!(remove, os(&["-x", "D::EVERYONE@:wadTNo"]));
    }

    #[test]
    fn default_programs_are_nfs4_acl_tools() {
        let tool = Nfs4AclTool::default();
        assert_eq!(tool.getfacl(), Path::new(DEFAULT_GETFACL));
        assert_eq!(tool.setfacl(), Path::new(DEFAULT_SETFACL));
    }

    #[cfg(unix)]
    #[test]
    fn read_parses_program_output() {
        let temp = tempfile::tempdir().expect("tempdir");
        let listing = temp.path().join("listing");
        fs::write(&listing, "# file: listing\nA::OWNER@:rwatTnNcCy\n").expect("write listing");

        // `cat` prints the file it is pointed at, standing in for nfs4_getfacl.
        let tool = Nfs4AclTool::new("/bin/cat", "/bin/true");
        let acl = tool.read(&listing).expect("read");
        assert_eq!(acl.to_spec(), "A::OWNER@:rwatTnNcCy");
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_reports_tool_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let tool = Nfs4AclTool::new("/bin/false", "/bin/false");
        let error = tool.set(temp.path(), &lock_list()).expect_err("false fails");
        match error {
            AclError::Tool { program, path, .. } => {
                assert_eq!(program, Path::new("/bin/false"));
                assert_eq!(path, temp.path());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_program_reports_io_error() {
        let tool = Nfs4AclTool::new("/nonexistent/nfs4_getfacl", "/nonexistent/nfs4_setfacl");
        let error = tool.read(Path::new("/tmp")).expect_err("spawn fails");
        assert!(matches!(error, AclError::Io { .. }));
    }

    #[test]
    fn empty_list_short_circuits_before_the_backend() {
        let tool = Nfs4AclTool::new("/nonexistent/nfs4_getfacl", "/nonexistent/nfs4_setfacl");
        let empty = AccessControlList::new();
        assert!(empty.append(&tool, Path::new("/tmp"), Recursion::Recursive).is_ok());
        assert!(empty.unset(&tool, Path::new("/tmp"), Recursion::Single).is_ok());
        assert!(matches!(
            empty.set(&tool, Path::new("/tmp")),
            Err(AclError::EmptyAcl { .. })
        ));
    }
}
