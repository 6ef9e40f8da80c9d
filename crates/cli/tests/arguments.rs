//! Tests for command-line parsing of share commands and global options.

use std::path::PathBuf;

use cli::{Action, parse_args};

// ============================================================================
// Commands
// ============================================================================

#[test]
fn create_defaults_to_refusing_existing_directories() {
    let args = parse_args(["nfs4-share", "/srv/share", "create"]).unwrap();
    assert_eq!(args.share, PathBuf::from("/srv/share"));
    assert_eq!(args.action, Action::Create { exist_ok: false });
}

#[test]
fn create_accepts_exist_ok() {
    let args = parse_args(["nfs4-share", "/srv/share", "create", "--exist-ok"]).unwrap();
    assert_eq!(args.action, Action::Create { exist_ok: true });
}

#[test]
fn add_collects_every_item() {
    let args = parse_args(["nfs4-share", "/srv/share", "add", "a.txt", "dir", "b.txt"]).unwrap();
    assert_eq!(
        args.action,
        Action::Add {
            items: vec!["a.txt".into(), "dir".into(), "b.txt".into()]
        }
    );
}

#[test]
fn add_requires_an_item() {
    assert!(parse_args(["nfs4-share", "/srv/share", "add"]).is_err());
}

#[test]
fn destroy_force_is_opt_in() {
    let args = parse_args(["nfs4-share", "/srv/share", "destroy"]).unwrap();
    assert_eq!(args.action, Action::Destroy { force: false });

    let args = parse_args(["nfs4-share", "/srv/share", "destroy", "--force"]).unwrap();
    assert_eq!(args.action, Action::Destroy { force: true });
}

#[test]
fn lock_unlock_and_show_take_no_arguments() {
    for (command, action) in [
        ("lock", Action::Lock),
        ("unlock", Action::Unlock),
        ("show", Action::Show),
    ] {
        let args = parse_args(["nfs4-share", "/srv/share", command]).unwrap();
        assert_eq!(args.action, action);
    }
    assert!(parse_args(["nfs4-share", "/srv/share", "lock", "extra"]).is_err());
}

#[test]
fn unknown_command_is_rejected() {
    assert!(parse_args(["nfs4-share", "/srv/share", "publish"]).is_err());
}

// ============================================================================
// Global Options
// ============================================================================

#[test]
fn verbose_flags_are_counted() {
    let args = parse_args(["nfs4-share", "-vv", "/srv/share", "show"]).unwrap();
    assert_eq!(args.verbosity, 2);
}

#[test]
fn acl_tool_paths_can_be_overridden() {
    let args = parse_args([
        "nfs4-share",
        "--getfacl",
        "/opt/nfs4/bin/nfs4_getfacl",
        "--setfacl",
        "/opt/nfs4/bin/nfs4_setfacl",
        "/srv/share",
        "lock",
    ])
    .unwrap();
    assert_eq!(args.getfacl, PathBuf::from("/opt/nfs4/bin/nfs4_getfacl"));
    assert_eq!(args.setfacl, PathBuf::from("/opt/nfs4/bin/nfs4_setfacl"));
}

#[test]
fn share_directory_is_required() {
    assert!(parse_args(["nfs4-share"]).is_err());
}
