use std::fs;
use std::path::Path;

use test_support::{Scratch, nlink};

use super::*;

fn run_with(args: &[&str]) -> (i32, String, String) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run(args.iter().copied(), &mut stdout, &mut stderr);
    (
        code,
        String::from_utf8_lossy(&stdout).into_owned(),
        String::from_utf8_lossy(&stderr).into_owned(),
    )
}

/// Runs against `share` with ACL tools that succeed without output.
fn run_quiet(share: &Path, rest: &[&str]) -> (i32, String, String) {
    let share = share.to_string_lossy();
    let mut args = vec![
        PROGRAM_NAME,
        "--getfacl",
        "/bin/true",
        "--setfacl",
        "/bin/true",
        &*share,
    ];
    args.extend_from_slice(rest);
    run_with(&args)
}

#[test]
fn help_goes_to_stdout() {
    let (code, stdout, stderr) = run_with(&[PROGRAM_NAME, "--help"]);
    assert_eq!(code, EXIT_SUCCESS);
    assert!(stdout.contains("Usage"));
    assert!(stdout.contains("destroy"));
    assert!(stderr.is_empty());
}

#[test]
fn missing_command_is_a_usage_error() {
    let (code, stdout, stderr) = run_with(&[PROGRAM_NAME, "/srv/share"]);
    assert_eq!(code, EXIT_FAILURE);
    assert!(stdout.is_empty());
    assert!(!stderr.is_empty());
}

#[test]
fn create_over_plain_file_fails() {
    let scratch = Scratch::new().expect("scratch");
    let file = scratch.write_file("share", b"file").expect("write");

    let (code, _, stderr) = run_quiet(&file, &["create", "--exist-ok"]);

    assert_eq!(code, EXIT_FAILURE);
    assert!(stderr.contains("should be non-existent or a directory"));
}

#[test]
fn commands_other_than_create_need_the_directory() {
    let scratch = Scratch::new().expect("scratch");
    let share = scratch.path().join("share");

    for command in ["lock", "unlock", "show", "destroy"] {
        let (code, _, stderr) = run_quiet(&share, &[command]);
        assert_eq!(code, EXIT_FAILURE, "{command}");
        assert!(stderr.contains("open share directory"), "{command}: {stderr}");
    }
    assert!(!share.exists());
}

#[test]
fn create_twice_requires_exist_ok() {
    let scratch = Scratch::new().expect("scratch");
    let share = scratch.path().join("share");

    assert_eq!(run_quiet(&share, &["create"]).0, EXIT_SUCCESS);
    assert_eq!(run_quiet(&share, &["create"]).0, EXIT_FAILURE);
    assert_eq!(run_quiet(&share, &["create", "--exist-ok"]).0, EXIT_SUCCESS);
}

#[test]
fn add_then_destroy() {
    let scratch = Scratch::new().expect("scratch");
    let source = scratch.write_file("data/file.txt", b"payload").expect("write");
    let share = scratch.path().join("share");
    assert_eq!(run_quiet(&share, &["create"]).0, EXIT_SUCCESS);

    let (code, stdout, _) = run_quiet(&share, &["add", &*source.to_string_lossy()]);
    assert_eq!(code, EXIT_SUCCESS);
    assert!(stdout.contains("linked"));
    assert_eq!(nlink(&source), 2);

    let (code, _, _) = run_quiet(&share, &["destroy"]);
    assert_eq!(code, EXIT_SUCCESS);
    assert!(!share.exists());
    assert_eq!(nlink(&source), 1);
    assert_eq!(fs::read(&source).expect("read"), b"payload");
}

#[test]
fn add_with_unhandled_item_is_partial() {
    let scratch = Scratch::new().expect("scratch");
    let source = scratch.write_file("data/file.txt", b"payload").expect("write");
    let missing = scratch.path().join("data/missing");
    let share = scratch.path().join("share");
    assert_eq!(run_quiet(&share, &["create"]).0, EXIT_SUCCESS);

    let (code, _, stderr) = run_quiet(
        &share,
        &["add", &*source.to_string_lossy(), &*missing.to_string_lossy()],
    );

    assert_eq!(code, EXIT_PARTIAL);
    assert!(stderr.contains("did not handle input item"));
    assert!(share.join("file.txt").exists());
}

#[test]
fn destroy_keeps_last_links_without_force() {
    let scratch = Scratch::new().expect("scratch");
    let source = scratch.write_file("data/file.txt", b"payload").expect("write");
    let share = scratch.path().join("share");
    assert_eq!(run_quiet(&share, &["create"]).0, EXIT_SUCCESS);
    assert_eq!(
        run_quiet(&share, &["add", &*source.to_string_lossy()]).0,
        EXIT_SUCCESS
    );
    fs::remove_file(&source).expect("remove original");

    let (code, _, stderr) = run_quiet(&share, &["destroy"]);
    assert_eq!(code, EXIT_FAILURE);
    assert!(stderr.contains("kept"));
    assert!(share.join("file.txt").exists());

    assert_eq!(run_quiet(&share, &["destroy", "--force"]).0, EXIT_SUCCESS);
    assert!(!share.exists());
}

#[test]
fn show_prints_nothing_for_an_empty_acl() {
    let scratch = Scratch::new().expect("scratch");
    let share = scratch.path().join("share");
    assert_eq!(run_quiet(&share, &["create"]).0, EXIT_SUCCESS);

    let (code, stdout, _) = run_quiet(&share, &["show"]);

    assert_eq!(code, EXIT_SUCCESS);
    assert!(stdout.is_empty());
}

#[test]
fn failing_acl_tool_is_reported() {
    let scratch = Scratch::new().expect("scratch");
    let share = scratch.mkdir("share").expect("mkdir");
    let share_arg = share.to_string_lossy();

    let (code, _, stderr) = run_with(&[
        PROGRAM_NAME,
        "--getfacl",
        "/bin/false",
        &*share_arg,
        "show",
    ]);

    assert_eq!(code, EXIT_FAILURE);
    assert!(stderr.contains("/bin/false"));
}
