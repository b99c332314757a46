//! Smoke tests for the `bilreg-cache` binary
//!
//! Each run points `--store` at a fresh temp file and clears the `BILREG_*`
//! variables so the host environment cannot leak in.

use std::path::Path;
use std::process::{Command, Output};

fn run(store: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bilreg-cache"))
        .arg("--store")
        .arg(store)
        .args(args)
        .env("RUST_LOG", "off")
        .env_remove("BILREG_STORE_PATH")
        .env_remove("BILREG_DATA_VERSION")
        .env_remove("BILREG_SECTION_TTL_MS")
        .env_remove("BILREG_CLEANUP_INTERVAL_SECS")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_show_toggle_reset() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("sections.json");

    let out = stdout(&run(&store, &["show", "faq-section"]));
    assert!(out.contains("faq-section: not cached"), "{}", out);

    let out = stdout(&run(&store, &["toggle", "faq-section"]));
    assert!(out.contains("faq-section: open"), "{}", out);

    let out = stdout(&run(&store, &["show", "faq-section"]));
    assert!(out.contains("faq-section: open (version 1.0"), "{}", out);
    assert!(out.contains("[valid]"), "{}", out);

    let out = stdout(&run(&store, &["toggle", "faq-section"]));
    assert!(out.contains("faq-section: closed"), "{}", out);

    let out = stdout(&run(&store, &["reset", "faq-section"]));
    assert!(out.contains("faq-section: reset"), "{}", out);

    let out = stdout(&run(&store, &["show", "faq-section"]));
    assert!(out.contains("faq-section: not cached"), "{}", out);
}

#[test]
fn test_toggle_with_default_open_and_list() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("sections.json");

    let out = stdout(&run(&store, &["list"]));
    assert!(out.contains("No cached sections"), "{}", out);

    let out = stdout(&run(&store, &["toggle", "profile", "--default-open"]));
    assert!(out.contains("profile: closed"), "{}", out);
    stdout(&run(&store, &["toggle", "garage"]));

    let out = stdout(&run(&store, &["list"]));
    assert!(out.contains("garage: open"), "{}", out);
    assert!(out.contains("profile: closed"), "{}", out);
}

#[test]
fn test_unknown_command_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(&dir.path().join("sections.json"), &["explode"]);
    assert!(!output.status.success());
}
