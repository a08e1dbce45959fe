#![cfg(unix)]

use std::fs;
use tempfile::TempDir;
use unpage_core::build::{cleanup_pid_file, inspect_pid_file};
use unpage_core::{BuildLock, PidStatus};

#[test]
fn test_acquire_writes_pid_and_releases_on_drop() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("graph_build.pid");

    let lock = BuildLock::acquire(&path).unwrap().unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        std::process::id().to_string()
    );
    assert_eq!(lock.pid(), std::process::id());
    assert_eq!(
        inspect_pid_file(&path).unwrap(),
        PidStatus::Running(std::process::id())
    );

    drop(lock);
    assert!(!path.exists());
}

#[test]
fn test_drop_leaves_pid_file_of_another_owner() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("graph_build.pid");

    let lock = BuildLock::acquire(&path).unwrap().unwrap();
    // A new build took over after the old one was stopped
    fs::write(&path, "1").unwrap();

    drop(lock);
    assert_eq!(fs::read_to_string(&path).unwrap(), "1");
}

#[test]
fn test_drop_after_file_removed_is_quiet() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("graph_build.pid");

    let lock = BuildLock::acquire(&path).unwrap().unwrap();
    cleanup_pid_file(&path).unwrap();

    drop(lock);
    assert!(!path.exists());
}

#[test]
fn test_second_acquire_is_refused() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("graph_build.pid");

    let _held = BuildLock::acquire(&path).unwrap().unwrap();

    assert!(BuildLock::acquire(&path).unwrap().is_none());
    assert!(path.exists());
}

#[test]
fn test_stale_pid_file_is_replaced() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("graph_build.pid");
    // Beyond any real pid_max
    fs::write(&path, "2147483646").unwrap();
    assert_eq!(
        inspect_pid_file(&path).unwrap(),
        PidStatus::Stale(2147483646)
    );

    let lock = BuildLock::acquire(&path).unwrap();

    assert!(lock.is_some());
}

#[test]
fn test_corrupted_pid_file_is_replaced() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("graph_build.pid");
    fs::write(&path, "not-a-pid").unwrap();
    assert_eq!(inspect_pid_file(&path).unwrap(), PidStatus::Corrupted);

    assert!(BuildLock::acquire(&path).unwrap().is_some());
}

#[test]
fn test_missing_pid_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("graph_build.pid");

    assert_eq!(inspect_pid_file(&path).unwrap(), PidStatus::NotRunning);
    cleanup_pid_file(&path).unwrap();
}

#[test]
fn test_acquire_creates_profile_dir() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("profiles").join("prod").join("graph_build.pid");

    let lock = BuildLock::acquire(&path).unwrap();

    assert!(lock.is_some());
    assert!(path.exists());
}
