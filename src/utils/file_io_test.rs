use super::file_io::create_parent_dir_if_not_exist;
use super::file_io::open_file_for_append;

/// # Case 1: nested parents are created on demand
#[test]
fn test_create_parent_dir_if_not_exist() {
    let dir = tempfile::tempdir().expect("tempdir should succeed");
    let target = dir.path().join("a/b/c/file.json");

    create_parent_dir_if_not_exist(&target).expect("should succeed");
    assert!(dir.path().join("a/b/c").is_dir());

    // idempotent
    create_parent_dir_if_not_exist(&target).expect("should succeed");
}

/// # Case 2: append-open creates the file and its parents
#[test]
fn test_open_file_for_append() {
    let dir = tempfile::tempdir().expect("tempdir should succeed");
    let target = dir.path().join("logs/session.log");

    let file = open_file_for_append(target.clone()).expect("should succeed");
    drop(file);
    assert!(target.is_file());
}
