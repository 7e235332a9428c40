//! Integration tests for container lifecycle, file, and folder operations

use pathcask::{CaskError, Config, Container, ContainerState, Path};
use tempfile::TempDir;

fn new_container(dir: &TempDir) -> Container {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    let config = Config::builder()
        .storage_path(dir.path().join("storage"))
        .build();
    Container::open(config).expect("container should start")
}

fn storage_len(dir: &TempDir) -> u64 {
    std::fs::metadata(dir.path().join("storage")).unwrap().len()
}

// =============================================================================
// File Operations
// =============================================================================

#[test]
fn basic_create_and_read() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);

    container
        .create_file(&Path::file("some-file"), b"My string file")
        .unwrap();
    container
        .create_file(&Path::file("some-file2"), b"My string file2")
        .unwrap();

    assert_eq!(
        container.read(&Path::file("some-file")).unwrap(),
        b"My string file"
    );
    assert_eq!(
        container.read(&Path::file("some-file2")).unwrap(),
        b"My string file2"
    );
}

#[test]
fn files_survive_a_stop_start_cycle() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);

    container
        .create_file(&Path::file("some-file"), b"My string file")
        .unwrap();
    container
        .create_file(&Path::file("some-file2"), b"My string file2")
        .unwrap();

    container.stop().unwrap();
    container.start().unwrap();

    assert_eq!(
        container.read(&Path::file("some-file")).unwrap(),
        b"My string file"
    );
    assert_eq!(
        container.read(&Path::file("some-file2")).unwrap(),
        b"My string file2"
    );
}

#[test]
fn read_after_update_gives_the_latest_version() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);

    container
        .create_file(&Path::file("some-file"), b"My string file")
        .unwrap();
    container
        .write(&Path::file("some-file"), b"New version")
        .unwrap();

    assert_eq!(
        container.read(&Path::file("some-file")).unwrap(),
        b"New version"
    );

    // Last write wins across replay as well.
    container.stop().unwrap();
    container.start().unwrap();
    assert_eq!(
        container.read(&Path::file("some-file")).unwrap(),
        b"New version"
    );
}

#[test]
fn read_after_append_gives_the_concatenation() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);

    container
        .create_file(&Path::file("some-file"), b"My string file")
        .unwrap();
    container
        .append(&Path::file("some-file"), b" - new version")
        .unwrap();

    assert_eq!(
        container.read(&Path::file("some-file")).unwrap(),
        b"My string file - new version"
    );
}

#[test]
fn operations_on_missing_files_fail_without_mutating() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);
    let missing = Path::file("non-existing-file");
    let len_before = storage_len(&dir);

    let err = container.write(&missing, b"New version").unwrap_err();
    assert!(matches!(err, CaskError::NotFound(ref p) if p == "non-existing-file"));

    let err = container.append(&missing, b"New version").unwrap_err();
    assert!(matches!(err, CaskError::NotFound(_)));

    let err = container.delete(&missing).unwrap_err();
    assert!(matches!(err, CaskError::NotFound(_)));

    let err = container
        .rename(&missing, &Path::file("non-existing-file2"))
        .unwrap_err();
    assert!(matches!(err, CaskError::NotFound(_)));

    let err = container.read(&missing).unwrap_err();
    assert!(matches!(err, CaskError::NotFound(_)));

    // Failed preconditions must leave the log untouched.
    assert_eq!(storage_len(&dir), len_before);
    assert!(!container.exists(&missing).unwrap());
}

#[test]
fn rename_moves_content_and_drops_the_old_path() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);

    container
        .create_file(&Path::file("before"), b"My string file")
        .unwrap();
    container
        .rename(&Path::file("before"), &Path::file("after"))
        .unwrap();

    assert_eq!(
        container.read(&Path::file("after")).unwrap(),
        b"My string file"
    );
    assert!(!container.exists(&Path::file("before")).unwrap());
}

#[test]
fn move_entry_is_a_rename_synonym() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);

    container
        .create_file(&Path::file("before"), b"My string file")
        .unwrap();
    container
        .move_entry(&Path::file("before"), &Path::file("after"))
        .unwrap();

    assert_eq!(
        container.read(&Path::file("after")).unwrap(),
        b"My string file"
    );
    assert!(!container.exists(&Path::file("before")).unwrap());
}

#[test]
fn rename_across_path_kinds_is_an_invalid_argument() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);

    container.create_file(&Path::file("f"), b"x").unwrap();
    let err = container
        .rename(&Path::file("f"), &Path::folder("g"))
        .unwrap_err();
    assert!(matches!(err, CaskError::InvalidArgument(_)));
}

#[test]
fn renaming_into_the_own_subtree_is_an_invalid_argument() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);

    container.create_folder(&Path::folder("a")).unwrap();
    container.create_file(&Path::file("a/f"), b"x").unwrap();
    let len_before = storage_len(&dir);

    let err = container
        .rename(&Path::folder("a"), &Path::folder("a/b"))
        .unwrap_err();
    assert!(matches!(err, CaskError::InvalidArgument(_)), "got {err:?}");

    let err = container
        .rename(&Path::folder("a"), &Path::folder("a"))
        .unwrap_err();
    assert!(matches!(err, CaskError::InvalidArgument(_)));

    let err = container
        .rename(&Path::file("a/f"), &Path::file("a/f"))
        .unwrap_err();
    assert!(matches!(err, CaskError::InvalidArgument(_)));

    // Nothing was appended or dropped.
    assert_eq!(storage_len(&dir), len_before);
    assert!(container.exists(&Path::folder("a")).unwrap());
    assert_eq!(container.read(&Path::file("a/f")).unwrap(), b"x");
}

#[test]
fn deleted_files_stay_deleted_after_replay() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);

    container
        .create_file(&Path::file("some-file"), b"My string file")
        .unwrap();
    container
        .create_file(&Path::file("some-file2"), b"My string file2")
        .unwrap();
    container.delete(&Path::file("some-file")).unwrap();

    container.stop().unwrap();
    container.start().unwrap();

    assert!(!container.exists(&Path::file("some-file")).unwrap());
    assert_eq!(
        container.read(&Path::file("some-file2")).unwrap(),
        b"My string file2"
    );
}

// =============================================================================
// Folder Operations
// =============================================================================

#[test]
fn create_and_list_a_folder_three_levels_deep() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);

    container
        .create_folder(&Path::folder("level1/level2/level3"))
        .unwrap();

    let level1 = container.list(&Path::folder("level1")).unwrap();
    assert_eq!(level1, vec![Path::folder("level1/level2")]);

    let level2 = container.list(&Path::folder("level1/level2")).unwrap();
    assert_eq!(level2, vec![Path::folder("level1/level2/level3")]);

    let level3 = container
        .list(&Path::folder("level1/level2/level3"))
        .unwrap();
    assert!(level3.is_empty());
}

#[test]
fn writing_a_nested_file_registers_its_ancestors() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);

    container
        .create_file(&Path::file("a/b/c"), b"deep")
        .unwrap();

    assert!(container.exists(&Path::folder("a")).unwrap());
    assert!(container.exists(&Path::folder("a/b")).unwrap());
    assert_eq!(
        container.list(&Path::folder("a/b")).unwrap(),
        vec![Path::file("a/b/c")]
    );
}

#[test]
fn delete_an_empty_folder() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);

    container.create_folder(&Path::folder("level1/level2")).unwrap();
    container.delete(&Path::folder("level1/level2")).unwrap();

    assert!(container.list(&Path::folder("level1")).unwrap().is_empty());
}

#[test]
fn deleting_a_folder_deletes_its_nested_file() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);

    container.create_folder(&Path::folder("level1/level2")).unwrap();
    container
        .create_file(&Path::file("level1/level2/myfile"), b"Content")
        .unwrap();
    container.delete(&Path::folder("level1/level2")).unwrap();

    assert!(container.list(&Path::folder("level1")).unwrap().is_empty());
    assert!(!container
        .exists(&Path::file("level1/level2/myfile"))
        .unwrap());
}

#[test]
fn deleted_folder_subtree_stays_deleted_after_replay() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);

    container
        .create_file(&Path::file("level1/level2/myfile"), b"Content")
        .unwrap();
    container.create_folder(&Path::folder("level1/level2-2")).unwrap();
    container.delete(&Path::folder("level1/level2")).unwrap();

    container.stop().unwrap();
    container.start().unwrap();

    let level1 = container.list(&Path::folder("level1")).unwrap();
    assert_eq!(level1, vec![Path::folder("level1/level2-2")]);
    assert!(!container
        .exists(&Path::file("level1/level2/myfile"))
        .unwrap());
}

#[test]
fn renaming_a_folder_rehomes_every_nested_object() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);

    container
        .create_file(&Path::file("level1/myfile"), b"Content")
        .unwrap();
    container.create_folder(&Path::folder("level1/level2")).unwrap();
    container
        .rename(&Path::folder("level1"), &Path::folder("level1-1"))
        .unwrap();

    assert!(!container.exists(&Path::folder("level1")).unwrap());

    let children = container.list(&Path::folder("level1-1")).unwrap();
    assert_eq!(children.len(), 2);
    assert!(container.exists(&Path::file("level1-1/myfile")).unwrap());
    assert!(container.exists(&Path::folder("level1-1/level2")).unwrap());
    assert_eq!(
        container.read(&Path::file("level1-1/myfile")).unwrap(),
        b"Content"
    );
}

#[test]
fn move_a_file_from_root_into_a_folder() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);

    container.create_file(&Path::file("myfile"), b"Content").unwrap();
    container.create_folder(&Path::folder("level1")).unwrap();
    container
        .move_entry(&Path::file("myfile"), &Path::file("level1/myfile"))
        .unwrap();

    assert_eq!(
        container.read(&Path::file("level1/myfile")).unwrap(),
        b"Content"
    );
    assert!(!container.exists(&Path::file("myfile")).unwrap());
}

#[test]
fn walk_visits_every_descendant_depth_first() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);

    container.create_folder(&Path::folder("root/sub")).unwrap();
    container.create_file(&Path::file("root/a"), b"1").unwrap();
    container.create_file(&Path::file("root/sub/b"), b"2").unwrap();

    let mut visited = Vec::new();
    container
        .walk(&Path::folder("root"), |path| visited.push(path.clone()))
        .unwrap();

    assert_eq!(visited.len(), 3);
    assert!(visited.contains(&Path::file("root/a")));
    assert!(visited.contains(&Path::folder("root/sub")));
    assert!(visited.contains(&Path::file("root/sub/b")));
    // The subfolder is visited before its contents.
    let sub_pos = visited
        .iter()
        .position(|p| p == &Path::folder("root/sub"))
        .unwrap();
    let b_pos = visited
        .iter()
        .position(|p| p == &Path::file("root/sub/b"))
        .unwrap();
    assert!(sub_pos < b_pos);
}

#[test]
fn listing_a_missing_folder_is_not_found() {
    let dir = TempDir::new().unwrap();
    let container = new_container(&dir);

    let err = container.list(&Path::folder("nope")).unwrap_err();
    assert!(matches!(err, CaskError::NotFound(_)));
}

// =============================================================================
// Lifecycle State Machine
// =============================================================================

#[test]
fn operations_require_ready_to_use() {
    let dir = TempDir::new().unwrap();
    let config = Config::builder()
        .storage_path(dir.path().join("storage"))
        .build();
    let mut container = Container::new(config);
    assert_eq!(container.state(), ContainerState::Created);

    let err = container
        .create_file(&Path::file("f"), b"x")
        .unwrap_err();
    assert!(matches!(err, CaskError::InvalidState(_)));

    container.start().unwrap();
    assert_eq!(container.state(), ContainerState::ReadyToUse);
    container.create_file(&Path::file("f"), b"x").unwrap();

    container.stop().unwrap();
    assert_eq!(container.state(), ContainerState::Stopped);
    let err = container.read(&Path::file("f")).unwrap_err();
    assert!(matches!(err, CaskError::InvalidState(_)));
}

#[test]
fn start_is_only_allowed_from_created_or_stopped() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);

    let err = container.start().unwrap_err();
    assert!(matches!(err, CaskError::InvalidState(_)));

    container.stop().unwrap();
    let err = container.stop().unwrap_err();
    assert!(matches!(err, CaskError::InvalidState(_)));
}

#[test]
fn destroy_deletes_the_backing_file_and_is_terminal() {
    let dir = TempDir::new().unwrap();
    let mut container = new_container(&dir);
    container.create_file(&Path::file("f"), b"x").unwrap();

    container.destroy().unwrap();
    assert_eq!(container.state(), ContainerState::Destroyed);
    assert!(!dir.path().join("storage").exists());

    let err = container.start().unwrap_err();
    assert!(matches!(err, CaskError::InvalidState(_)));
    let err = container.destroy().unwrap_err();
    assert!(matches!(err, CaskError::InvalidState(_)));
}

#[test]
fn destroy_is_allowed_before_the_first_start() {
    let dir = TempDir::new().unwrap();
    let config = Config::builder()
        .storage_path(dir.path().join("storage"))
        .build();
    let mut container = Container::new(config);

    container.destroy().unwrap();
    assert_eq!(container.state(), ContainerState::Destroyed);
}
