use std::path::PathBuf;
use std::time::Duration;

use notify::event::{CreateKind, DataChange, MetadataKind, ModifyKind, RenameMode};
use notify::EventKind;
use tempfile::TempDir;

use super::*;

fn make_event(paths: Vec<PathBuf>, kind: EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths,
        attrs: Default::default(),
    }
}

fn modify_kind() -> EventKind {
    EventKind::Modify(ModifyKind::Data(DataChange::Any))
}

fn make_file(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_content_change_kinds() {
    assert!(is_content_change(&modify_kind()));
    assert!(is_content_change(&EventKind::Create(CreateKind::File)));
    assert!(is_content_change(&EventKind::Modify(ModifyKind::Name(
        RenameMode::To
    ))));
    assert!(!is_content_change(&EventKind::Modify(ModifyKind::Name(
        RenameMode::From
    ))));
    assert!(!is_content_change(&EventKind::Modify(ModifyKind::Metadata(
        MetadataKind::WriteTime
    ))));
    assert!(!is_content_change(&EventKind::Remove(
        notify::event::RemoveKind::File
    )));
}

#[test]
fn test_dispatch_maps_to_registered_keys() {
    let targets: Targets = Arc::default();
    targets.write().insert(
        PathBuf::from("/docs/a.md"),
        vec!["a.md".into(), "/docs/a.md".into()],
    );
    let (tx, mut rx) = mpsc::unbounded_channel();

    dispatch(
        &make_event(
            vec![PathBuf::from("/docs/a.md"), PathBuf::from("/docs/other.md")],
            modify_kind(),
        ),
        &targets,
        &tx,
    );

    assert_eq!(rx.try_recv().unwrap(), "a.md");
    assert_eq!(rx.try_recv().unwrap(), "/docs/a.md");
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_dispatch_dedups_paths_within_event() {
    let targets: Targets = Arc::default();
    targets
        .write()
        .insert(PathBuf::from("/docs/a.md"), vec!["a.md".into()]);
    let (tx, mut rx) = mpsc::unbounded_channel();

    dispatch(
        &make_event(
            vec![PathBuf::from("/docs/a.md"), PathBuf::from("/docs/a.md")],
            modify_kind(),
        ),
        &targets,
        &tx,
    );

    assert_eq!(rx.try_recv().unwrap(), "a.md");
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_add_missing_path_fails() {
    let dir = TempDir::new().unwrap();
    let watcher = FsWatcher::new().unwrap();
    let missing = dir.path().join("nope.md");

    let err = watcher.add(&missing.to_string_lossy()).unwrap_err();
    assert!(matches!(err, WatchError::Open { .. }));
    assert!(watcher.targets.read().is_empty());
}

#[test]
fn test_add_directory_fails() {
    let dir = TempDir::new().unwrap();
    let watcher = FsWatcher::new().unwrap();

    let err = watcher.add(&dir.path().to_string_lossy()).unwrap_err();
    assert!(matches!(err, WatchError::NotAFile(_)));
}

#[test]
fn test_add_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = make_file(&dir, "a.md", "# a");
    let watcher = FsWatcher::new().unwrap();

    watcher.add(&path).unwrap();
    watcher.add(&path).unwrap();

    let targets = watcher.targets.read();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets.values().next().unwrap(), &vec![path.clone()]);
    assert_eq!(watcher.state.lock().dirs.len(), 1);
}

#[test]
fn test_events_taken_once() {
    let watcher = FsWatcher::new().unwrap();
    assert!(watcher.events().is_some());
    assert!(watcher.events().is_none());
}

#[tokio::test]
async fn test_write_emits_event() {
    let dir = TempDir::new().unwrap();
    let path = make_file(&dir, "notes.md", "# one");
    let watcher = FsWatcher::new().unwrap();
    let mut events = watcher.events().unwrap();
    watcher.add(&path).unwrap();

    std::fs::write(&path, "# two").unwrap();

    let got = tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .expect("no change event within timeout");
    assert_eq!(got.as_deref(), Some(path.as_str()));
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_follows_target() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("real")).unwrap();
    std::fs::create_dir(dir.path().join("links")).unwrap();
    let real = dir.path().join("real/real.md");
    std::fs::write(&real, "# one").unwrap();
    let link = dir.path().join("links/link.md");
    std::os::unix::fs::symlink(&real, &link).unwrap();
    let link = link.to_string_lossy().into_owned();

    let watcher = FsWatcher::new().unwrap();
    let mut events = watcher.events().unwrap();
    watcher.add(&link).unwrap();

    let resolved = real.canonicalize().unwrap();
    assert_eq!(
        watcher.targets.read().get(&resolved),
        Some(&vec![link.clone()])
    );

    std::fs::write(&real, "# two").unwrap();

    let got = tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .expect("no change event for symlinked file");
    assert_eq!(got.as_deref(), Some(link.as_str()));
}
