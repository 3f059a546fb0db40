//! Integration tests for open-file tracking through the gateway:
//! reading opens, edits reclassify, saves reset the baseline, closes
//! discard.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use atelier_host::dialog::HeadlessPicker;
use atelier_host::ipc::protocol::{Request, Response};
use atelier_host::ipc::Gateway;
use atelier_host::terminal::TerminalSettings;
use atelier_host::workspace::DirtyStatus;

fn gateway() -> Gateway {
    Gateway::new(TerminalSettings::default(), Arc::new(HeadlessPicker))
}

async fn status_of(gw: &Gateway, path: &str) -> Option<DirtyStatus> {
    match gw
        .handle_request(Request::FileStatus { path: path.into() })
        .await
        .unwrap()
    {
        Response::Status(status) => status,
        other => panic!("expected status, got {:?}", serde_json::to_value(&other)),
    }
}

async fn edit(gw: &Gateway, path: &str, content: &str) -> Option<DirtyStatus> {
    match gw
        .handle_request(Request::UpdateFile {
            path: path.into(),
            content: content.into(),
        })
        .await
        .unwrap()
    {
        Response::Status(status) => status,
        other => panic!("expected status, got {:?}", serde_json::to_value(&other)),
    }
}

#[tokio::test]
async fn read_opens_clean_and_edits_reclassify() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("doc.txt");
    fs::write(&file, "a\nb").unwrap();
    let path = file.display().to_string();
    let gw = gateway();

    gw.handle_request(Request::ReadFile { path: path.clone() })
        .await
        .unwrap();
    assert_eq!(status_of(&gw, &path).await, Some(DirtyStatus::Clean));

    assert_eq!(edit(&gw, &path, "a\nb\nc").await, Some(DirtyStatus::Added));
    assert_eq!(edit(&gw, &path, "a").await, Some(DirtyStatus::Deleted));
    assert_eq!(edit(&gw, &path, "a\nX").await, Some(DirtyStatus::Modified));
    // Status is derived from content, not from edit history.
    assert_eq!(edit(&gw, &path, "a\nb").await, Some(DirtyStatus::Clean));
}

#[tokio::test]
async fn save_resets_the_baseline() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("doc.txt");
    fs::write(&file, "one").unwrap();
    let path = file.display().to_string();
    let gw = gateway();

    gw.handle_request(Request::ReadFile { path: path.clone() })
        .await
        .unwrap();
    assert_eq!(edit(&gw, &path, "one\ntwo").await, Some(DirtyStatus::Added));

    gw.handle_request(Request::SaveFile {
        path: path.clone(),
        content: "one\ntwo".into(),
    })
    .await
    .unwrap();

    assert_eq!(status_of(&gw, &path).await, Some(DirtyStatus::Clean));
    assert_eq!(fs::read_to_string(&file).unwrap(), "one\ntwo");

    // Editing away from the new baseline is dirty again.
    assert_eq!(edit(&gw, &path, "one").await, Some(DirtyStatus::Deleted));
}

#[tokio::test]
async fn failed_save_leaves_the_entry_dirty() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("doc.txt");
    fs::write(&file, "text").unwrap();
    let path = file.display().to_string();
    let gw = gateway();

    gw.handle_request(Request::ReadFile { path: path.clone() })
        .await
        .unwrap();
    edit(&gw, &path, "text\nmore").await;

    // Saving to an unwritable location fails and must not commit.
    let bogus = temp.path().join("no-such-dir/doc.txt").display().to_string();
    gw.handle_request(Request::SaveFile {
        path: bogus,
        content: "text\nmore".into(),
    })
    .await
    .unwrap_err();

    assert_eq!(status_of(&gw, &path).await, Some(DirtyStatus::Added));
}

#[tokio::test]
async fn save_all_commits_baselines_for_the_successes() {
    let temp = TempDir::new().unwrap();
    let a = temp.path().join("a.txt");
    let b = temp.path().join("b.txt");
    fs::write(&a, "a").unwrap();
    fs::write(&b, "b").unwrap();
    let path_a = a.display().to_string();
    let path_b = b.display().to_string();
    let gw = gateway();

    for path in [&path_a, &path_b] {
        gw.handle_request(Request::ReadFile { path: path.clone() })
            .await
            .unwrap();
    }
    edit(&gw, &path_a, "a\na").await;
    edit(&gw, &path_b, "b\nb").await;

    let bad = temp.path().join("gone/c.txt").display().to_string();
    gw.handle_request(Request::SaveAllFiles {
        files: vec![
            atelier_host::ipc::protocol::SaveFileItem {
                path: path_a.clone(),
                content: "a\na".into(),
            },
            atelier_host::ipc::protocol::SaveFileItem {
                path: path_b.clone(),
                content: "b\nb".into(),
            },
            atelier_host::ipc::protocol::SaveFileItem {
                path: bad,
                content: "c".into(),
            },
        ],
    })
    .await
    .unwrap();

    assert_eq!(status_of(&gw, &path_a).await, Some(DirtyStatus::Clean));
    assert_eq!(status_of(&gw, &path_b).await, Some(DirtyStatus::Clean));
}

#[tokio::test]
async fn save_open_files_writes_only_the_dirty_ones() {
    let temp = TempDir::new().unwrap();
    let dirty = temp.path().join("dirty.txt");
    let clean = temp.path().join("clean.txt");
    fs::write(&dirty, "old").unwrap();
    fs::write(&clean, "untouched").unwrap();
    let dirty_path = dirty.display().to_string();
    let clean_path = clean.display().to_string();
    let gw = gateway();

    for path in [&dirty_path, &clean_path] {
        gw.handle_request(Request::ReadFile { path: path.clone() })
            .await
            .unwrap();
    }
    edit(&gw, &dirty_path, "old\nnew").await;

    let response = gw.handle_request(Request::SaveOpenFiles).await.unwrap();
    let outcomes = match response {
        Response::SaveAll(outcomes) => outcomes,
        other => panic!("expected save-all map, got {:?}", serde_json::to_value(&other)),
    };
    // Only the dirty file was written; the clean one was left alone.
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[&dirty_path].ok);
    assert_eq!(fs::read_to_string(&dirty).unwrap(), "old\nnew");

    assert_eq!(status_of(&gw, &dirty_path).await, Some(DirtyStatus::Clean));

    // Nothing left to save now.
    let response = gw.handle_request(Request::SaveOpenFiles).await.unwrap();
    match response {
        Response::SaveAll(outcomes) => assert!(outcomes.is_empty()),
        other => panic!("expected save-all map, got {:?}", serde_json::to_value(&other)),
    }
}

#[tokio::test]
async fn close_discards_and_forgets() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("doc.txt");
    fs::write(&file, "keep").unwrap();
    let path = file.display().to_string();
    let gw = gateway();

    gw.handle_request(Request::ReadFile { path: path.clone() })
        .await
        .unwrap();
    edit(&gw, &path, "keep\nunsaved").await;

    gw.handle_request(Request::CloseFile { path: path.clone() })
        .await
        .unwrap();

    // Unknown to the registry now; unsaved edits are gone.
    assert_eq!(status_of(&gw, &path).await, None);
    assert_eq!(fs::read_to_string(&file).unwrap(), "keep");

    // Closing a file that is not open is still a success.
    gw.handle_request(Request::CloseFile { path }).await.unwrap();
}
