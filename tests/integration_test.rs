//! Integration tests for the SimpleNotes core
//!
//! These tests verify end-to-end functionality through the controller:
//! - Note lifecycle across restarts
//! - Pin ordering and title derivation
//! - The recycle bin, retention sweep, and image deletion guard
//! - Export/import round trips

use simplenotes::app::App;
use simplenotes::database::{create_pool, Note, Repository};
use simplenotes::error::AppError;
use simplenotes::history::NavEntry;
use simplenotes::services::retention::ImageDeletion;
use simplenotes::services::settings::GlobalSettings;
use simplenotes::util::now_ms;
use tempfile::TempDir;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

async fn create_test_app() -> (App, TempDir) {
    let temp = TempDir::new().unwrap();
    let app = App::init(temp.path()).await.unwrap();
    (app, temp)
}

/// Seed a record directly in the store, bypassing the controller
async fn seed_deleted_note(profile: &std::path::Path, deleted_at: i64) -> String {
    let pool = create_pool(&profile.join("db.sqlite")).await.unwrap();
    let repo = Repository::new(pool.clone());

    let mut note = Note::new(&GlobalSettings::default());
    note.metadata.deleted_at = Some(deleted_at);
    repo.put_note(&note).await.unwrap();

    pool.close().await;
    note.id
}

#[tokio::test]
async fn test_notes_survive_restart() {
    let temp = TempDir::new().unwrap();

    let (first_id, second_id) = {
        let mut app = App::init(temp.path()).await.unwrap();
        let first = app.create_note().await.unwrap().id.clone();
        app.edit_note_content(&first, "First note\nbody".to_string())
            .await
            .unwrap();

        let second = app.create_note().await.unwrap().id.clone();
        app.edit_note_content(&second, "Second note".to_string())
            .await
            .unwrap();
        app.delete_note(&second).await.unwrap();

        (first, second)
    };

    let app = App::init(temp.path()).await.unwrap();

    assert_eq!(app.notes().len(), 1);
    assert_eq!(app.notes()[0].id, first_id);
    assert_eq!(app.notes()[0].title, "First note");

    assert_eq!(app.deleted_notes().len(), 1);
    assert_eq!(app.deleted_notes()[0].id, second_id);
}

#[tokio::test]
async fn test_every_note_is_active_or_deleted_never_both() {
    let (mut app, _temp) = create_test_app().await;

    let id = app.create_note().await.unwrap().id.clone();
    app.delete_note(&id).await.unwrap();

    let in_active = app.notes().iter().any(|n| n.id == id);
    let in_deleted = app.deleted_notes().iter().any(|n| n.id == id);
    assert!(!in_active && in_deleted);
    assert!(app.deleted_notes()[0].metadata.deleted_at.is_some());

    app.restore_note(&id).await.unwrap();
    let in_active = app.notes().iter().any(|n| n.id == id);
    let in_deleted = app.deleted_notes().iter().any(|n| n.id == id);
    assert!(in_active && !in_deleted);
    assert!(app.notes()[0].metadata.deleted_at.is_none());
}

#[tokio::test]
async fn test_pinned_notes_order() {
    let (mut app, _temp) = create_test_app().await;

    let a = app.create_note().await.unwrap().id.clone();
    app.edit_note_content(&a, "a".to_string()).await.unwrap();
    let b = app.create_note().await.unwrap().id.clone();
    app.edit_note_content(&b, "b".to_string()).await.unwrap();
    let c = app.create_note().await.unwrap().id.clone();
    app.edit_note_content(&c, "c".to_string()).await.unwrap();

    // Pin b first, then a: earliest pin keeps the top position.
    app.toggle_pin(&b).await.unwrap();
    app.toggle_pin(&a).await.unwrap();

    let order: Vec<&str> = app.notes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(order, vec![b.as_str(), a.as_str(), c.as_str()]);

    // All pinned notes precede all unpinned notes, ordered by pin time.
    let pins: Vec<bool> = app.notes().iter().map(|n| n.is_pinned).collect();
    assert_eq!(pins, vec![true, true, false]);
    assert!(app.notes()[0].pinned_at.unwrap() <= app.notes()[1].pinned_at.unwrap());

    // Unpinning returns the note to the recency ordering.
    app.toggle_pin(&b).await.unwrap();
    assert!(app.notes().iter().find(|n| n.id == b).unwrap().pinned_at.is_none());
}

#[tokio::test]
async fn test_retention_sweep_on_startup() {
    let temp = TempDir::new().unwrap();

    let expired = seed_deleted_note(temp.path(), now_ms() - 31 * DAY_MS).await;
    let recent = seed_deleted_note(temp.path(), now_ms() - 29 * DAY_MS).await;

    let app = App::init(temp.path()).await.unwrap();

    // The 31-day-old record is gone from memory and storage; the
    // 29-day-old one is still restorable.
    assert!(!app.deleted_notes().iter().any(|n| n.id == expired));
    assert!(app.deleted_notes().iter().any(|n| n.id == recent));

    let pool = create_pool(&temp.path().join("db.sqlite")).await.unwrap();
    let repo = Repository::new(pool);
    assert!(repo.get_note(&expired).await.unwrap().is_none());
    assert!(repo.get_note(&recent).await.unwrap().is_some());
}

#[tokio::test]
async fn test_export_import_round_trip_with_images() {
    let (mut app, _temp) = create_test_app().await;

    let id = app.create_note().await.unwrap().id.clone();
    let snippet = app.attach_image(vec![0x89, 0x50, 0x4e, 0x47]).await.unwrap();
    app.edit_note_content(&id, format!("Illustrated note\n{snippet}"))
        .await
        .unwrap();
    let original = app.notes()[0].clone();

    let (file_name, bytes) = app.export_note(&id).await.unwrap();
    assert_eq!(file_name, "Illustrated note.snote");

    let imported_ids = app.import_archive(&file_name, &bytes).await.unwrap();
    assert_eq!(imported_ids.len(), 1);
    assert_ne!(imported_ids[0], original.id);

    let imported = app
        .notes()
        .iter()
        .find(|n| n.id == imported_ids[0])
        .unwrap();
    assert_eq!(imported.title, original.title);
    assert_eq!(imported.content, original.content);
    assert_eq!(imported.settings, original.settings);
    assert_eq!(imported.metadata.created_at, original.metadata.created_at);

    // The embedded image is still resolvable for the imported copy.
    let image_id = simplenotes::util::extract_image_ids(&imported.content)
        .pop()
        .unwrap();
    assert!(app.image_data(&image_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_bulk_export_import_preserves_relative_order() {
    let (mut app, _temp) = create_test_app().await;

    let older = app.create_note().await.unwrap().id.clone();
    app.edit_note_content(&older, "Older".to_string())
        .await
        .unwrap();
    let newer = app.create_note().await.unwrap().id.clone();
    app.edit_note_content(&newer, "Newer".to_string())
        .await
        .unwrap();

    let (file_name, bytes) = app.export_all_notes().await.unwrap();
    assert!(file_name.starts_with("notes_") && file_name.ends_with(".snotes"));

    // Keep the import stamps strictly newer than the originals'.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let imported_ids = app.import_archive(&file_name, &bytes).await.unwrap();
    assert_eq!(imported_ids.len(), 2);

    // Imported notes surface at the top, newest relative order intact:
    // the list starts with the imported copies of Newer then Older.
    let titles: Vec<&str> = app.notes().iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles[..2], ["Newer", "Older"]);
    assert_eq!(app.notes().len(), 4);
}

#[tokio::test]
async fn test_import_rejects_garbage_and_leaves_state_alone() {
    let (mut app, _temp) = create_test_app().await;
    app.create_note().await.unwrap();

    let err = app.import_archive("x.snote", b"not a zip").await.unwrap_err();
    assert!(matches!(err, AppError::MalformedContainer(_)));

    let err = app
        .import_archive("x.pdf", &[1, 2, 3])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MalformedContainer(_)));

    assert_eq!(app.notes().len(), 1);
}

#[tokio::test]
async fn test_paste_transform_composition() {
    let (app, _temp) = create_test_app().await;

    // Defaults enable both transforms.
    assert_eq!(app.transform_paste("a~b\nc~d"), "a\\~b  \nc\\~d");
}

#[tokio::test]
async fn test_image_deletion_guard_end_to_end() {
    let (mut app, _temp) = create_test_app().await;

    let id = app.create_note().await.unwrap().id.clone();
    let snippet = app.attach_image(vec![1, 2, 3]).await.unwrap();
    app.edit_note_content(&id, snippet.clone()).await.unwrap();

    let image_id = simplenotes::util::extract_image_ids(&snippet)
        .pop()
        .unwrap();

    // Guard on (the default): deletion of a referenced image is refused.
    assert_eq!(
        app.delete_image(&image_id).await.unwrap(),
        ImageDeletion::RefusedInUse
    );
    assert!(app.image_data(&image_id).await.unwrap().is_some());

    // Removing the reference lets the deletion proceed.
    app.edit_note_content(&id, "no more images".to_string())
        .await
        .unwrap();
    assert_eq!(
        app.delete_image(&image_id).await.unwrap(),
        ImageDeletion::Deleted
    );
    assert!(app.image_data(&image_id).await.unwrap().is_none());

    // Restore brings it back.
    app.restore_image(&image_id).await.unwrap();
    assert!(app.image_data(&image_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_image_deletion_guard_respects_setting() {
    let (mut app, _temp) = create_test_app().await;

    let id = app.create_note().await.unwrap().id.clone();
    let snippet = app.attach_image(vec![1]).await.unwrap();
    app.edit_note_content(&id, snippet.clone()).await.unwrap();
    let image_id = simplenotes::util::extract_image_ids(&snippet)
        .pop()
        .unwrap();

    app.set_prevent_used_image_deletion(false).await.unwrap();

    assert_eq!(
        app.delete_image(&image_id).await.unwrap(),
        ImageDeletion::Deleted
    );
}

#[tokio::test]
async fn test_empty_recycle_bin_purges_notes_and_images() {
    let temp = TempDir::new().unwrap();
    let mut app = App::init(temp.path()).await.unwrap();

    let note_id = app.create_note().await.unwrap().id.clone();
    app.delete_note(&note_id).await.unwrap();

    let snippet = app.attach_image(vec![5]).await.unwrap();
    let image_id = simplenotes::util::extract_image_ids(&snippet)
        .pop()
        .unwrap();
    app.delete_image(&image_id).await.unwrap();

    app.empty_recycle_bin().await.unwrap();
    assert!(app.deleted_notes().is_empty());

    // Nothing comes back after a restart.
    drop(app);
    let app = App::init(temp.path()).await.unwrap();
    assert!(app.notes().is_empty());
    assert!(app.deleted_notes().is_empty());
    assert!(app.image_data(&image_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_navigation_branch_truncation_through_controller() {
    let (mut app, _temp) = create_test_app().await;

    app.open_recycle_bin();
    app.open_image_management();
    assert_eq!(app.history().len(), 3);

    app.go_back();
    app.go_back();
    assert_eq!(app.current_view(), Some(&NavEntry::List));

    // A new visit from the past invalidates the forward branch.
    app.open_license();
    assert_eq!(
        app.history().entries(),
        &[NavEntry::List, NavEntry::License]
    );

    // Reopening the same view twice records a single entry.
    app.open_license();
    assert_eq!(app.history().len(), 2);
}

#[tokio::test]
async fn test_import_into_note_replaces_contents() {
    let (mut app, _temp) = create_test_app().await;

    let source = app.create_note().await.unwrap().id.clone();
    app.edit_note_content(&source, "Source title\nsource body".to_string())
        .await
        .unwrap();
    let (_, bytes) = app.export_note(&source).await.unwrap();

    let target = app.create_note().await.unwrap().id.clone();
    app.edit_note_content(&target, "Target".to_string())
        .await
        .unwrap();

    app.import_into_note(&target, &bytes).await.unwrap();

    let note = app.notes().iter().find(|n| n.id == target).unwrap();
    assert_eq!(note.title, "Source title");
    assert_eq!(note.content, "Source title\nsource body");
    assert_eq!(note.id, target);
}
