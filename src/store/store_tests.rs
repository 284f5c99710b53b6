use super::*;
use crate::model::{RoleType, Tier};
use std::time::{Duration, SystemTime};

fn open_store(limits: StoreLimits) -> (tempfile::TempDir, DocumentStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = DocumentStore::new(DataPaths::new(dir.path().to_path_buf()), limits);
    store.init().expect("init store");
    (dir, store)
}

fn set_mtime(store: &DocumentStore, name: &str, when: SystemTime) {
    let file = fs::File::options()
        .write(true)
        .open(store.paths().document_path(name))
        .expect("open document");
    file.set_modified(when).expect("set mtime");
}

#[test]
fn save_then_load_is_deep_equal() {
    let (_dir, store) = open_store(StoreLimits::default());
    let mut doc = ConfigDocument::example();
    doc.set_capability_tier(
        "人火葬",
        Tier::Secondary,
        vec!["パート短".to_string(), "パート長".to_string()],
    )
    .expect("reorder tier");
    doc.add_role("夜勤", RoleType::PartTimer).expect("add role");
    store.save("main", &doc).expect("save");
    let loaded = store.load("main").expect("load");
    assert_eq!(loaded, doc);
    assert_eq!(
        loaded.capability("人火葬").expect("capability").secondary,
        vec!["パート短", "パート長"]
    );
}

#[test]
fn list_is_sorted_and_excludes_staging() {
    let (_dir, store) = open_store(StoreLimits::default());
    let doc = ConfigDocument::example();
    store.save("b", &doc).expect("save b");
    store.save("a", &doc).expect("save a");
    store.save(STAGING_NAME, &doc).expect("stage");
    assert_eq!(store.list().expect("list"), vec!["a", "b"]);
    assert!(store.paths().staging_path().is_file());
    assert_eq!(store.load(STAGING_NAME).expect("load staging"), doc);
}

#[test]
fn missing_document_is_not_found() {
    let (_dir, store) = open_store(StoreLimits::default());
    assert_eq!(store.load("nope").expect_err("missing").kind(), "NotFound");
    assert_eq!(store.delete("nope").expect_err("missing").kind(), "NotFound");
}

#[test]
fn delete_removes_document() {
    let (_dir, store) = open_store(StoreLimits::default());
    store.save("gone", &ConfigDocument::example()).expect("save");
    store.delete("gone").expect("delete");
    assert!(store.list().expect("list").is_empty());
    assert!(!store.exists("gone").expect("exists"));
}

#[test]
fn staging_slot_cannot_be_deleted() {
    let (_dir, store) = open_store(StoreLimits::default());
    let err = store.delete(STAGING_NAME).expect_err("reserved");
    assert_eq!(err.kind(), "InvalidName");
}

#[test]
fn unsafe_names_are_rejected() {
    let (_dir, store) = open_store(StoreLimits::default());
    let doc = ConfigDocument::example();
    for name in ["", "  ", "../escape", "a/b", "a\\b", ".hidden", "x..y"] {
        let err = store.save(name, &doc).expect_err("unsafe name");
        assert_eq!(err.kind(), "InvalidName", "name {name:?}");
    }
    validate_name("2025年度 本番").expect("spaces and CJK are fine");
}

#[test]
fn malformed_file_is_a_schema_error() {
    let (_dir, store) = open_store(StoreLimits::default());
    fs::write(store.paths().document_path("broken"), b"{not json").expect("write");
    assert_eq!(store.load("broken").expect_err("schema").kind(), "Schema");
}

#[test]
fn thirty_first_save_evicts_least_recently_modified() {
    let (_dir, store) = open_store(StoreLimits {
        max_documents: 30,
        max_document_age_days: 90,
    });
    let doc = ConfigDocument::example();
    let base = SystemTime::now() - Duration::from_secs(3600);
    for index in 0..30u64 {
        let name = format!("doc{index:02}");
        store.save(&name, &doc).expect("save");
        set_mtime(&store, &name, base + Duration::from_secs(index));
    }
    assert_eq!(store.list().expect("list").len(), 30);

    store.save("doc30", &doc).expect("save 31st");
    let names = store.list().expect("list");
    assert_eq!(names.len(), 30);
    assert!(!names.contains(&"doc00".to_string()));
    assert!(names.contains(&"doc01".to_string()));
    assert!(names.contains(&"doc30".to_string()));
}

#[test]
fn stale_documents_expire_and_zero_disables_expiry() {
    let day = Duration::from_secs(24 * 60 * 60);
    let (_dir, store) = open_store(StoreLimits {
        max_documents: 30,
        max_document_age_days: 90,
    });
    let doc = ConfigDocument::example();
    store.save("ancient", &doc).expect("save");
    set_mtime(&store, "ancient", SystemTime::now() - day * 120);
    store.save("fresh", &doc).expect("save");
    assert_eq!(store.list().expect("list"), vec!["fresh"]);

    let (_dir, store) = open_store(StoreLimits {
        max_documents: 30,
        max_document_age_days: 0,
    });
    store.save("ancient", &doc).expect("save");
    set_mtime(&store, "ancient", SystemTime::now() - day * 120);
    store.save("fresh", &doc).expect("save");
    assert_eq!(store.list().expect("list"), vec!["ancient", "fresh"]);
}

#[test]
fn retention_never_touches_staging_slot() {
    let (_dir, store) = open_store(StoreLimits {
        max_documents: 1,
        max_document_age_days: 0,
    });
    let doc = ConfigDocument::example();
    store.save(STAGING_NAME, &doc).expect("stage");
    store.save("one", &doc).expect("save one");
    store.save("two", &doc).expect("save two");
    assert_eq!(store.list().expect("list"), vec!["two"]);
    assert!(store.paths().staging_path().is_file());
}
