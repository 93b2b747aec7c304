use quickfill::transfer::{export_snippets, export_variables, import_snippets, import_variables};
use quickfill::{ConflictPolicy, ImportReport, QuickfillError, Snippet, Store};
use std::fs;
use tempfile::TempDir;

fn store() -> (TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path().join("quickfill.json"));
    (dir, store)
}

fn seeded() -> (TempDir, Store) {
    let (dir, store) = store();
    store.save_snippet(Snippet::new("/foo", "existing foo")).unwrap();
    store.save_snippet(Snippet::new("/foo_1", "taken")).unwrap();
    store.save_custom_variable("name", "Bob", None).unwrap();
    (dir, store)
}

const INCOMING: &str = r#"[
    {"shortcut": "/foo", "text": "imported foo"},
    {"shortcut": "/new", "text": "brand new", "category": "misc"}
]"#;

#[test]
fn keep_existing_leaves_stored_snippets_untouched() {
    let (_dir, store) = seeded();
    let before = store.load_snippets().unwrap();

    let report = import_snippets(&store, INCOMING, ConflictPolicy::KeepExisting).unwrap();

    assert_eq!(report, ImportReport { imported: 1, conflicts: 1 });
    let after = store.load_snippets().unwrap();
    assert_eq!(&after[..2], &before[..]);
    assert_eq!(after[2].shortcut, "/new");
}

#[test]
fn keep_existing_with_only_conflicts_does_not_rewrite_the_file() {
    let (_dir, store) = seeded();
    let bytes = fs::read(store.path()).unwrap();

    let report = import_snippets(
        &store,
        r#"[{"shortcut": "/foo", "text": "other"}]"#,
        ConflictPolicy::KeepExisting,
    )
    .unwrap();

    assert_eq!(report, ImportReport { imported: 0, conflicts: 1 });
    assert_eq!(fs::read(store.path()).unwrap(), bytes);
}

#[test]
fn keep_new_overwrites_conflicting_snippets() {
    let (_dir, store) = seeded();
    import_snippets(&store, INCOMING, ConflictPolicy::KeepNew).unwrap();

    let snippets = store.load_snippets().unwrap();
    assert_eq!(snippets.len(), 3);
    assert_eq!(snippets[0].text, "imported foo");
}

#[test]
fn keep_both_renames_to_the_next_free_suffix() {
    let (_dir, store) = seeded();
    let report = import_snippets(&store, INCOMING, ConflictPolicy::KeepBoth).unwrap();

    assert_eq!(report, ImportReport { imported: 2, conflicts: 1 });
    let shortcuts: Vec<_> = store
        .load_snippets()
        .unwrap()
        .into_iter()
        .map(|s| s.shortcut)
        .collect();
    assert_eq!(shortcuts, vec!["/foo", "/foo_1", "/foo_2", "/new"]);
}

#[test]
fn malformed_files_change_nothing() {
    let (_dir, store) = seeded();
    let bytes = fs::read(store.path()).unwrap();

    for bad in [
        r#"{"shortcut": "/x", "text": "not an array"}"#,
        r#"[{"shortcut": "/x"}]"#,
        "not json",
    ] {
        let err = import_snippets(&store, bad, ConflictPolicy::KeepNew).unwrap_err();
        assert!(matches!(err, QuickfillError::InvalidImport(_)), "{}", bad);
    }
    let err = import_variables(&store, "[1, 2]", ConflictPolicy::KeepNew).unwrap_err();
    assert!(matches!(err, QuickfillError::InvalidImport(_)));

    assert_eq!(fs::read(store.path()).unwrap(), bytes);
}

#[test]
fn export_then_import_into_an_empty_store() {
    let (_dir, source) = seeded();
    let snippets_json = export_snippets(&source.load_snippets().unwrap()).unwrap();
    let variables_json = export_variables(&source.load_custom_variables().unwrap()).unwrap();

    let (_other, target) = store();
    let report = import_snippets(&target, &snippets_json, ConflictPolicy::KeepExisting).unwrap();
    assert_eq!(report, ImportReport { imported: 2, conflicts: 0 });
    import_variables(&target, &variables_json, ConflictPolicy::KeepExisting).unwrap();

    assert_eq!(target.load_snippets().unwrap(), source.load_snippets().unwrap());
    assert_eq!(target.load_custom_variables().unwrap()["name"], "Bob");
}

#[test]
fn variable_import_policies() {
    let (_dir, store) = seeded();
    let incoming = r#"{"name": "Ann", "team": "core"}"#;

    let report = import_variables(&store, incoming, ConflictPolicy::KeepExisting).unwrap();
    assert_eq!(report, ImportReport { imported: 1, conflicts: 1 });
    assert_eq!(store.load_custom_variables().unwrap()["name"], "Bob");

    import_variables(&store, incoming, ConflictPolicy::KeepNew).unwrap();
    assert_eq!(store.load_custom_variables().unwrap()["name"], "Ann");
}

#[test]
fn snippets_with_blank_shortcuts_are_not_imported() {
    let (_dir, store) = seeded();
    let bytes = fs::read(store.path()).unwrap();

    let err = import_snippets(
        &store,
        r#"[{"shortcut": "", "text": "a"}, {"shortcut": "  ", "text": "b"}]"#,
        ConflictPolicy::KeepExisting,
    )
    .unwrap_err();

    assert!(matches!(err, QuickfillError::InvalidImport(_)));
    assert_eq!(fs::read(store.path()).unwrap(), bytes);
    assert!(store
        .load_snippets()
        .unwrap()
        .iter()
        .all(|s| !s.shortcut.trim().is_empty()));
}
