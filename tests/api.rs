use quickfill::server::routes;
use quickfill::{AppState, EngineConfig, ImportReport, Services, Snippet, Store};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

fn state() -> (TempDir, Arc<AppState>) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(Store::new(dir.path().join("quickfill.json")));
    let state = AppState::new(store, Services::system(), EngineConfig::default()).unwrap();
    (dir, Arc::new(state))
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> Envelope<T> {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn health_check() {
    let (_dir, state) = state();
    let response = warp::test::request()
        .path("/health")
        .reply(&routes(state))
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.body(), "Quickfill API is running");
}

#[tokio::test]
async fn snippet_crud_round_trip() {
    let (_dir, state) = state();
    let api = routes(Arc::clone(&state));

    let created = warp::test::request()
        .method("POST")
        .path("/api/snippets")
        .json(&json!({"shortcut": "/sig", "text": "Regards", "category": "mail"}))
        .reply(&api)
        .await;
    let created: Envelope<Snippet> = parse(created.body());
    assert!(created.success);
    let mut snippet = created.data.unwrap();
    assert!(!snippet.id.is_empty());

    snippet.text = "Best regards".to_string();
    let updated = warp::test::request()
        .method("PUT")
        .path("/api/snippets")
        .json(&snippet)
        .reply(&api)
        .await;
    assert!(parse::<Snippet>(updated.body()).success);

    let listed = warp::test::request().path("/api/snippets").reply(&api).await;
    let listed: Envelope<Vec<Snippet>> = parse(listed.body());
    assert_eq!(listed.data.unwrap()[0].text, "Best regards");

    let categories = warp::test::request().path("/api/categories").reply(&api).await;
    let categories: Envelope<Vec<String>> = parse(categories.body());
    assert_eq!(categories.data.unwrap(), vec!["mail"]);

    let deleted = warp::test::request()
        .method("DELETE")
        .path(&format!("/api/snippets?id={}", snippet.id))
        .reply(&api)
        .await;
    assert!(parse::<()>(deleted.body()).success);
    assert!(state.store.load_snippets().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_shortcuts_come_back_as_errors() {
    let (_dir, state) = state();
    let api = routes(state);

    warp::test::request()
        .method("POST")
        .path("/api/snippets")
        .json(&json!({"shortcut": "/a", "text": "x"}))
        .reply(&api)
        .await;
    let second = warp::test::request()
        .method("POST")
        .path("/api/snippets")
        .json(&json!({"shortcut": "/a", "text": "y"}))
        .reply(&api)
        .await;
    let second: Envelope<Snippet> = parse(second.body());
    assert!(!second.success);
    assert!(second.error.unwrap().contains("/a"));
}

#[tokio::test]
async fn expand_sees_variables_saved_through_the_api() {
    let (_dir, state) = state();
    let api = routes(state);

    let saved = warp::test::request()
        .method("PUT")
        .path("/api/variables")
        .json(&json!({"name": "{name}", "value": "Bob"}))
        .reply(&api)
        .await;
    assert!(parse::<()>(saved.body()).success);

    let mut expanded = String::new();
    for _ in 0..50 {
        let response = warp::test::request()
            .method("POST")
            .path("/api/expand")
            .json(&json!({"template": "Hi {name}, [uppercase:welcome]"}))
            .reply(&api)
            .await;
        expanded = parse::<String>(response.body()).data.unwrap();
        if !expanded.contains("{name}") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(expanded, "Hi Bob, WELCOME");
}

#[tokio::test]
async fn import_and_export_over_http() {
    let (_dir, state) = state();
    state
        .store
        .save_snippet(Snippet::new("/foo", "kept"))
        .unwrap();
    let api = routes(Arc::clone(&state));

    let imported = warp::test::request()
        .method("POST")
        .path("/api/import/snippets?policy=keep-both")
        .body(r#"[{"shortcut": "/foo", "text": "incoming"}]"#)
        .reply(&api)
        .await;
    let imported: Envelope<ImportReport> = parse(imported.body());
    assert_eq!(
        imported.data.unwrap(),
        ImportReport {
            imported: 1,
            conflicts: 1
        }
    );

    let exported = warp::test::request()
        .path("/api/export/snippets")
        .reply(&api)
        .await;
    let exported: Envelope<String> = parse(exported.body());
    let snippets: Vec<Snippet> = serde_json::from_str(&exported.data.unwrap()).unwrap();
    let shortcuts: Vec<_> = snippets.iter().map(|s| s.shortcut.as_str()).collect();
    assert_eq!(shortcuts, vec!["/foo", "/foo_1"]);

    let rejected = warp::test::request()
        .method("POST")
        .path("/api/import/variables?policy=sideways")
        .body(r#"{"a": "b"}"#)
        .reply(&api)
        .await;
    assert!(!parse::<ImportReport>(rejected.body()).success);
}

#[tokio::test]
async fn import_bodies_must_be_utf8() {
    let (_dir, state) = state();
    let api = routes(Arc::clone(&state));

    let mut body = br#"[{"shortcut": "/x", "text": ""#.to_vec();
    body.extend_from_slice(&[0xff, 0xfe]);
    body.extend_from_slice(br#""}]"#);

    let response = warp::test::request()
        .method("POST")
        .path("/api/import/snippets")
        .body(body)
        .reply(&api)
        .await;
    let response: Envelope<ImportReport> = parse(response.body());
    assert!(!response.success);
    assert!(response.error.unwrap().contains("UTF-8"));
    assert!(state.store.load_snippets().unwrap().is_empty());

    let response = warp::test::request()
        .method("POST")
        .path("/api/import/variables")
        .body(vec![0xffu8, 0xfe])
        .reply(&api)
        .await;
    assert!(!parse::<ImportReport>(response.body()).success);
}
