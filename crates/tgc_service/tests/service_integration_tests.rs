//! Router tests against on-disk bundles and the mock engine.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tempfile::{tempdir, TempDir};
use tgc_catalog::VersionIndex;
use tgc_packager::{read_entries, AssetLayout, MockEngine};
use tgc_service::{build_router, ServiceState};
use tower::ServiceExt;

const CATALOG: &str = r#"{
    "platforms": [{"name": "docker-compose", "description": "Docker Compose"}],
    "templates": [
        {"name": "1.8", "description": "Current", "version": "1.8.12", "status": "stable"},
        {"name": "1.9", "description": "Next", "version": "1.9.2", "status": "unstable"}
    ]
}"#;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn app() -> (TempDir, Router) {
    let dir = tempdir().unwrap();
    let layout = AssetLayout::new(dir.path().join("templates"), dir.path().join("resources"));
    let templates = layout.templates_dir.clone();
    let resources = layout.resources_dir.clone();

    write(
        &templates,
        "1.8/trustgraph-config.jsonnet",
        r#"{"flows": {"$import": "config.json"}}"#,
    );
    write(
        &templates,
        "1.8/config-to-docker-compose.jsonnet",
        r#"{"services": {"api": {"image": "trustgraph/api"}}}"#,
    );
    write(
        &templates,
        "1.9/config-to-docker-compose.jsonnet",
        r#"{"services": {"$import": "missing.jsonnet"}}"#,
    );
    write(&resources, "dialog/trustgraph-flow.yaml", "steps: []\n");
    write(&resources, "dialog/trustgraph-output.jsonata", "$");
    write(&resources, "dialog/trustgraph-docs.yaml", "docs: []\n");
    write(&resources, "dialog/docs/llm/vertexai.md", "# VertexAI\n");
    write(&resources, "secret.txt", "do not serve");

    let index = VersionIndex::from_json(CATALOG).unwrap();
    let state = ServiceState::new(index, layout, Arc::new(MockEngine::new()));
    (dir, build_router(state))
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("router response")
}

async fn get(app: Router, uri: &str) -> Response {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post(app: Router, uri: &str, body: &str) -> Response {
    let request = Request::post(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

#[tokio::test]
async fn test_generate_returns_archive() {
    let (_dir, app) = app();
    let response = post(app, "/api/generate/docker-compose/1.8", r#"[{"name": "pulsar"}]"#).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/octet-stream");

    let entries = read_entries(&body_bytes(response).await).unwrap();
    assert_eq!(entries[0].0, "docker-compose.yaml");
    assert_eq!(entries[1].0, "trustgraph/config.json");
    let config: Value = serde_json::from_slice(&entries[1].1).unwrap();
    assert_eq!(config["flows"][0]["name"], "pulsar");
}

#[tokio::test]
async fn test_generate_rejects_bad_json() {
    let (_dir, app) = app();
    let response = post(app, "/api/generate/docker-compose/1.8", "{ invalid json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_selection_errors_are_client_errors() {
    let (_dir, app) = app();

    let response = post(app.clone(), "/api/generate/docker-compose/7.0", "[]").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post(app.clone(), "/api/generate/invalid-platform/1.8", "[]").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let message = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(message.contains("invalid-platform"));

    let response = post(app, "/api/generate/docker-compose", "[]").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_internal_failure_hides_detail() {
    let (_dir, app) = app();
    let response = post(app, "/api/generate/docker-compose/1.9", "[]").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_latest_endpoints() {
    let (_dir, app) = app();

    let latest: Value = serde_json::from_slice(&body_bytes(get(app.clone(), "/api/latest").await).await).unwrap();
    assert_eq!(latest, serde_json::json!({"template": "1.9", "version": "1.9.2"}));

    let stable: Value =
        serde_json::from_slice(&body_bytes(get(app, "/api/latest-stable").await).await).unwrap();
    assert_eq!(stable, serde_json::json!({"template": "1.8", "version": "1.8.12"}));
}

#[tokio::test]
async fn test_versions_lists_catalog() {
    let (_dir, app) = app();
    let versions: Value =
        serde_json::from_slice(&body_bytes(get(app, "/api/versions").await).await).unwrap();

    assert_eq!(versions.as_array().unwrap().len(), 2);
    assert_eq!(
        versions[0],
        serde_json::json!({
            "template": "1.8",
            "version": "1.8.12",
            "description": "Current",
            "status": "stable"
        })
    );
}

#[tokio::test]
async fn test_dialog_resources() {
    let (_dir, app) = app();

    let response = get(app.clone(), "/api/dialog-flow").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/x-yaml");
    assert_eq!(body_bytes(response).await, b"steps: []\n");

    let response = get(app.clone(), "/api/config-prepare").await;
    assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");

    let response = get(app.clone(), "/api/docs-manifest").await;
    assert_eq!(body_bytes(response).await, b"docs: []\n");

    let response = get(app, "/api/docs/llm/vertexai.md").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "text/markdown");
    assert_eq!(body_bytes(response).await, b"# VertexAI\n");
}

#[tokio::test]
async fn test_docs_traversal_and_missing_files_are_not_found() {
    let (_dir, app) = app();

    let response = get(app.clone(), "/api/docs/llm/../../../secret.txt").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(app, "/api/docs/llm/absent.md").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
