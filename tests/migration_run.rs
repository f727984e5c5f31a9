//! End-to-end runs against mock auth and lookup servers.

use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use entry_reconciler::{run, MigrationConfig};

// =============================================================================
// Test Helpers
// =============================================================================

fn config_for(server: &MockServer, export: &Path) -> MigrationConfig {
    MigrationConfig {
        exported_data_path: export.to_path_buf(),
        project_key: "proj".to_string(),
        api_url: format!("{}/api", server.uri()),
        auth_url: format!("{}/oauth/token", server.uri()),
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        ..Default::default()
    }
}

async fn mount_tokens(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("scope=view_categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "cat-token"})))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("scope=view_products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "prod-token"})))
        .mount(server)
        .await;
}

fn write(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string(value).unwrap()).unwrap();
}

fn read(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// =============================================================================
// Full Run
// =============================================================================

#[tokio::test]
async fn test_full_run_rewrites_tree() {
    let server = MockServer::start().await;
    mount_tokens(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/proj/categories/key=k1"))
        .and(header("authorization", "Bearer cat-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "cat-123", "key": "k1"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/proj/categories/key=bad"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/proj/products/key=p1"))
        .and(header("authorization", "Bearer prod-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "prod-9"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/proj/products/key=flaky"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let export = TempDir::new().unwrap();
    let entries = export.path().join("entries");
    let first = entries.join("blog/en-us/blog-entries.json");
    let second = entries.join("shop/shop-entries.json");
    let broken = entries.join("shop/zz-entries.json");
    let ignored = entries.join("shop/notes.json");

    write(&first, &json!({"e1": {"category": {"data": [{"key": "k1"}]}}}));
    write(
        &second,
        &json!({
            "e2": {"category": {"data": [{"key": "bad"}]}, "product": {}, "publish_details": ["x"]},
            "e3": {
                "category": {"data": [{"key": "k1"}]},
                "product": {"data": [{"key": "flaky"}, {"key": "p1", "id": "old"}]},
                "publish_details": ["y"]
            }
        }),
    );
    fs::write(&broken, "{ nope").unwrap();
    write(&ignored, &json!({"e9": {"category": {"data": [{"key": "k1"}]}}}));

    let report = run(&config_for(&server, export.path())).await.unwrap();

    assert_eq!(
        read(&first),
        json!({"e1": {"category": {"data": [{"key": "k1", "id": "cat-123"}]}}})
    );
    assert_eq!(
        read(&second),
        json!({
            "e2": {"category": {}, "product": {}, "publish_details": []},
            "e3": {
                "category": {"data": [{"key": "k1", "id": "cat-123"}]},
                "product": {"data": [{"key": "p1", "id": "prod-9"}]},
                "publish_details": ["y"]
            }
        })
    );
    assert_eq!(fs::read_to_string(&broken).unwrap(), "{ nope");
    assert_eq!(
        read(&ignored),
        json!({"e9": {"category": {"data": [{"key": "k1"}]}}})
    );

    assert_eq!(report.walk.files_processed, 2);
    assert_eq!(report.walk.files_failed, 1);
    assert_eq!(
        serde_json::to_value(&report.walk.summary).unwrap(),
        json!({
            "e1": {"categoryKey": "k1"},
            "e3": {"categoryKey": "k1", "productKey": "p1"}
        })
    );
}

// =============================================================================
// Fatal Credential Failure
// =============================================================================

#[tokio::test]
async fn test_credential_failure_touches_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "denied"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/api/.*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "x"})))
        .expect(0)
        .mount(&server)
        .await;

    let export = TempDir::new().unwrap();
    let file = export.path().join("entries/a-entries.json");
    let original = "{\"e1\":{\"category\":{\"data\":[{\"key\":\"k1\"}]},\"publish_details\":[\"x\"]}}";
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(&file, original).unwrap();

    let result = run(&config_for(&server, export.path())).await;

    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&file).unwrap(), original);
}

#[tokio::test]
async fn test_missing_entries_root_is_fatal() {
    let server = MockServer::start().await;
    mount_tokens(&server).await;

    let export = TempDir::new().unwrap();
    let result = run(&config_for(&server, export.path())).await;

    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("Entries directory not found"));
}
