//! Integration tests for the ToolHub backend.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::auth::testing::MockIdentityProvider;
use crate::auth::SessionGateway;
use crate::db::{init_database, Repository, RoleStore};
use crate::storage::MemoryBlobStore;
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    admin_token: String,
    user_token: String,
    blobs: Arc<MemoryBlobStore>,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool.clone()));
        let roles = Arc::new(RoleStore::new(pool));

        repo.bootstrap_default_categories()
            .await
            .expect("Failed to seed categories");

        // Pre-provisioned accounts and a federated credential at the mock
        // identity provider
        let provider = Arc::new(
            MockIdentityProvider::new()
                .with_account("admin@example.com", "admin-pass", "admin-1")
                .with_account("user@example.com", "user-pass", "user-1")
                .with_google_token("google-credential", "g-1", "google@example.com"),
        );
        roles
            .set_admin("admin-1", true)
            .await
            .expect("Failed to grant admin");

        let blobs = Arc::new(MemoryBlobStore::new());

        let gateway = Arc::new(SessionGateway::new(provider.clone(), roles.clone()));
        tokio::spawn(gateway.clone().run());

        let state = AppState {
            repo,
            roles,
            gateway,
            provider,
            blobs: blobs.clone(),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let client = Client::new();

        // Sign both accounts in over HTTP to obtain bearer tokens
        let admin_token = sign_in(&client, &base_url, "admin@example.com", "admin-pass").await;
        let user_token = sign_in(&client, &base_url, "user@example.com", "user-pass").await;

        TestFixture {
            client,
            base_url,
            admin_token,
            user_token,
            blobs,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a JSON body as the admin account.
    async fn post_as_admin(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(&self.admin_token)
            .json(body)
            .send()
            .await
            .unwrap()
    }

    async fn create_tool(&self, body: &Value) -> Value {
        let resp = self.post_as_admin("/api/tools", body).await;
        assert_eq!(resp.status(), 200);
        resp.json().await.unwrap()
    }
}

async fn sign_in(client: &Client, base_url: &str, email: &str, password: &str) -> String {
    let resp = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    body["data"]["idToken"].as_str().unwrap().to_string()
}

fn sample_tool() -> Value {
    json!({
        "name": "Alpha Writer",
        "description": "An AI writing assistant",
        "category": "content",
        "pricing": "free",
        "features": ["Drafting", "Rewriting"]
    })
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_tool_crud() {
    let fixture = TestFixture::new().await;

    // Create: slug is derived from the name when omitted
    let create_body = fixture.create_tool(&sample_tool()).await;
    assert_eq!(create_body["success"], true);
    let tool_id = create_body["data"]["id"].as_str().unwrap();
    assert_eq!(create_body["data"]["slug"], "alpha-writer");
    assert_eq!(create_body["data"]["rating"], 0.0);
    assert_eq!(create_body["data"]["reviews"].as_array().unwrap().len(), 0);

    // Get by id
    let get_resp = fixture
        .client
        .get(fixture.url(&format!("/api/tools/{}", tool_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_resp.status(), 200);
    let get_body: Value = get_resp.json().await.unwrap();
    assert_eq!(get_body["data"]["name"], "Alpha Writer");

    // Get by slug
    let slug_resp = fixture
        .client
        .get(fixture.url("/api/tools/slug/alpha-writer"))
        .send()
        .await
        .unwrap();
    assert_eq!(slug_resp.status(), 200);
    let slug_body: Value = slug_resp.json().await.unwrap();
    assert_eq!(slug_body["data"]["id"].as_str().unwrap(), tool_id);

    // Partial update preserves untouched fields
    let update_resp = fixture
        .client
        .put(fixture.url(&format!("/api/tools/{}", tool_id)))
        .bearer_auth(&fixture.admin_token)
        .json(&json!({ "pricing": "paid" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 200);
    let update_body: Value = update_resp.json().await.unwrap();
    assert_eq!(update_body["data"]["pricing"], "paid");
    assert_eq!(update_body["data"]["name"], "Alpha Writer");
    assert_eq!(update_body["data"]["category"], "content");

    // List
    let list_resp = fixture
        .client
        .get(fixture.url("/api/tools"))
        .send()
        .await
        .unwrap();
    assert_eq!(list_resp.status(), 200);
    let list_body: Value = list_resp.json().await.unwrap();
    assert_eq!(list_body["data"].as_array().unwrap().len(), 1);

    // Delete, twice: idempotent
    for _ in 0..2 {
        let delete_resp = fixture
            .client
            .delete(fixture.url(&format!("/api/tools/{}", tool_id)))
            .bearer_auth(&fixture.admin_token)
            .send()
            .await
            .unwrap();
        assert_eq!(delete_resp.status(), 200);
    }

    // Verify deleted
    let get_deleted = fixture
        .client
        .get(fixture.url(&format!("/api/tools/{}", tool_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_deleted.status(), 404);
}

#[tokio::test]
async fn test_duplicate_slug_rejected() {
    let fixture = TestFixture::new().await;

    fixture.create_tool(&sample_tool()).await;

    // Same name derives the same slug
    let resp = fixture.post_as_admin("/api/tools", &sample_tool()).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_slug_check_excludes_self_on_edit() {
    let fixture = TestFixture::new().await;

    let created = fixture.create_tool(&sample_tool()).await;
    let tool_id = created["data"]["id"].as_str().unwrap();

    // Re-submitting the tool's own slug during edit is not a conflict
    let update_resp = fixture
        .client
        .put(fixture.url(&format!("/api/tools/{}", tool_id)))
        .bearer_auth(&fixture.admin_token)
        .json(&json!({ "slug": "alpha-writer", "description": "Updated" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 200);

    // Moving onto another tool's slug is
    let other = fixture
        .create_tool(&json!({
            "name": "Beta Painter",
            "description": "An AI image tool",
            "category": "design",
            "pricing": "freemium"
        }))
        .await;
    let other_id = other["data"]["id"].as_str().unwrap();

    let conflict_resp = fixture
        .client
        .put(fixture.url(&format!("/api/tools/{}", other_id)))
        .bearer_auth(&fixture.admin_token)
        .json(&json!({ "slug": "alpha-writer" }))
        .send()
        .await
        .unwrap();
    assert_eq!(conflict_resp.status(), 400);
}

#[tokio::test]
async fn test_update_trims_slug_before_storing() {
    let fixture = TestFixture::new().await;

    let created = fixture.create_tool(&sample_tool()).await;
    let tool_id = created["data"]["id"].as_str().unwrap();

    let update_resp = fixture
        .client
        .put(fixture.url(&format!("/api/tools/{}", tool_id)))
        .bearer_auth(&fixture.admin_token)
        .json(&json!({ "slug": "  alpha-writer-v2  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 200);
    let update_body: Value = update_resp.json().await.unwrap();
    assert_eq!(update_body["data"]["slug"], "alpha-writer-v2");

    // The trimmed form is what the slug lookup resolves
    let slug_resp = fixture
        .client
        .get(fixture.url("/api/tools/slug/alpha-writer-v2"))
        .send()
        .await
        .unwrap();
    assert_eq!(slug_resp.status(), 200);
}

#[tokio::test]
async fn test_feature_list_sanitation() {
    let fixture = TestFixture::new().await;

    let body = fixture
        .create_tool(&json!({
            "name": "Gamma Helper",
            "description": "Does things",
            "category": "productivity",
            "pricing": "paid",
            "features": ["", "Fast", "  ", "Cheap"]
        }))
        .await;

    let features = body["data"]["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0], "Fast");
    assert_eq!(features[1], "Cheap");
}

#[tokio::test]
async fn test_validation_errors() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .post_as_admin(
            "/api/tools",
            &json!({
                "name": "",
                "description": "x",
                "category": "content",
                "pricing": "free"
            }),
        )
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_categories() {
    let fixture = TestFixture::new().await;

    // Bootstrap seeded the default set
    let list_resp = fixture
        .client
        .get(fixture.url("/api/categories"))
        .send()
        .await
        .unwrap();
    let list_body: Value = list_resp.json().await.unwrap();
    let names = list_body["data"].as_array().unwrap();
    assert_eq!(names.len(), 6);
    assert!(names.contains(&json!("productivity")));

    // Add a new one
    let add_resp = fixture
        .post_as_admin("/api/categories", &json!({ "name": "Video" }))
        .await;
    assert_eq!(add_resp.status(), 200);

    // Duplicate check is case-insensitive
    let dup_resp = fixture
        .post_as_admin("/api/categories", &json!({ "name": "video" }))
        .await;
    assert_eq!(dup_resp.status(), 400);
    let dup_body: Value = dup_resp.json().await.unwrap();
    assert_eq!(dup_body["error"]["code"], "VALIDATION_ERROR");

    // Delete, twice: absent is a no-op
    for _ in 0..2 {
        let delete_resp = fixture
            .client
            .delete(fixture.url("/api/categories/Video"))
            .bearer_auth(&fixture.admin_token)
            .send()
            .await
            .unwrap();
        assert_eq!(delete_resp.status(), 200);
    }

    let after: Value = fixture
        .client
        .get(fixture.url("/api/categories"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after["data"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_login_failures_are_classified() {
    let fixture = TestFixture::new().await;

    let wrong_password = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "email": "admin@example.com", "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_password.status(), 401);
    let body: Value = wrong_password.json().await.unwrap();
    assert_eq!(body["error"]["code"], "WRONG_CREDENTIAL");

    let unknown = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "email": "ghost@example.com", "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), 401);
    let body: Value = unknown.json().await.unwrap();
    assert_eq!(body["error"]["code"], "ACCOUNT_NOT_FOUND");

    let invalid = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "email": "not-an-email", "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status(), 400);
    let body: Value = invalid.json().await.unwrap();
    assert_eq!(body["error"]["code"], "INVALID_EMAIL");
}

#[tokio::test]
async fn test_google_sign_in_creates_session_and_role() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/auth/google"))
        .json(&json!({ "idpToken": "google-credential" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["user"]["uid"], "g-1");
    assert_eq!(body["data"]["user"]["email"], "google@example.com");
    assert_eq!(body["data"]["role"]["isAdmin"], false);

    // The exchanged token is a live session
    let token = body["data"]["idToken"].as_str().unwrap();
    let session_resp = fixture
        .client
        .get(fixture.url("/api/auth/session"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(session_resp.status(), 200);
    let session_body: Value = session_resp.json().await.unwrap();
    assert_eq!(session_body["data"]["user"]["uid"], "g-1");
}

#[tokio::test]
async fn test_google_sign_in_rejects_unknown_credential() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/auth/google"))
        .json(&json!({ "idpToken": "forged-credential" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "AUTH_FAILED");
}

#[tokio::test]
async fn test_register_creates_default_role() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/auth/register"))
        .json(&json!({ "email": "new@example.com", "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["role"]["isAdmin"], false);
    assert!(body["data"]["idToken"].is_string());

    // The session endpoint resolves the token back to the same account
    let token = body["data"]["idToken"].as_str().unwrap();
    let session_resp = fixture
        .client
        .get(fixture.url("/api/auth/session"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(session_resp.status(), 200);
    let session_body: Value = session_resp.json().await.unwrap();
    assert_eq!(session_body["data"]["user"]["email"], "new@example.com");
    assert_eq!(session_body["data"]["role"]["isAdmin"], false);
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/tools"))
        .json(&sample_tool())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    // Reads stay public
    let list_resp = fixture
        .client
        .get(fixture.url("/api/tools"))
        .send()
        .await
        .unwrap();
    assert_eq!(list_resp.status(), 200);
}

#[tokio::test]
async fn test_admin_routes_deny_non_admin_with_email() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/tools"))
        .bearer_auth(&fixture.user_token)
        .json(&sample_tool())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "ACCESS_DENIED");
    assert_eq!(body["error"]["details"]["email"], "user@example.com");
}

#[tokio::test]
async fn test_promote_grants_admin() {
    let fixture = TestFixture::new().await;

    // Non-admins cannot promote
    let denied = fixture
        .client
        .post(fixture.url("/api/auth/promote"))
        .bearer_auth(&fixture.user_token)
        .json(&json!({ "accountId": "user-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), 403);

    let resp = fixture
        .post_as_admin("/api/auth/promote", &json!({ "accountId": "user-1" }))
        .await;
    assert_eq!(resp.status(), 200);

    // The promoted account can now write
    let create_resp = fixture
        .client
        .post(fixture.url("/api/tools"))
        .bearer_auth(&fixture.user_token)
        .json(&sample_tool())
        .send()
        .await
        .unwrap();
    assert_eq!(create_resp.status(), 200);
}

#[tokio::test]
async fn test_logo_upload_persists_url() {
    let fixture = TestFixture::new().await;

    let created = fixture.create_tool(&sample_tool()).await;
    let tool_id = created["data"]["id"].as_str().unwrap();

    let resp = fixture
        .client
        .post(fixture.url(&format!("/api/tools/{}/logo", tool_id)))
        .bearer_auth(&fixture.admin_token)
        .body(vec![0u8; 16])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let url = body["data"].as_str().unwrap();
    assert_eq!(url, format!("memory://tools/{}/logo", tool_id));
    assert!(fixture.blobs.contains(&format!("tools/{}/logo", tool_id)));

    let tool: Value = fixture
        .client
        .get(fixture.url(&format!("/api/tools/{}", tool_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tool["data"]["logo"], url);
}

#[tokio::test]
async fn test_screenshot_upload_appends_url() {
    let fixture = TestFixture::new().await;

    let created = fixture.create_tool(&sample_tool()).await;
    let tool_id = created["data"]["id"].as_str().unwrap();

    for index in 0..2 {
        let resp = fixture
            .client
            .post(fixture.url(&format!(
                "/api/tools/{}/screenshots/{}",
                tool_id, index
            )))
            .bearer_auth(&fixture.admin_token)
            .body(vec![0u8; 16])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let tool: Value = fixture
        .client
        .get(fixture.url(&format!("/api/tools/{}", tool_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let screenshots = tool["data"]["screenshots"].as_array().unwrap();
    assert_eq!(screenshots.len(), 2);
    assert_eq!(
        screenshots[0],
        format!("memory://tools/{}/screenshot-0", tool_id)
    );
}

#[tokio::test]
async fn test_upload_for_missing_tool_is_not_found() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/tools/no-such-id/logo"))
        .bearer_auth(&fixture.admin_token)
        .body(vec![0u8; 16])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
