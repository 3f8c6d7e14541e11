//! HTTP-level tests covering the public voting flow and the admin
//! surface.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use voteboard::{create_router, AppState};
use voteboard_core::sync::{Issue, IssueAuthor, IssueSource, RepoInfo, SourceError};
use voteboard_core::Database;

const ADMIN_TOKEN: &str = "test-admin-token";

/// Issue source serving a fixed in-memory issue list.
struct FakeSource {
    issues: Mutex<Vec<Issue>>,
    repo_exists: bool,
}

impl FakeSource {
    fn new(issues: Vec<Issue>) -> Self {
        Self {
            issues: Mutex::new(issues),
            repo_exists: true,
        }
    }

    fn empty() -> Self {
        Self::new(Vec::new())
    }

    fn unreachable_repo() -> Self {
        Self {
            issues: Mutex::new(Vec::new()),
            repo_exists: false,
        }
    }
}

#[async_trait]
impl IssueSource for FakeSource {
    async fn list_open_issues(
        &self,
        _owner: &str,
        _repo: &str,
        _token: Option<&str>,
    ) -> Result<Vec<Issue>, SourceError> {
        if !self.repo_exists {
            return Err(SourceError::Status(404));
        }
        Ok(self.issues.lock().unwrap().clone())
    }

    async fn check_repo(
        &self,
        owner: &str,
        repo: &str,
        _token: Option<&str>,
    ) -> Result<RepoInfo, SourceError> {
        if !self.repo_exists {
            return Err(SourceError::Status(404));
        }
        Ok(RepoInfo {
            full_name: format!("{owner}/{repo}"),
            open_issues: self.issues.lock().unwrap().len() as i64,
        })
    }
}

fn make_server_with(source: FakeSource, admin_token: Option<&str>) -> (TestServer, Database) {
    let db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();

    let app = create_router(AppState {
        db: db.clone(),
        admin_token: admin_token.map(String::from),
        issue_source: Arc::new(source),
    });
    (TestServer::new(app).unwrap(), db)
}

fn make_server() -> (TestServer, Database) {
    make_server_with(FakeSource::empty(), Some(ADMIN_TOKEN))
}

fn admin_header() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-admin-token"),
        HeaderValue::from_static(ADMIN_TOKEN),
    )
}

async fn create_demo_project(server: &TestServer) -> Value {
    let (name, value) = admin_header();
    let response = server
        .post("/api/v1/admin/projects")
        .add_header(name, value)
        .json(&json!({
            "name": "Demo",
            "slug": "demo",
            "description": "Demo project",
            "is_active": true,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}

async fn submit_feature(server: &TestServer, title: &str) -> Value {
    let response = server
        .post("/api/v1/projects/demo/features")
        .json(&json!({ "title": title }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}

#[tokio::test]
async fn end_to_end_voting_flow() {
    let (server, _db) = make_server();
    create_demo_project(&server).await;

    let feature = submit_feature(&server, "Add dark mode support").await;
    assert_eq!(feature["status"], "submitted");
    assert_eq!(feature["vote_count"], 0);
    assert_eq!(feature["slug"], "add-dark-mode-support");

    let id = feature["id"].as_str().unwrap();
    let vote_url = format!("/api/v1/features/{id}/vote");

    let response = server
        .post(&vote_url)
        .json(&json!({ "client_id": "abc-client" }))
        .await;
    response.assert_status_ok();
    response.assert_json_contains(&json!({ "vote_count": 1, "voted": true }));

    // Same client again: absorbed, still one vote.
    let response = server
        .post(&vote_url)
        .json(&json!({ "client_id": "abc-client" }))
        .await;
    response.assert_status_ok();
    response.assert_json_contains(&json!({ "vote_count": 1, "voted": true }));

    let response = server
        .delete(&vote_url)
        .json(&json!({ "client_id": "abc-client" }))
        .await;
    response.assert_status_ok();
    response.assert_json_contains(&json!({ "vote_count": 0, "voted": false }));
}

#[tokio::test]
async fn unvoting_without_a_vote_is_a_no_op() {
    let (server, _db) = make_server();
    create_demo_project(&server).await;
    let feature = submit_feature(&server, "Add dark mode support").await;
    let id = feature["id"].as_str().unwrap();

    let response = server
        .delete(&format!("/api/v1/features/{id}/vote"))
        .json(&json!({ "client_id": "nonexistent-client" }))
        .await;
    response.assert_status_ok();
    response.assert_json_contains(&json!({ "vote_count": 0, "voted": false }));
}

#[tokio::test]
async fn submitter_client_id_casts_the_first_vote() {
    let (server, _db) = make_server();
    create_demo_project(&server).await;

    let response = server
        .post("/api/v1/projects/demo/features")
        .json(&json!({
            "title": "Ship it with my vote",
            "client_id": "submitter-123",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["data"]["vote_count"], 1);
}

#[tokio::test]
async fn short_titles_are_rejected_with_field_errors() {
    let (server, _db) = make_server();
    create_demo_project(&server).await;

    let response = server
        .post("/api/v1/projects/demo/features")
        .json(&json!({ "title": "abc" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let body = response.json::<Value>();
    assert!(body["errors"]["title"].is_array());
}

#[tokio::test]
async fn duplicate_titles_get_suffixed_slugs() {
    let (server, _db) = make_server();
    create_demo_project(&server).await;

    let first = submit_feature(&server, "My Awesome Feature").await;
    let second = submit_feature(&server, "My Awesome Feature").await;
    assert_eq!(first["slug"], "my-awesome-feature");
    assert_eq!(second["slug"], "my-awesome-feature-1");
}

#[tokio::test]
async fn inactive_projects_are_hidden_from_the_public_listing() {
    let (server, _db) = make_server();
    let project = create_demo_project(&server).await;
    let id = project["id"].as_str().unwrap();

    let (name, value) = admin_header();
    server
        .patch(&format!("/api/v1/admin/projects/{id}"))
        .add_header(name, value)
        .json(&json!({ "is_active": false }))
        .await
        .assert_status_ok();

    let listed = server.get("/api/v1/projects").await.json::<Value>();
    assert_eq!(listed["data"].as_array().unwrap().len(), 0);

    let all = server
        .get("/api/v1/projects?active_only=false")
        .await
        .json::<Value>();
    assert_eq!(all["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn feature_listing_supports_sort_and_filter() {
    let (server, _db) = make_server();
    create_demo_project(&server).await;

    let first = submit_feature(&server, "First feature").await;
    submit_feature(&server, "Second feature").await;

    let (name, value) = admin_header();
    server
        .patch(&format!(
            "/api/v1/admin/features/{}",
            first["id"].as_str().unwrap()
        ))
        .add_header(name, value)
        .json(&json!({ "status": "planned" }))
        .await
        .assert_status_ok();

    let oldest = server
        .get("/api/v1/projects/demo/features?sort=oldest")
        .await
        .json::<Value>();
    assert_eq!(oldest["data"][0]["title"], "First feature");

    let planned = server
        .get("/api/v1/projects/demo/features?status=planned")
        .await
        .json::<Value>();
    assert_eq!(planned["data"].as_array().unwrap().len(), 1);
    assert_eq!(planned["data"][0]["status"], "planned");
}

#[tokio::test]
async fn admin_endpoints_require_a_token() {
    let (server, _db) = make_server();
    let response = server
        .post("/api/v1/admin/projects")
        .json(&json!({ "name": "Nope", "slug": "nope" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    response.assert_json_contains(&json!({ "message": "Unauthorized" }));
}

#[tokio::test]
async fn admin_endpoints_reject_a_wrong_token() {
    let (server, _db) = make_server();
    let response = server
        .post("/api/v1/admin/projects")
        .add_header(
            HeaderName::from_static("x-admin-token"),
            HeaderValue::from_static("wrong-token"),
        )
        .json(&json!({ "name": "Nope", "slug": "nope" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unconfigured_admin_token_is_a_server_error() {
    let (server, _db) = make_server_with(FakeSource::empty(), None);
    let response = server
        .post("/api/v1/admin/projects")
        .add_header(
            HeaderName::from_static("x-admin-token"),
            HeaderValue::from_static("anything"),
        )
        .json(&json!({ "name": "Nope", "slug": "nope" }))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_json_contains(&json!({ "message": "Admin API token not configured" }));
}

#[tokio::test]
async fn admin_can_update_and_delete_features() {
    let (server, _db) = make_server();
    create_demo_project(&server).await;
    let feature = submit_feature(&server, "Needs triage").await;
    let id = feature["id"].as_str().unwrap();

    let (name, value) = admin_header();
    let response = server
        .patch(&format!("/api/v1/admin/features/{id}"))
        .add_header(name.clone(), value.clone())
        .json(&json!({ "status": "accepted" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["status"], "accepted");

    let response = server
        .delete(&format!("/api/v1/admin/features/{id}"))
        .add_header(name, value)
        .await;
    response.assert_status_ok();

    server
        .get(&format!("/api/v1/features/{id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_project_slugs_are_rejected() {
    let (server, _db) = make_server();
    let (name, value) = admin_header();
    let response = server
        .post("/api/v1/admin/projects")
        .add_header(name, value)
        .json(&json!({ "name": "Bad Slug", "slug": "Not A Slug" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.json::<Value>()["errors"]["slug"].is_array());
}

#[tokio::test]
async fn stats_reports_totals_and_top_features() {
    let (server, _db) = make_server();
    create_demo_project(&server).await;
    let feature = submit_feature(&server, "Popular feature").await;
    let id = feature["id"].as_str().unwrap();
    server
        .post(&format!("/api/v1/features/{id}/vote"))
        .json(&json!({ "client_id": "stats-client" }))
        .await
        .assert_status_ok();

    let (name, value) = admin_header();
    let response = server
        .get("/api/v1/admin/stats")
        .add_header(name, value)
        .await;
    response.assert_status_ok();

    let stats = response.json::<Value>();
    assert_eq!(stats["projects"]["total"], 1);
    assert_eq!(stats["projects"]["active"], 1);
    assert_eq!(stats["features"]["total"], 1);
    assert_eq!(stats["features"]["by_status"]["submitted"], 1);
    assert_eq!(stats["votes"]["total"], 1);
    assert_eq!(stats["top_features"][0]["vote_count"], 1);
    assert_eq!(stats["top_features"][0]["project"], "Demo");
}

fn github_issue(number: i64, title: &str) -> Issue {
    Issue {
        number,
        title: title.to_string(),
        body: Some("Reported upstream".into()),
        html_url: format!("https://github.com/acme/demo/issues/{number}"),
        labels: Vec::new(),
        user: Some(IssueAuthor {
            login: "octocat".into(),
        }),
        pull_request: None,
    }
}

async fn create_synced_project(server: &TestServer) -> String {
    let (name, value) = admin_header();
    let response = server
        .post("/api/v1/admin/projects")
        .add_header(name, value)
        .json(&json!({
            "name": "Demo",
            "slug": "demo",
            "github_owner": "acme",
            "github_repo": "demo",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["data"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn manual_sync_creates_then_updates() {
    let source = FakeSource::new(vec![github_issue(1, "Crash on startup")]);
    let (server, _db) = make_server_with(source, Some(ADMIN_TOKEN));
    let project_id = create_synced_project(&server).await;

    let (name, value) = admin_header();
    let sync_url = format!("/api/v1/admin/projects/{project_id}/sync");

    let response = server
        .post(&sync_url)
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    response.assert_json_contains(&json!({ "success": true, "created": 1, "updated": 0 }));

    let response = server.post(&sync_url).add_header(name, value).await;
    response.assert_status_ok();
    response.assert_json_contains(&json!({ "success": true, "created": 0, "updated": 1 }));

    let features = server
        .get("/api/v1/projects/demo/features")
        .await
        .json::<Value>();
    assert_eq!(features["data"].as_array().unwrap().len(), 1);
    assert_eq!(features["data"][0]["title"], "Crash on startup");
}

#[tokio::test]
async fn sync_failure_comes_back_as_a_structured_result() {
    let (server, _db) = make_server_with(FakeSource::unreachable_repo(), Some(ADMIN_TOKEN));
    let project_id = create_synced_project(&server).await;

    let (name, value) = admin_header();
    let response = server
        .post(&format!("/api/v1/admin/projects/{project_id}/sync"))
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["success"], false);
}

#[tokio::test]
async fn test_connection_reports_repo_accessibility() {
    let (server, _db) = make_server_with(FakeSource::empty(), Some(ADMIN_TOKEN));
    let (name, value) = admin_header();

    let response = server
        .post("/api/v1/admin/test-connection")
        .add_header(name, value)
        .json(&json!({ "github_owner": "acme", "github_repo": "demo" }))
        .await;
    response.assert_status_ok();
    response.assert_json_contains(&json!({ "success": true, "repo_name": "acme/demo" }));

    let (server, _db) = make_server_with(FakeSource::unreachable_repo(), Some(ADMIN_TOKEN));
    let (name, value) = admin_header();
    let response = server
        .post("/api/v1/admin/test-connection")
        .add_header(name, value)
        .json(&json!({ "github_owner": "acme", "github_repo": "gone" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["success"], false);
}

#[tokio::test]
async fn repair_votes_finds_nothing_after_normal_ledger_traffic() {
    let (server, _db) = make_server();
    create_demo_project(&server).await;
    let feature = submit_feature(&server, "Healthy feature").await;
    let id = feature["id"].as_str().unwrap();
    for client in ["client-one", "client-two"] {
        server
            .post(&format!("/api/v1/features/{id}/vote"))
            .json(&json!({ "client_id": client }))
            .await
            .assert_status_ok();
    }

    // The ledger keeps counts consistent, so there is no drift to fix.
    let (name, value) = admin_header();
    let response = server
        .post("/api/v1/admin/repair-votes")
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    response.assert_json_contains(&json!({ "repaired": 0 }));
}
