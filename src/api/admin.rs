//! Admin surface, gated by a shared secret in the `X-Admin-Token`
//! header.

use axum::extract::{Path, Request, State};
use axum::http::{HeaderName, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use voteboard_core::models::{CreateProjectInput, UpdateFeatureInput, UpdateProjectInput};
use voteboard_core::sync::{self, SyncError};

use super::error::{is_valid_slug, ApiError, Validator};
use super::AppState;

pub const ADMIN_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-admin-token");

/// Reject requests that don't carry the configured admin token. The
/// comparison is constant-time so the token can't be guessed byte by
/// byte from response timing.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err(ApiError::AdminTokenMissing);
    };

    let provided = request
        .headers()
        .get(&ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if provided.is_empty() || !bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}

#[derive(Deserialize)]
pub struct StoreProjectRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub github_owner: Option<String>,
    pub github_repo: Option<String>,
    pub github_token: Option<String>,
}

fn default_active() -> bool {
    true
}

/// `POST /api/v1/admin/projects`
pub async fn create_project(
    State(state): State<AppState>,
    Json(req): Json<StoreProjectRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut v = Validator::new();
    v.length("name", &req.name, 1, 191);
    v.length("slug", &req.slug, 1, 191);
    if !is_valid_slug(&req.slug) {
        v.fail("slug", "must be lowercase letters, digits, and hyphens");
    }
    v.length_opt("description", req.description.as_deref(), 0, 5000);
    v.finish()?;

    let project = state.db.create_project(CreateProjectInput {
        name: req.name,
        slug: req.slug,
        description: req.description,
        is_active: req.is_active,
        github_owner: req.github_owner,
        github_repo: req.github_repo,
        github_token: req.github_token,
    })?;

    Ok((StatusCode::CREATED, Json(json!({ "data": project }))))
}

/// `PATCH /api/v1/admin/projects/{id}` — the slug is immutable and
/// not accepted here.
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProjectInput>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    v.length_opt("name", input.name.as_deref(), 1, 191);
    v.length_opt("description", input.description.as_deref(), 0, 5000);
    v.finish()?;

    let project = state
        .db
        .update_project(id, input)?
        .ok_or(ApiError::NotFound("Project"))?;
    Ok(Json(json!({ "data": project })))
}

/// `DELETE /api/v1/admin/projects/{id}` — cascades to features and
/// votes.
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if !state.db.delete_project(id)? {
        return Err(ApiError::NotFound("Project"));
    }
    Ok(Json(json!({ "message": "Project deleted successfully" })))
}

/// `PATCH /api/v1/admin/features/{id}` — any status may be set
/// directly; there is no transition graph.
pub async fn update_feature(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateFeatureInput>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    v.length_opt("title", input.title.as_deref(), 5, 200);
    v.length_opt("description", input.description.as_deref(), 0, 5000);
    v.finish()?;

    let feature = state
        .db
        .update_feature(id, input)?
        .ok_or(ApiError::NotFound("Feature"))?;
    Ok(Json(json!({ "data": feature })))
}

/// `DELETE /api/v1/admin/features/{id}`
pub async fn delete_feature(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if !state.db.delete_feature(id)? {
        return Err(ApiError::NotFound("Feature"));
    }
    Ok(Json(json!({ "message": "Feature deleted successfully" })))
}

/// `GET /api/v1/admin/stats`
pub async fn stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let (total_projects, active_projects) = state.db.project_counts()?;
    let mut by_status = Map::new();
    for entry in state.db.feature_counts_by_status()? {
        by_status.insert(entry.status, entry.count.into());
    }

    Ok(Json(json!({
        "projects": { "total": total_projects, "active": active_projects },
        "features": {
            "total": state.db.count_features()?,
            "by_status": by_status,
        },
        "votes": { "total": state.db.count_votes()? },
        "top_features": state.db.top_features(10)?,
    })))
}

/// `POST /api/v1/admin/projects/{id}/sync` — manual sync trigger.
/// Failures come back as a structured result; the admin may see the
/// underlying message.
pub async fn sync_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let project = state
        .db
        .get_project(id)?
        .ok_or(ApiError::NotFound("Project"))?;

    match sync::sync_project(&state.db, state.issue_source.as_ref(), &project).await {
        Ok(report) => Ok(Json(json!({
            "success": true,
            "synced": report.synced,
            "created": report.created,
            "updated": report.updated,
        }))),
        Err(SyncError::Db(e)) => Err(e.into()),
        Err(e) => Ok(Json(json!({
            "success": false,
            "message": format!("Sync failed: {e}"),
        }))),
    }
}

#[derive(Deserialize)]
pub struct TestConnectionRequest {
    pub github_owner: String,
    pub github_repo: String,
    pub github_token: Option<String>,
}

/// `POST /api/v1/admin/test-connection` — repository existence check,
/// separate from issue listing.
pub async fn test_connection(
    State(state): State<AppState>,
    Json(req): Json<TestConnectionRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let result = state
        .issue_source
        .check_repo(
            &req.github_owner,
            &req.github_repo,
            req.github_token.as_deref(),
        )
        .await;

    match result {
        Ok(info) => Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "repo_name": info.full_name,
                "open_issues": info.open_issues,
            })),
        )),
        Err(e) => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "message": format!("Repository not found or not accessible: {e}"),
            })),
        )),
    }
}

/// `POST /api/v1/admin/repair-votes` — recompute drifted vote counts.
pub async fn repair_votes(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let repaired = state.db.repair_vote_counts()?;
    Ok(Json(json!({ "repaired": repaired })))
}
