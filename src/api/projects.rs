use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::ApiError;
use super::AppState;

#[derive(Deserialize)]
pub struct ListProjectsParams {
    #[serde(default = "default_active_only")]
    pub active_only: bool,
}

fn default_active_only() -> bool {
    true
}

/// `GET /api/v1/projects` — public listing, active projects by
/// default.
pub async fn list_projects(
    State(state): State<AppState>,
    Query(params): Query<ListProjectsParams>,
) -> Result<Json<Value>, ApiError> {
    let projects = state.db.list_projects(params.active_only)?;
    Ok(Json(json!({ "data": projects })))
}
