use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::error::{ApiError, Validator};
use super::AppState;

#[derive(Deserialize)]
pub struct VoteRequest {
    pub client_id: String,
}

fn validate(req: &VoteRequest) -> Result<(), ApiError> {
    let mut v = Validator::new();
    v.length("client_id", &req.client_id, 5, 100);
    v.finish()
}

/// `POST /api/v1/features/{id}/vote` — idempotent; a repeat vote from
/// the same client is absorbed, not rejected.
pub async fn cast_vote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<Value>, ApiError> {
    validate(&req)?;
    let feature = state
        .db
        .get_feature(id)?
        .ok_or(ApiError::NotFound("Feature"))?;

    state.db.add_vote(feature.id, &req.client_id)?;
    let vote_count = state
        .db
        .get_feature(feature.id)?
        .map(|f| f.vote_count)
        .unwrap_or_default();

    Ok(Json(json!({
        "feature_id": feature.id,
        "vote_count": vote_count,
        "voted": true,
    })))
}

/// `DELETE /api/v1/features/{id}/vote` — idempotent no-op when the
/// client never voted.
pub async fn remove_vote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<Value>, ApiError> {
    validate(&req)?;
    let feature = state
        .db
        .get_feature(id)?
        .ok_or(ApiError::NotFound("Feature"))?;

    state.db.remove_vote(feature.id, &req.client_id)?;
    let vote_count = state
        .db
        .get_feature(feature.id)?
        .map(|f| f.vote_count)
        .unwrap_or_default();

    Ok(Json(json!({
        "feature_id": feature.id,
        "vote_count": vote_count,
        "voted": false,
    })))
}
