use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use voteboard_core::models::{CreateFeatureInput, FeatureQuery, FeatureSort, FeatureStatus};

use super::error::{ApiError, Validator};
use super::AppState;

const MAX_PAGE_SIZE: u32 = 100;

#[derive(Deserialize)]
pub struct ListFeaturesParams {
    pub sort: Option<String>,
    /// Comma-separated status names; unknown names are ignored.
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListFeaturesParams {
    fn to_query(&self) -> FeatureQuery {
        let statuses = self
            .status
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| FeatureStatus::from_str(s.trim()))
            .collect();
        FeatureQuery {
            statuses,
            sort: self
                .sort
                .as_deref()
                .map(FeatureSort::from_key)
                .unwrap_or_default(),
            limit: self.limit.unwrap_or(20).min(MAX_PAGE_SIZE),
            offset: self.offset.unwrap_or(0),
        }
    }
}

/// `GET /api/v1/projects/{slug}/features`
pub async fn list_features(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<ListFeaturesParams>,
) -> Result<Json<Value>, ApiError> {
    let project = state
        .db
        .get_project_by_slug(&slug)?
        .ok_or(ApiError::NotFound("Project"))?;

    let features = state.db.list_features(project.id, &params.to_query())?;
    Ok(Json(json!({ "data": features })))
}

#[derive(Deserialize)]
pub struct StoreFeatureRequest {
    pub title: String,
    pub description: Option<String>,
    /// When present, the submitter's vote is cast on their own
    /// feature right away.
    pub client_id: Option<String>,
}

/// `POST /api/v1/projects/{slug}/features` — public submission.
pub async fn create_feature(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(req): Json<StoreFeatureRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut v = Validator::new();
    v.length("title", &req.title, 5, 200);
    v.length_opt("description", req.description.as_deref(), 0, 5000);
    v.length_opt("client_id", req.client_id.as_deref(), 5, 100);
    v.finish()?;

    let project = state
        .db
        .get_project_by_slug(&slug)?
        .ok_or(ApiError::NotFound("Project"))?;

    let mut feature = state.db.create_feature(
        project.id,
        CreateFeatureInput {
            title: req.title,
            description: req.description,
            ..Default::default()
        },
    )?;

    if let Some(client_id) = req.client_id {
        state.db.add_vote(feature.id, &client_id)?;
        feature.vote_count = 1;
    }

    Ok((StatusCode::CREATED, Json(json!({ "data": feature }))))
}

/// `GET /api/v1/features/{id}`
pub async fn get_feature(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let feature = state
        .db
        .get_feature(id)?
        .ok_or(ApiError::NotFound("Feature"))?;
    Ok(Json(json!({ "data": feature })))
}
