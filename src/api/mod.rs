//! HTTP boundary: public voting endpoints plus the token-gated admin
//! surface, all thin wrappers over `voteboard-core`.

use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use voteboard_core::sync::IssueSource;
use voteboard_core::Database;

mod admin;
mod error;
mod features;
mod projects;
mod votes;

pub use error::ApiError;

use admin::ADMIN_TOKEN_HEADER;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Shared admin secret; `None` means the admin surface is not
    /// configured and answers 500.
    pub admin_token: Option<String>,
    pub issue_source: Arc<dyn IssueSource>,
}

pub fn create_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/projects", post(admin::create_project))
        .route(
            "/projects/{id}",
            axum::routing::patch(admin::update_project).delete(admin::delete_project),
        )
        .route("/projects/{id}/sync", post(admin::sync_project))
        .route(
            "/features/{id}",
            axum::routing::patch(admin::update_feature).delete(admin::delete_feature),
        )
        .route("/stats", get(admin::stats))
        .route("/test-connection", post(admin::test_connection))
        .route("/repair-votes", post(admin::repair_votes))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin::require_admin,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE, ADMIN_TOKEN_HEADER]);

    Router::new()
        .route("/api/v1/projects", get(projects::list_projects))
        .route(
            "/api/v1/projects/{slug}/features",
            get(features::list_features).post(features::create_feature),
        )
        .route("/api/v1/features/{id}", get(features::get_feature))
        .route(
            "/api/v1/features/{id}/vote",
            post(votes::cast_vote).delete(votes::remove_vote),
        )
        .nest("/api/v1/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
