pub mod auth;
pub mod comments;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod projects;
pub mod users;
pub mod votes;

use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, put},
};
use showcase_db::Database;
use tracing::error;

pub use auth::IdentityGateway;
pub use error::ApiError;
pub use middleware::{Caller, MaybeCaller};

pub type AppState = Arc<AppStateInner>;

/// Process-wide handles, built once at startup and shared by every request.
pub struct AppStateInner {
    pub db: Database,
    pub identity: IdentityGateway,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/projects", get(projects::explore).post(projects::create))
        .route(
            "/projects/{project_id}",
            get(projects::detail)
                .patch(projects::update_visibility)
                .delete(projects::delete),
        )
        .route(
            "/projects/{project_id}/likes",
            get(votes::vote_state).post(votes::like).delete(votes::unlike),
        )
        .route(
            "/projects/{project_id}/dislikes",
            get(votes::vote_state).post(votes::dislike).delete(votes::undislike),
        )
        .route(
            "/projects/{project_id}/comments",
            get(comments::list).post(comments::post),
        )
        .route(
            "/projects/{project_id}/comments/{comment_id}",
            put(comments::update).delete(comments::delete),
        )
        .route("/user", get(users::me).put(users::update_me))
        .route("/user/projects", get(projects::mine))
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::identify))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Runs blocking database work off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.to_string())
        })?
}
