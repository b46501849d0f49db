use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use showcase_engagement::CommentThread;
use showcase_types::api::CommentRequest;
use showcase_types::models::Comment;

use crate::extract::{JsonBody, PathParams};
use crate::middleware::{Caller, MaybeCaller};
use crate::{AppState, blocking, error::ApiError};

/// GET /projects/{project_id}/comments: newest first.
pub async fn list(
    State(state): State<AppState>,
    WithRejection(Path(project_id), _): PathParams<Uuid>,
    caller: MaybeCaller,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let viewer = caller.id();
    let comments = blocking(&state, move |db| {
        Ok(CommentThread::new(db).list(viewer, project_id)?)
    })
    .await?;

    Ok(Json(comments))
}

pub async fn post(
    State(state): State<AppState>,
    WithRejection(Path(project_id), _): PathParams<Uuid>,
    caller: Caller,
    WithRejection(Json(req), _): JsonBody<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = blocking(&state, move |db| {
        Ok(CommentThread::new(db).post(caller.id, project_id, &req.content)?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// PUT /projects/{project_id}/comments/{comment_id}: author only.
pub async fn update(
    State(state): State<AppState>,
    WithRejection(Path((project_id, comment_id)), _): PathParams<(Uuid, Uuid)>,
    caller: Caller,
    WithRejection(Json(req), _): JsonBody<CommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    let comment = blocking(&state, move |db| {
        Ok(CommentThread::new(db).update(caller.id, project_id, comment_id, &req.content)?)
    })
    .await?;

    Ok(Json(comment))
}

/// DELETE /projects/{project_id}/comments/{comment_id}: author or project owner.
pub async fn delete(
    State(state): State<AppState>,
    WithRejection(Path((project_id, comment_id)), _): PathParams<(Uuid, Uuid)>,
    caller: Caller,
) -> Result<StatusCode, ApiError> {
    blocking(&state, move |db| {
        Ok(CommentThread::new(db).delete(caller.id, project_id, comment_id)?)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
