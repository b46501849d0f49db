use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use showcase_engagement::VoteLedger;
use showcase_types::models::{Polarity, VoteState};

use crate::extract::PathParams;
use crate::middleware::{Caller, MaybeCaller};
use crate::{AppState, blocking, error::ApiError};

/// GET /projects/{project_id}/likes and /dislikes. Anonymous callers get
/// counts with a null polarity.
pub async fn vote_state(
    State(state): State<AppState>,
    WithRejection(Path(project_id), _): PathParams<Uuid>,
    caller: MaybeCaller,
) -> Result<Json<VoteState>, ApiError> {
    let viewer = caller.id();
    let vote_state = blocking(&state, move |db| {
        Ok(VoteLedger::new(db).vote_state(viewer, project_id)?)
    })
    .await?;

    Ok(Json(vote_state))
}

pub async fn like(
    State(state): State<AppState>,
    WithRejection(Path(project_id), _): PathParams<Uuid>,
    caller: Caller,
) -> Result<Json<VoteState>, ApiError> {
    cast(&state, caller, project_id, Polarity::Like).await
}

pub async fn unlike(
    State(state): State<AppState>,
    WithRejection(Path(project_id), _): PathParams<Uuid>,
    caller: Caller,
) -> Result<Json<VoteState>, ApiError> {
    retract(&state, caller, project_id, Polarity::Like).await
}

pub async fn dislike(
    State(state): State<AppState>,
    WithRejection(Path(project_id), _): PathParams<Uuid>,
    caller: Caller,
) -> Result<Json<VoteState>, ApiError> {
    cast(&state, caller, project_id, Polarity::Dislike).await
}

pub async fn undislike(
    State(state): State<AppState>,
    WithRejection(Path(project_id), _): PathParams<Uuid>,
    caller: Caller,
) -> Result<Json<VoteState>, ApiError> {
    retract(&state, caller, project_id, Polarity::Dislike).await
}

async fn cast(
    state: &AppState,
    caller: Caller,
    project_id: Uuid,
    polarity: Polarity,
) -> Result<Json<VoteState>, ApiError> {
    let vote_state = blocking(state, move |db| {
        Ok(VoteLedger::new(db).set_vote(caller.id, project_id, polarity)?)
    })
    .await?;

    Ok(Json(vote_state))
}

async fn retract(
    state: &AppState,
    caller: Caller,
    project_id: Uuid,
    polarity: Polarity,
) -> Result<Json<VoteState>, ApiError> {
    let vote_state = blocking(state, move |db| {
        Ok(VoteLedger::new(db).clear_vote(caller.id, project_id, polarity)?)
    })
    .await?;

    Ok(Json(vote_state))
}
