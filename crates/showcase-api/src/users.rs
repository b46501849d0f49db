use axum::{Json, extract::State};
use axum_extra::extract::WithRejection;

use showcase_db::ProfileUpdate;
use showcase_types::api::UpdateProfileRequest;
use showcase_types::models::User;

use crate::extract::JsonBody;
use crate::middleware::Caller;
use crate::{AppState, blocking, error::ApiError};

pub async fn me(State(state): State<AppState>, caller: Caller) -> Result<Json<User>, ApiError> {
    let user = blocking(&state, move |db| {
        db.get_user(caller.id)?.ok_or(ApiError::NotFound("User"))
    })
    .await?;

    Ok(Json(user))
}

/// PUT /user: fields left out of the body keep their current value.
pub async fn update_me(
    State(state): State<AppState>,
    caller: Caller,
    WithRejection(Json(req), _): JsonBody<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let update = ProfileUpdate {
        name: req.name,
        bio: req.bio,
        location: req.location,
        image: req.image,
    };

    let user = blocking(&state, move |db| {
        db.update_profile(caller.id, &update)?.ok_or(ApiError::NotFound("User"))
    })
    .await?;

    Ok(Json(user))
}
