use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{AppState, blocking, error::ApiError};

/// The signed-in user making the request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub id: Uuid,
    pub email: String,
}

/// Resolve the bearer token, if any, to a local user.
///
/// Requests without an Authorization header pass through untouched, no
/// lookup is made. An invalid token leaves the request anonymous; write
/// handlers then reject it through the `Caller` extractor.
pub async fn identify(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let bearer = req.headers().typed_get::<Authorization<Bearer>>();

    if let Some(Authorization(bearer)) = bearer {
        match state.identity.resolve(bearer.token()) {
            Some(claims) => {
                // First successful sign-in creates the user row.
                let user = blocking(&state, move |db| {
                    Ok(db.ensure_user(&claims.email, claims.name.as_deref(), claims.picture.as_deref())?)
                })
                .await?;

                debug!(user_id = %user.id, "Caller resolved");
                req.extensions_mut().insert(Caller {
                    id: user.id,
                    email: user.email,
                });
            }
            None => warn!("Ignoring invalid bearer token"),
        }
    }

    Ok(next.run(req).await)
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

/// The caller on routes that also serve anonymous readers.
#[derive(Debug, Clone)]
pub struct MaybeCaller(pub Option<Caller>);

impl MaybeCaller {
    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|caller| caller.id)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for MaybeCaller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeCaller(parts.extensions.get::<Caller>().cloned()))
    }
}
