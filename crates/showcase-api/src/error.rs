use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use showcase_engagement::EngagementError;
use showcase_types::api::ErrorBody;
use showcase_types::models::Polarity;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("Project already {0}d")]
    AlreadyVoted(Polarity),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::Unauthorized => "unauthorized",
            ApiError::BadRequest(_) => "validation",
            ApiError::AlreadyVoted(_) => "already_voted",
            ApiError::Storage(_) => "storage",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl From<EngagementError> for ApiError {
    fn from(err: EngagementError) -> Self {
        match err {
            EngagementError::NotFound(what) => ApiError::NotFound(what),
            EngagementError::Unauthorized => ApiError::Unauthorized,
            EngagementError::Validation(msg) => ApiError::BadRequest(msg),
            EngagementError::AlreadyVoted(polarity) => ApiError::AlreadyVoted(polarity),
            EngagementError::Storage(e) => ApiError::Storage(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) | ApiError::AlreadyVoted(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Storage and internal detail stays in the logs.
        let message = match &self {
            ApiError::Storage(e) => {
                tracing::error!("Storage error: {:#}", e);
                "Internal server error".to_string()
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: message,
            kind: self.kind().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_status(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn engagement_errors_map_to_status_classes() {
        let cases = [
            (EngagementError::NotFound("Project"), StatusCode::NOT_FOUND),
            (EngagementError::Unauthorized, StatusCode::UNAUTHORIZED),
            (EngagementError::Validation("empty".into()), StatusCode::BAD_REQUEST),
            (EngagementError::AlreadyVoted(Polarity::Like), StatusCode::BAD_REQUEST),
            (
                EngagementError::Storage(anyhow::anyhow!("disk I/O error")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(response_status(err.into()), status);
        }
    }

    #[test]
    fn internal_returns_500() {
        assert_eq!(
            response_status(ApiError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn storage_detail_is_not_leaked() {
        let err = ApiError::Storage(anyhow::anyhow!("UNIQUE constraint failed: votes.user_id"));
        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "Internal server error");
        assert_eq!(body.kind, "storage");
    }

    #[tokio::test]
    async fn already_voted_names_the_polarity() {
        let response = ApiError::AlreadyVoted(Polarity::Dislike).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "Project already disliked");
        assert_eq!(body.kind, "already_voted");
    }
}
