//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use vshome_domain::error::{InvalidRequestError, VsHomeError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`VsHomeError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(VsHomeError);

impl From<VsHomeError> for ApiError {
    fn from(err: VsHomeError) -> Self {
        Self(err)
    }
}

impl From<InvalidRequestError> for ApiError {
    fn from(err: InvalidRequestError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            VsHomeError::InvalidRequest(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            VsHomeError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            VsHomeError::Configuration(_) | VsHomeError::Transport(_) => {
                tracing::error!(error = %self.0, "unexpected error while serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
