//! Utilities for request handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use memecap::rps::MatchError;
use memecap::{AcquireError, CaptionError};
use serde_json::Value;

use super::captioner::RenderError;


/// Create a JSON response with given status code.
pub fn json_response(status_code: StatusCode, json: Value) -> Response {
    (status_code, Json(json)).into_response()
}

/// Create an erroneous JSON response.
pub fn error_response<T: ToString>(status_code: StatusCode, message: T) -> Response {
    json_response(status_code, json!({"error": message.to_string()}))
}


/// Error returned by request handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or invalid request.
    BadRequest(String),
    /// Requested thing doesn't exist (anymore).
    NotFound(String),
    /// Error while captioning an image.
    Render(RenderError),
    /// Operation not allowed on a match.
    Match(MatchError),
}

impl From<RenderError> for ApiError {
    fn from(e: RenderError) -> Self {
        ApiError::Render(e)
    }
}

impl From<MatchError> for ApiError {
    fn from(e: MatchError) -> Self {
        ApiError::Match(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                debug!("Bad request: {}", msg);
                error_response(StatusCode::BAD_REQUEST, msg)
            }
            ApiError::NotFound(msg) => error_response(StatusCode::NOT_FOUND, msg),
            ApiError::Render(e) => error_response(render_status_code(&e), e),
            ApiError::Match(e) => error_response(match_status_code(e), e),
        }
    }
}


/// Determine the HTTP response code that best corresponds to a caption rendering error.
pub fn render_status_code(e: &RenderError) -> StatusCode {
    match *e {
        RenderError::Caption(ref e) => match *e {
            CaptionError::EmptyText => StatusCode::BAD_REQUEST,
            CaptionError::Unsupported(..) => StatusCode::BAD_REQUEST,
            CaptionError::Acquire(ref e) => match *e {
                AcquireError::Scheme(..) | AcquireError::InvalidUrl(..) => StatusCode::BAD_REQUEST,
                AcquireError::NotFound(..) => StatusCode::BAD_REQUEST,
                AcquireError::Status(..) | AcquireError::Http(..) => StatusCode::BAD_GATEWAY,
                AcquireError::Io(..) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            CaptionError::Decode(..) => StatusCode::UNPROCESSABLE_ENTITY,
            CaptionError::Encode(..) => StatusCode::INTERNAL_SERVER_ERROR,
        },
        RenderError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        RenderError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Determine the HTTP response code for a rejected match operation.
pub fn match_status_code(e: MatchError) -> StatusCode {
    match e {
        MatchError::NotAParticipant(..) => StatusCode::FORBIDDEN,
        MatchError::Finished => StatusCode::NOT_FOUND,
        MatchError::NotAccepted => StatusCode::CONFLICT,
        MatchError::SelfChallenge => StatusCode::BAD_REQUEST,
    }
}
