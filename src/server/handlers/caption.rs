//! Module with the image captioning request handlers.

use axum::body::Body;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;
use axum::Json;
use memecap::{CaptionOutput, ImageSource};
use serde::Deserialize;

use crate::service::AppState;
use super::util::{error_response, ApiError};


/// Caption request, given either as query string or JSON body.
#[derive(Clone, Debug, Deserialize)]
pub struct CaptionRequest {
    /// URL of the image.
    pub image: String,
    /// Caption text.
    #[serde(default)]
    pub text: String,
}

impl CaptionRequest {
    /// Check the request, turning it into the image source to caption.
    fn validate(&self) -> Result<ImageSource, ApiError> {
        let image = self.image.trim();
        let lowercase = image.to_ascii_lowercase();
        if !(lowercase.starts_with("http://") || lowercase.starts_with("https://")) {
            return Err(ApiError::BadRequest(format!(
                "image must be an HTTP(S) URL, got {:?}", image)));
        }
        if self.text.trim().is_empty() {
            return Err(ApiError::BadRequest("caption text cannot be empty".into()));
        }
        Ok(ImageSource::Url(image.to_owned()))
    }
}


/// Handle `GET /caption?image=...&text=...`.
pub async fn caption_get(State(state): State<AppState>,
                         query: Result<Query<CaptionRequest>, QueryRejection>) -> Result<Response, ApiError> {
    let Query(request) = query.map_err(|e| {
        ApiError::BadRequest(format!("cannot decode request: {}", e.body_text()))
    })?;
    caption(state, request).await
}

/// Handle `POST /caption` with a JSON body.
pub async fn caption_post(State(state): State<AppState>,
                          body: Result<Json<CaptionRequest>, JsonRejection>) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|e| {
        ApiError::BadRequest(format!("cannot decode request: {}", e.body_text()))
    })?;
    caption(state, request).await
}

async fn caption(state: AppState, request: CaptionRequest) -> Result<Response, ApiError> {
    debug!("Decoded {:?}", request);
    let source = request.validate()?;
    let output = state.captioner.render(source, request.text).await?;
    Ok(image_response(output))
}

/// Create the response carrying the captioned image.
fn image_response(output: CaptionOutput) -> Response {
    let mime_type = match output.mime_type() {
        Some(mt) => mt,
        None => return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("invalid format: {:?}", output.format())),
    };
    let disposition = format!("inline; filename=\"{}\"", output.filename());

    let mut response = Response::new(Body::from(output.into_bytes()));
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime_type.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(CONTENT_DISPOSITION, value);
    }
    response
}
