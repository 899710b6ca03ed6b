//! Module with the server's request handlers.

mod caption;
mod captioner;
pub mod rps;
pub mod util;


use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use crate::service::AppState;
use self::util::json_response;

pub use self::caption::{caption_get, caption_post};
pub use self::captioner::Captioner;


/// Handle the server statistics request.
pub async fn stats(State(state): State<AppState>) -> Response {
    let captions = state.captioner.stats();
    json_response(StatusCode::OK, json!({
        "revision": (*crate::REVISION).unwrap_or(""),
        "captions": captions,
        "matches": {
            "active": state.matches.len(),
            "created": state.matches.created(),
        },
    }))
}
