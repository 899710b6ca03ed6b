//! Module with the service that implements ALL the functionality.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{self, Captioner};
use crate::handlers::rps::{self, MatchRegistry};
use crate::handlers::util::error_response;


/// State shared by all the request handlers.
#[derive(Clone)]
pub struct AppState {
    pub captioner: Arc<Captioner>,
    pub matches: Arc<MatchRegistry>,
    /// How long players have to finish a match (zero means forever).
    pub match_timeout: Duration,
}

impl AppState {
    pub fn new(captioner: Captioner, match_timeout: Duration) -> Self {
        AppState{
            captioner: Arc::new(captioner),
            matches: Arc::new(MatchRegistry::default()),
            match_timeout,
        }
    }
}


/// Create the router with all the endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/caption", get(handlers::caption_get).post(handlers::caption_post))
        .route("/rps", post(rps::create_match))
        .route("/rps/{id}", get(rps::get_match))
        .route("/rps/{id}/accept", post(rps::accept))
        .route("/rps/{id}/deny", post(rps::deny))
        .route("/rps/{id}/choice", post(rps::choose))
        .route("/stats", get(handlers::stats))
        .fallback(handle_404)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn handle_404(request: Request) -> Response {
    debug!("Path {} doesn't match any endpoint", request.uri().path());
    error_response(StatusCode::NOT_FOUND, "not found")
}

/// Log the request & how it has been served.
async fn log_request(request: Request<Body>, next: Next) -> Response {
    info!("{} {}{} {:?}",
        request.method(),
        request.uri().path(),
        request.uri().query().map(|q| format!("?{}", q)).unwrap_or_default(),
        request.version());

    let start = Instant::now();
    let response = next.run(request).await;
    debug!("HTTP {status}, produced {ctype} in {time:.3} secs",
        status = response.status(),
        ctype = response.headers().get(axum::http::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("no content"),
        time = start.elapsed().as_secs_f64());
    response
}
