//! HTTP routes.
//!
//! - `GET /api/ics/{calendar_id}?s={secret}` serves a calendar feed
//! - `GET /healthz` answers `ok`

use axum::extract::{Path, Query, Request, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::error::RequestError;
use crate::handler::FeedService;

/// Content type of feed responses.
pub const ICS_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

/// Builds the application router.
///
/// Request spans carry the method and path only; the query string holds the
/// feed secret and is never recorded.
pub fn router(service: FeedService) -> Router {
    Router::new()
        .route("/api/ics/{calendar_id}", get(feed))
        .route("/healthz", get(healthz))
        .with_state(service)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                })
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Query parameter carrying the feed secret.
const SECRET_PARAM: &str = "s";

/// Returns the first `s` value; later repeats are ignored.
fn secret_param(query: &[(String, String)]) -> Option<&str> {
    query
        .iter()
        .find(|(key, _)| key == SECRET_PARAM)
        .map(|(_, value)| value.as_str())
}

/// GET /api/ics/{calendar_id} - Render a calendar feed
async fn feed(
    State(service): State<FeedService>,
    Path(calendar_id): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Response, RequestError> {
    let body = service
        .render(&calendar_id, secret_param(&query), Utc::now())
        .await?;
    Ok(([(header::CONTENT_TYPE, ICS_CONTENT_TYPE)], body).into_response())
}

/// GET /healthz - Liveness probe
async fn healthz() -> &'static str {
    "ok"
}
