use axum::Json;
use axum::http::header;
use axum::response::IntoResponse;
use modhub_derive::{api_handler, api_model};
use modhub_domain::constants::SYSTEM_TAG;
use std::sync::LazyLock;
use std::time::Instant;

static STARTED_AT: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Pins the uptime origin; call once while the server boots.
pub fn mark_started() {
    LazyLock::force(&STARTED_AT);
}

#[api_model]
/// Liveness report.
pub(super) struct HealthResponse {
    /// Always `up` while the process serves requests.
    status: String,
    /// Server build version.
    version: String,
    /// Seconds since the server started.
    uptime: u64,
}

#[api_handler(
    get,
    path = "/health",
    responses((status = OK, description = "Service is alive", body = HealthResponse)),
    tag = SYSTEM_TAG,
)]
pub(super) async fn health_handler() -> impl IntoResponse {
    let body = HealthResponse {
        status: "up".to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
        uptime: STARTED_AT.elapsed().as_secs(),
    };

    (
        [
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(body),
    )
}
