use axum::http::StatusCode;

/// Handler for `GET /healthz` — liveness probe.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Handler for `GET /readyz` — readiness probe. Services with external
/// dependencies can mount their own variant instead.
pub async fn readyz() -> StatusCode {
    StatusCode::OK
}
