use axum::{Router, routing::get, routing::post};
use tower_http::trace::TraceLayer;

use corvid_core::health::{healthz, readyz};
use corvid_core::middleware::request_id_layer;

use crate::handlers::signup::{complete_signup, signup};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Signup
        .route("/signup", post(signup))
        .route("/signup/complete", post(complete_signup))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
