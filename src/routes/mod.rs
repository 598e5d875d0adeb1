use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

pub mod analyze_dream;
pub mod health;

pub use analyze_dream::analyze_dream_handler;
pub use health::health_check;

/// Assembles the application router.
///
/// The permissive CORS layer answers `OPTIONS` preflights with 200 before any
/// auth check runs, which is what mobile/web clients expect.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/analyze-dream", post(analyze_dream_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
