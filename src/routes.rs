//! HTTP router.

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{handlers, services::SharedLedger};

/// Build the application router.
///
/// # Routes
///
/// - `GET /health`
/// - `POST /api/v1/users`
/// - `GET /api/v1/users/{id}`
/// - `POST /api/v1/transfers`
pub fn router(ledger: SharedLedger) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/v1/users", post(handlers::users::create_user))
        .route("/api/v1/users/{id}", get(handlers::users::get_user))
        .route(
            "/api/v1/transfers",
            post(handlers::transfers::create_transfer),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                // Panics in handlers become 500 responses instead of dropped connections
                .layer(CatchPanicLayer::new()),
        )
        .with_state(ledger)
}
