use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::require_auth;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public routes: no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected API routes: require Bearer token when API_TOKEN is set
    let protected = Router::new()
        // Positions and ledger
        .route(
            "/api/positions",
            get(handlers::positions::list).post(handlers::positions::add),
        )
        .route(
            "/api/positions/:id",
            get(handlers::positions::detail)
                .put(handlers::positions::update)
                .delete(handlers::positions::remove),
        )
        .route("/api/transactions", get(handlers::positions::transactions))
        .route("/api/portfolio", get(handlers::positions::portfolio))
        // Market data
        .route("/api/prices/:symbol", get(handlers::market::price))
        .route("/api/history/:symbol", get(handlers::market::history))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
