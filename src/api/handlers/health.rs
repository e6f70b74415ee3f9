use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthReport {
    status: &'static str,
    database: &'static str,
    version: &'static str,
}

/// GET /health: store reachability within the request budget
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let ping = sqlx::query("SELECT 1").execute(&state.db);
    let db_ok = matches!(state.deadline().run(ping).await, Ok(Ok(_)));

    let (status, report) = if db_ok {
        (StatusCode::OK, ("healthy", "connected"))
    } else {
        tracing::warn!("Health check could not reach the database");
        (StatusCode::SERVICE_UNAVAILABLE, ("unhealthy", "disconnected"))
    };

    (
        status,
        Json(HealthReport {
            status: report.0,
            database: report.1,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
