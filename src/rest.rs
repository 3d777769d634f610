use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::{handlers, middleware, AppState};

#[derive(Serialize)]
pub struct HealthResponse {
    pub message: String,
    pub timestamp: String,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "Transaction management API is running".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/profile", get(handlers::auth::profile))
        .route(
            "/transactions",
            get(handlers::transactions::list).post(handlers::transactions::create),
        )
        .route("/transactions/all", get(handlers::transactions::list_all))
        .route(
            "/transactions/statistics",
            get(handlers::transactions::statistics),
        )
        .route(
            "/transactions/:id",
            get(handlers::transactions::get_one)
                .patch(handlers::transactions::update)
                .delete(handlers::transactions::remove),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
