mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod password;
mod rest;
mod services;
mod store;
mod token;
mod validate;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::password::PasswordHasher;
use crate::services::auth::AuthService;
use crate::services::transactions::TransactionService;
use crate::store::transactions::TransactionStore;
use crate::store::users::UserStore;
use crate::token::TokenIssuer;

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub transactions: TransactionService,
    pub tokens: TokenIssuer,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "transactions_api=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let jwt_secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(3000);

    let pool = db::connect(&db_url)
        .await
        .expect("Failed to connect to DB");

    let tokens = TokenIssuer::new(jwt_secret.as_bytes(), chrono::Duration::hours(24));
    let auth = AuthService::new(
        UserStore::new(pool.clone()),
        PasswordHasher::new(),
        tokens.clone(),
    );
    let transactions = TransactionService::new(TransactionStore::new(pool));

    let app = rest::router(AppState {
        auth,
        transactions,
        tokens,
    });

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("REST API listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
