use anyhow::Context;

mod analysis;
mod app;
mod auth;
mod config;
mod dto;
mod error;
mod state;
mod support;
mod users;

use crate::state::{AppState, Database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "hqube_backend=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = AppState::init().await?;

    if let Database::Ready(pool) = &state.db {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .context("run migrations")?;
    }

    let app = app::build_app(state);
    app::serve(app).await
}
