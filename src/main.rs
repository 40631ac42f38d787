mod config;
mod db;
mod error;
mod handlers;
mod models;
mod quote;
mod routes;
mod state;
mod tasks;
mod views;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use config::Config;
use quote::YahooQuotes;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("stock_screener=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let pool = db::create_pool(&config).await?;

    db::migrate(&pool).await?;

    let state = AppState {
        pool,
        templates: Arc::new(views::templates()?),
        quotes: Arc::new(YahooQuotes::from_config(&config)?),
    };

    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
