use std::sync::Arc;

use sqlx::PgPool;

use crate::{error::AppError, models::Stock, quote::QuoteProvider};

/// Runs [`populate_stock`] in the background. Failures are only logged.
///
/// The task gives up its first turn so the handler's response is usually
/// written before the provider is called. Nothing waits on it.
pub fn spawn_population(pool: PgPool, quotes: Arc<dyn QuoteProvider>, id: i32) {
    tokio::spawn(async move {
        tokio::task::yield_now().await;
        match populate_stock(&pool, quotes.as_ref(), id).await {
            Ok(stock) => tracing::info!(id, symbol = %stock.symbol, "stock populated"),
            Err(e) => tracing::error!(id, error = %e, "stock population failed"),
        }
    });
}

/// Fetches quote metrics for one row and writes them back.
pub async fn populate_stock(
    pool: &PgPool,
    quotes: &dyn QuoteProvider,
    id: i32,
) -> Result<Stock, AppError> {
    let mut stock: Stock = sqlx::query_as(
        "SELECT id, symbol, price, forward_pe, forward_eps, dividend_yield, ma50, ma200 FROM stocks WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::StockNotFound(id))?;

    let quote = quotes.fetch(&stock.symbol).await?;
    stock.apply_quote(&quote)?;

    sqlx::query(
        r#"
        UPDATE stocks
        SET price = $1, forward_pe = $2, forward_eps = $3, dividend_yield = $4, ma50 = $5, ma200 = $6
        WHERE id = $7
        "#,
    )
    .bind(stock.price)
    .bind(stock.forward_pe)
    .bind(stock.forward_eps)
    .bind(stock.dividend_yield)
    .bind(stock.ma50)
    .bind(stock.ma200)
    .bind(stock.id)
    .execute(pool)
    .await?;

    Ok(stock)
}
