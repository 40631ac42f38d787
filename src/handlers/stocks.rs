use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use serde_json::json;
use sqlx::{Postgres, QueryBuilder};

use crate::{
    error::AppError,
    models::{CreateStockRequest, DashboardQuery, Stock, StockFilter},
    state::AppState,
    tasks, views,
};

pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Html<String>, AppError> {
    let filter = StockFilter::try_from(&query)?;

    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT id, symbol, price, forward_pe, forward_eps, dividend_yield, ma50, ma200 FROM stocks",
    );
    filter.push_where(&mut builder);
    builder.push(" ORDER BY id");

    let stocks: Vec<Stock> = builder.build_query_as().fetch_all(&state.pool).await?;

    let html = views::render_dashboard(&state.templates, &stocks, &query)?;
    Ok(Html(html))
}

pub async fn create_stock(
    State(state): State<AppState>,
    Json(req): Json<CreateStockRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id: i32 = sqlx::query_scalar("INSERT INTO stocks (symbol) VALUES ($1) RETURNING id")
        .bind(&req.symbol)
        .fetch_one(&state.pool)
        .await?;

    tracing::info!(id, symbol = %req.symbol, "stock added");
    tasks::spawn_population(state.pool.clone(), state.quotes.clone(), id);

    Ok(Json(json!({
        "code": "success",
        "message": "stock was added to the database"
    })))
}
