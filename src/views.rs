use rust_decimal::Decimal;
use serde::Serialize;
use tera::{Context, Tera};

use crate::models::{DashboardQuery, Stock};

pub const DASHBOARD: &str = "dashboard.html";

pub fn templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(DASHBOARD, include_str!("../templates/dashboard.html"))?;
    Ok(tera)
}

/// One table row. Metrics are pre-formatted to two places, blank when unset.
#[derive(Debug, Serialize)]
struct StockRow<'a> {
    symbol: &'a str,
    price: String,
    forward_pe: String,
    forward_eps: String,
    dividend_yield: String,
    ma50: String,
    ma200: String,
}

impl<'a> From<&'a Stock> for StockRow<'a> {
    fn from(stock: &'a Stock) -> Self {
        Self {
            symbol: &stock.symbol,
            price: cents(stock.price),
            forward_pe: cents(stock.forward_pe),
            forward_eps: cents(stock.forward_eps),
            dividend_yield: cents(stock.dividend_yield),
            ma50: cents(stock.ma50),
            ma200: cents(stock.ma200),
        }
    }
}

// Postgres returns a NUMERIC zero without its scale.
fn cents(value: Option<Decimal>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

/// Renders the stock table along with the filter values as received.
pub fn render_dashboard(
    tera: &Tera,
    stocks: &[Stock],
    query: &DashboardQuery,
) -> Result<String, tera::Error> {
    let mut context = Context::new();
    let rows: Vec<StockRow> = stocks.iter().map(StockRow::from).collect();
    context.insert("stocks", &rows);
    context.insert("forward_pe", query.forward_pe.as_deref().unwrap_or_default());
    context.insert("dividend_yield", query.dividend_yield.as_deref().unwrap_or_default());
    context.insert("ma50", query.ma50.as_deref().unwrap_or_default());
    context.insert("ma200", query.ma200.as_deref().unwrap_or_default());
    tera.render(DASHBOARD, &context)
}
