use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::quote::{QuoteError, QuoteInfo};

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Stock {
    pub id: i32,
    pub symbol: String,
    pub price: Option<Decimal>,
    pub forward_pe: Option<Decimal>,
    pub forward_eps: Option<Decimal>,
    pub dividend_yield: Option<Decimal>,
    pub ma50: Option<Decimal>,
    pub ma200: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStockRequest {
    pub symbol: String,
}

impl Stock {
    /// Copies provider metrics onto the row.
    ///
    /// The five core metrics are always overwritten, nulls included. The
    /// dividend yield is only touched when the provider reports one, and is
    /// stored as a percentage.
    pub fn apply_quote(&mut self, quote: &QuoteInfo) -> Result<(), QuoteError> {
        self.price = to_decimal(quote.previous_close, "previousClose")?;
        self.forward_pe = to_decimal(quote.forward_pe, "forwardPE")?;
        self.forward_eps = to_decimal(quote.forward_eps, "forwardEps")?;
        self.ma50 = to_decimal(quote.fifty_day_average, "fiftyDayAverage")?;
        self.ma200 = to_decimal(quote.two_hundred_day_average, "twoHundredDayAverage")?;

        if let Some(fraction) = quote.dividend_yield {
            let fraction =
                Decimal::try_from(fraction).map_err(|_| QuoteError::InvalidValue("dividendYield"))?;
            self.dividend_yield = Some(to_cents(fraction * Decimal::ONE_HUNDRED));
        }

        Ok(())
    }
}

// Columns are NUMERIC(10, 2), which rounds half away from zero.
fn to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn to_decimal(value: Option<f64>, field: &'static str) -> Result<Option<Decimal>, QuoteError> {
    value
        .map(|v| {
            Decimal::try_from(v)
                .map(to_cents)
                .map_err(|_| QuoteError::InvalidValue(field))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fresh(symbol: &str) -> Stock {
        Stock {
            id: 1,
            symbol: symbol.into(),
            price: None,
            forward_pe: None,
            forward_eps: None,
            dividend_yield: None,
            ma50: None,
            ma200: None,
        }
    }

    fn aapl_quote() -> QuoteInfo {
        QuoteInfo {
            previous_close: Some(150.0),
            forward_pe: Some(25.0),
            forward_eps: Some(6.0),
            fifty_day_average: Some(145.0),
            two_hundred_day_average: Some(140.0),
            dividend_yield: Some(0.005),
        }
    }

    #[test]
    fn apply_quote_maps_every_metric() {
        let mut stock = fresh("AAPL");
        stock.apply_quote(&aapl_quote()).unwrap();

        assert_eq!(stock.price, Some(dec!(150.0)));
        assert_eq!(stock.forward_pe, Some(dec!(25.0)));
        assert_eq!(stock.forward_eps, Some(dec!(6.0)));
        assert_eq!(stock.ma50, Some(dec!(145.0)));
        assert_eq!(stock.ma200, Some(dec!(140.0)));
        assert_eq!(stock.dividend_yield, Some(dec!(0.5)));
    }

    #[test]
    fn null_dividend_yield_leaves_column_untouched() {
        let mut stock = fresh("AMZN");
        let quote = QuoteInfo {
            dividend_yield: None,
            ..aapl_quote()
        };
        stock.apply_quote(&quote).unwrap();
        assert_eq!(stock.dividend_yield, None);

        stock.dividend_yield = Some(dec!(1.25));
        stock.apply_quote(&quote).unwrap();
        assert_eq!(stock.dividend_yield, Some(dec!(1.25)));
        assert_eq!(stock.price, Some(dec!(150)));
    }

    #[test]
    fn null_core_metric_overwrites_column() {
        let mut stock = fresh("NFLX");
        stock.forward_pe = Some(dec!(30));
        let quote = QuoteInfo {
            forward_pe: None,
            ..aapl_quote()
        };
        stock.apply_quote(&quote).unwrap();
        assert_eq!(stock.forward_pe, None);
    }

    #[test]
    fn values_are_rounded_to_cents() {
        let mut stock = fresh("MSFT");
        let quote = QuoteInfo {
            previous_close: Some(412.3456),
            dividend_yield: Some(0.00734),
            ..aapl_quote()
        };
        stock.apply_quote(&quote).unwrap();

        assert_eq!(stock.price, Some(dec!(412.35)));
        assert_eq!(stock.dividend_yield, Some(dec!(0.73)));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut stock = fresh("BAD");
        let quote = QuoteInfo {
            forward_eps: Some(f64::NAN),
            ..aapl_quote()
        };
        let err = stock.apply_quote(&quote).unwrap_err();
        assert!(matches!(err, QuoteError::InvalidValue("forwardEps")));
    }
}
