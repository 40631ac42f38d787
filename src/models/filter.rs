use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

use crate::error::AppError;

/// Raw dashboard query string. Values are echoed back to the page as given.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct DashboardQuery {
    pub forward_pe: Option<String>,
    pub dividend_yield: Option<String>,
    pub ma50: Option<String>,
    pub ma200: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct StockFilter {
    /// Keep rows with `forward_pe` strictly below this bound.
    pub max_forward_pe: Option<Decimal>,
    /// Keep rows with `dividend_yield` strictly above this bound.
    pub min_dividend_yield: Option<Decimal>,
    pub above_ma50: bool,
    pub above_ma200: bool,
}

impl TryFrom<&DashboardQuery> for StockFilter {
    type Error = AppError;

    fn try_from(query: &DashboardQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            max_forward_pe: parse_bound("forward_pe", query.forward_pe.as_deref())?,
            min_dividend_yield: parse_bound("dividend_yield", query.dividend_yield.as_deref())?,
            above_ma50: is_set(query.ma50.as_deref()),
            above_ma200: is_set(query.ma200.as_deref()),
        })
    }
}

impl StockFilter {
    /// Appends a `WHERE` clause with one predicate per active filter.
    ///
    /// Comparisons against NULL are never true, so rows with a missing
    /// metric drop out of any filter that looks at it.
    pub fn push_where(&self, query: &mut QueryBuilder<'_, Postgres>) {
        let mut prefix = " WHERE ";
        let mut next = || std::mem::replace(&mut prefix, " AND ");

        if let Some(bound) = self.max_forward_pe {
            query.push(next()).push("forward_pe < ").push_bind(bound);
        }
        if let Some(bound) = self.min_dividend_yield {
            query.push(next()).push("dividend_yield > ").push_bind(bound);
        }
        if self.above_ma50 {
            query.push(next()).push("price > ma50");
        }
        if self.above_ma200 {
            query.push(next()).push("price > ma200");
        }
    }
}

// Blank values are treated like missing ones.
fn is_set(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

fn parse_bound(name: &str, value: Option<&str>) -> Result<Option<Decimal>, AppError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => Decimal::from_str(raw)
            .map(Some)
            .map_err(|_| AppError::InvalidFilter(format!("{name}={raw}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn query(pairs: &[(&str, &str)]) -> DashboardQuery {
        let mut q = DashboardQuery::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "forward_pe" => q.forward_pe = value,
                "dividend_yield" => q.dividend_yield = value,
                "ma50" => q.ma50 = value,
                "ma200" => q.ma200 = value,
                _ => unreachable!(),
            }
        }
        q
    }

    fn sql(filter: &StockFilter) -> String {
        let mut builder = QueryBuilder::new("SELECT * FROM stocks");
        filter.push_where(&mut builder);
        builder.sql().to_string()
    }

    #[test]
    fn missing_and_blank_values_are_inactive() {
        let empty = StockFilter::try_from(&DashboardQuery::default()).unwrap();
        assert_eq!(empty, StockFilter::default());

        let blank = StockFilter::try_from(&query(&[
            ("forward_pe", ""),
            ("dividend_yield", "  "),
            ("ma50", ""),
            ("ma200", ""),
        ]))
        .unwrap();
        assert_eq!(blank, StockFilter::default());
    }

    #[test]
    fn parses_bounds_and_flags() {
        let filter = StockFilter::try_from(&query(&[
            ("forward_pe", "20"),
            ("dividend_yield", "1.5"),
            ("ma50", "on"),
        ]))
        .unwrap();

        assert_eq!(filter.max_forward_pe, Some(dec!(20)));
        assert_eq!(filter.min_dividend_yield, Some(dec!(1.5)));
        assert!(filter.above_ma50);
        assert!(!filter.above_ma200);
    }

    #[test]
    fn any_non_empty_flag_counts() {
        let filter = StockFilter::try_from(&query(&[("ma200", "false")])).unwrap();
        assert!(filter.above_ma200);
    }

    #[test]
    fn rejects_non_numeric_bound() {
        let err = StockFilter::try_from(&query(&[("forward_pe", "cheap")])).unwrap_err();
        assert!(matches!(err, AppError::InvalidFilter(msg) if msg == "forward_pe=cheap"));
    }

    #[test]
    fn no_filters_means_no_where_clause() {
        assert_eq!(sql(&StockFilter::default()), "SELECT * FROM stocks");
    }

    #[test]
    fn single_filters() {
        let pe = StockFilter {
            max_forward_pe: Some(dec!(20)),
            ..Default::default()
        };
        assert_eq!(sql(&pe), "SELECT * FROM stocks WHERE forward_pe < $1");

        let ma50 = StockFilter {
            above_ma50: true,
            ..Default::default()
        };
        assert_eq!(sql(&ma50), "SELECT * FROM stocks WHERE price > ma50");
    }

    #[test]
    fn active_filters_are_joined_with_and() {
        let all = StockFilter {
            max_forward_pe: Some(dec!(20)),
            min_dividend_yield: Some(dec!(1)),
            above_ma50: true,
            above_ma200: true,
        };
        assert_eq!(
            sql(&all),
            "SELECT * FROM stocks WHERE forward_pe < $1 AND dividend_yield > $2 \
             AND price > ma50 AND price > ma200"
        );
    }
}
