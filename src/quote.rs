use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::config::Config;

const MODULES: &str = "summaryDetail,defaultKeyStatistics";

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no quote found for {0}")]
    NotFound(String),

    #[error("payload is missing `{0}`")]
    MissingField(&'static str),

    #[error("`{0}` is not a representable number")]
    InvalidValue(&'static str),

    #[error("provider returned an empty crumb")]
    EmptyCrumb,
}

/// Summary metrics for one symbol, as reported by the provider.
///
/// The five core fields were present in the payload but may still be null.
/// `dividend_yield` is a fraction (0.005 means 0.5%).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteInfo {
    pub previous_close: Option<f64>,
    pub forward_pe: Option<f64>,
    pub forward_eps: Option<f64>,
    pub fifty_day_average: Option<f64>,
    pub two_hundred_day_average: Option<f64>,
    pub dividend_yield: Option<f64>,
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<QuoteInfo, QuoteError>;
}

/// Yahoo Finance `quoteSummary` client.
///
/// Yahoo only answers `quoteSummary` for sessions holding its consent cookie
/// and a matching `crumb` token. Both are fetched on first use and reused.
pub struct YahooQuotes {
    client: Client,
    base_url: String,
    cookie_url: String,
    crumb: OnceCell<String>,
}

impl YahooQuotes {
    /// `client` must have a cookie store enabled.
    pub fn new(client: Client, base_url: impl Into<String>, cookie_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cookie_url: cookie_url.into(),
            crumb: OnceCell::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, QuoteError> {
        let client = reqwest::ClientBuilder::new()
            .cookie_store(true)
            .user_agent(&config.quote_user_agent)
            .build()?;
        Ok(Self::new(
            client,
            config.quote_base_url.clone(),
            config.quote_cookie_url.clone(),
        ))
    }

    async fn crumb(&self) -> Result<&str, QuoteError> {
        let crumb = self
            .crumb
            .get_or_try_init(|| async {
                // The cookie host answers 404 but still sets the session cookie.
                self.client.get(&self.cookie_url).send().await?;

                let crumb = self
                    .client
                    .get(format!("{}/v1/test/getcrumb", self.base_url))
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;
                let crumb = crumb.trim();
                if crumb.is_empty() {
                    return Err(QuoteError::EmptyCrumb);
                }
                tracing::debug!("acquired quote provider crumb");
                Ok::<_, QuoteError>(crumb.to_string())
            })
            .await?;
        Ok(crumb.as_str())
    }
}

#[async_trait]
impl QuoteProvider for YahooQuotes {
    async fn fetch(&self, symbol: &str) -> Result<QuoteInfo, QuoteError> {
        let crumb = self.crumb().await?;
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol);
        let payload: Value = self
            .client
            .get(url)
            .query(&[("modules", MODULES), ("crumb", crumb)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let info = flatten_modules(&payload).ok_or_else(|| QuoteError::NotFound(symbol.to_string()))?;
        QuoteInfo::from_info(&info)
    }
}

impl QuoteInfo {
    /// Builds a quote from a flattened info map.
    pub fn from_info(info: &HashMap<String, Value>) -> Result<Self, QuoteError> {
        Ok(Self {
            previous_close: required(info, "previousClose")?,
            forward_pe: required(info, "forwardPE")?,
            forward_eps: required(info, "forwardEps")?,
            fifty_day_average: required(info, "fiftyDayAverage")?,
            two_hundred_day_average: required(info, "twoHundredDayAverage")?,
            dividend_yield: info.get("dividendYield").and_then(number),
        })
    }
}

/// Merges every module of the first `quoteSummary` result into one map.
/// The first module to report a key wins.
fn flatten_modules(payload: &Value) -> Option<HashMap<String, Value>> {
    let result = payload
        .get("quoteSummary")?
        .get("result")?
        .as_array()?
        .first()?
        .as_object()?;

    let mut info = HashMap::new();
    for module in result.values().filter_map(Value::as_object) {
        for (key, value) in module {
            info.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
    Some(info)
}

fn required(info: &HashMap<String, Value>, key: &'static str) -> Result<Option<f64>, QuoteError> {
    info.get(key)
        .map(number)
        .ok_or(QuoteError::MissingField(key))
}

// Yahoo wraps numbers as {"raw": 1.0, "fmt": "1.00"} and reports gaps as {}.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Object(map) => map.get("raw").and_then(Value::as_f64),
        _ => None,
    }
}
