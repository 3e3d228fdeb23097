use crate::rates::{RateError, RateSource};
use crate::types::Currency;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Client for an exchangeratesapi.io style `latest` endpoint.
///
/// `GET {url}?access_key={key}&base={from}&symbols={to}` answering
/// `{"success": true, "base": "USD", "rates": {"EUR": 0.81}}`.
pub struct HttpRateSource {
    client: reqwest::Client,
    url: String,
    access_key: Option<String>
}

#[derive(Debug, Deserialize)]
struct LatestRates {
    success: Option<bool>,
    #[serde(default)]
    rates: HashMap<String, Decimal>,
    error: Option<serde_json::Value>
}

impl HttpRateSource {
    pub fn new(url: impl Into<String>, access_key: Option<String>, timeout: Duration) -> Result<Self, RateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| RateError::Request(format!("Failed to create HTTP client: {error}")))?;

        Ok(Self {
            client,
            url: url.into(),
            access_key
        })
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    fn name(&self) -> &'static str {
        "exchange-rate-api"
    }

    async fn fetch(&self, from: Currency, to: Currency) -> Result<Decimal, RateError> {
        let mut query = vec![("base", from.code()), ("symbols", to.code())];

        if let Some(access_key) = &self.access_key {
            query.push(("access_key", access_key.as_str()));
        }

        let response = self.client
            .get(&self.url)
            .query(&query)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|error| RateError::Request(error.to_string()))?;

        let latest: LatestRates = response
            .json()
            .await
            .map_err(|error| RateError::Request(format!("Failed to parse response: {error}")))?;

        if latest.success == Some(false) {
            let detail = latest.error.map(|error| error.to_string()).unwrap_or_else(|| "success=false".to_string());
            return Err(RateError::SourceFailure(detail))
        }

        let rate = latest.rates.get(to.code()).copied().ok_or(RateError::MissingRate { from, to })?;

        if rate <= Decimal::ZERO {
            return Err(RateError::NonPositiveRate { from, to })
        }

        debug!(%from, %to, %rate, "Live exchange rate fetched");

        Ok(rate)
    }
}
