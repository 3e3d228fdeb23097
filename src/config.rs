use crate::types::{InstitutionPrefix, Money};
use anyhow::Context;
use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Runtime settings for the transfer engine, read from the environment.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Fraction added on top of every converted amount, e.g. `0.02`.
    pub conversion_spread: Decimal,
    /// Live rate endpoint. Without it only the fallback dataset is used.
    pub rate_api_url: Option<String>,
    pub rate_api_key: Option<String>,
    pub rate_timeout: Duration,
    pub rate_cache_ttl: Duration,
    /// JSON fallback dataset. Without it the built-in table is used.
    pub fallback_rates_path: Option<PathBuf>,
    pub institution_prefix: InstitutionPrefix,
    pub account_number_max_attempts: u32,
    pub opening_balance: Money
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            conversion_spread: Decimal::new(2, 2),
            rate_api_url: None,
            rate_api_key: None,
            rate_timeout: Duration::from_secs(5),
            rate_cache_ttl: Duration::from_secs(60),
            fallback_rates_path: None,
            institution_prefix: InstitutionPrefix::default(),
            account_number_max_attempts: 16,
            opening_balance: Money::rounded(Decimal::new(10_000, 0))
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let conversion_spread = parse_var("CURRENCY_CONVERSION_SPREAD", defaults.conversion_spread)?;
        if conversion_spread < Decimal::ZERO {
            anyhow::bail!("CURRENCY_CONVERSION_SPREAD must not be negative, found {conversion_spread}");
        }

        let account_number_max_attempts = parse_var("ACCOUNT_NUMBER_MAX_ATTEMPTS", defaults.account_number_max_attempts)?;
        if account_number_max_attempts == 0 {
            anyhow::bail!("ACCOUNT_NUMBER_MAX_ATTEMPTS must be at least 1");
        }

        let opening_balance: Money = parse_var("OPENING_BALANCE", defaults.opening_balance)?;
        if opening_balance.is_negative() {
            anyhow::bail!("OPENING_BALANCE must not be negative, found {opening_balance}");
        }

        Ok(Self {
            conversion_spread,
            rate_api_url: optional_var("EXCHANGE_RATE_API_URL"),
            rate_api_key: optional_var("EXCHANGE_RATE_API_KEY"),
            rate_timeout: Duration::from_secs(parse_var("EXCHANGE_RATE_TIMEOUT_SECS", defaults.rate_timeout.as_secs())?),
            rate_cache_ttl: Duration::from_secs(parse_var("EXCHANGE_RATE_CACHE_TTL_SECS", defaults.rate_cache_ttl.as_secs())?),
            fallback_rates_path: optional_var("FALLBACK_RATES_PATH").map(PathBuf::from),
            institution_prefix: parse_var("INSTITUTION_PREFIX", defaults.institution_prefix)?,
            account_number_max_attempts,
            opening_balance
        })
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_var(name) {
        Some(value) => value.parse().with_context(|| format!("Invalid value for {name}: [{value}]")),
        None => Ok(default)
    }
}
