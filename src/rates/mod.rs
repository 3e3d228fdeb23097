mod errors;
mod fallback;
mod http_source;
mod resolver;
#[cfg(test)]
mod tests;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::types::Currency;

pub use errors::RateError;
pub use fallback::FallbackRates;
pub use http_source::HttpRateSource;
pub use resolver::ExchangeRateResolver;

/// A live source of conversion rates.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Fetches the rate converting one unit of `from` into `to`.
    async fn fetch(&self, from: Currency, to: Currency) -> Result<Decimal, RateError>;
}
