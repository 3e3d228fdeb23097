use crate::rates::{FallbackRates, RateError, RateSource};
use crate::types::Currency;
use moka::future::Cache;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const CACHE_CAPACITY: u64 = 64;

/// Resolves conversion rates: live source first, local dataset second.
///
/// There is no retry against the live source inside one call; the fallback
/// dataset is the retry. Live answers may be kept for a short TTL.
pub struct ExchangeRateResolver {
    live: Option<Arc<dyn RateSource>>,
    fallback: FallbackRates,
    cache: Option<Cache<(Currency, Currency), Decimal>>
}

impl ExchangeRateResolver {
    pub fn new(live: Option<Arc<dyn RateSource>>, fallback: FallbackRates) -> Self {
        Self {
            live,
            fallback,
            cache: None
        }
    }

    /// Resolver that never leaves the process.
    pub fn offline(fallback: FallbackRates) -> Self {
        Self::new(None, fallback)
    }

    /// Keeps live rates for `ttl`. A zero TTL disables caching.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(ttl)
                .build()
        });

        self
    }

    pub async fn resolve(&self, from: Currency, to: Currency) -> Result<Decimal, RateError> {
        if from == to {
            return Ok(Decimal::ONE)
        }

        if let Some(cache) = &self.cache
            && let Some(rate) = cache.get(&(from, to)).await
        {
            debug!(%from, %to, %rate, "Exchange rate served from cache");
            return Ok(rate)
        }

        if let Some(live) = &self.live {
            match live.fetch(from, to).await {
                Ok(rate) if rate > Decimal::ZERO => {
                    if let Some(cache) = &self.cache {
                        cache.insert((from, to), rate).await;
                    }

                    return Ok(rate)
                }
                Ok(rate) => warn!(source = live.name(), %from, %to, %rate, "Live source returned a non-positive rate, using fallback dataset"),
                Err(error) => warn!(source = live.name(), %from, %to, "Live rate lookup failed, using fallback dataset: {error}")
            }
        }

        let rate = self.fallback.rate(from, to).ok_or(RateError::Unavailable { from, to })?;
        debug!(%from, %to, %rate, dataset = self.fallback.source(), "Exchange rate served from fallback dataset");

        Ok(rate)
    }
}
