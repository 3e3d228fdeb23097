use crate::rates::RateError;
use crate::types::Currency;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Local rate table used whenever the live source cannot answer.
///
/// The on-disk format maps source code -> target code -> rate:
/// `{"USD": {"EUR": 0.85, "GBP": 0.75}, ...}`. Codes the engine does not
/// support are skipped.
#[derive(Debug, Clone)]
pub struct FallbackRates {
    source: String,
    rates: HashMap<(Currency, Currency), Decimal>
}

impl FallbackRates {
    pub fn from_json(source: impl Into<String>, json: &str) -> Result<Self, RateError> {
        let source = source.into();
        let raw: HashMap<String, HashMap<String, Decimal>> = serde_json::from_str(json)
            .map_err(|error| RateError::Dataset(format!("{source}: {error}")))?;

        let mut rates = HashMap::new();

        for (from_code, targets) in raw {
            let Ok(from) = Currency::from_str(&from_code) else {
                warn!("Skipping unsupported fallback currency [{from_code}] in {source}");
                continue
            };

            for (to_code, rate) in targets {
                let Ok(to) = Currency::from_str(&to_code) else {
                    warn!("Skipping unsupported fallback currency [{to_code}] in {source}");
                    continue
                };

                if rate <= Decimal::ZERO {
                    return Err(RateError::Dataset(format!("{source}: rate {from} -> {to} must be positive, found {rate}")))
                }

                rates.insert((from, to), rate);
            }
        }

        info!(pairs = rates.len(), "Loaded fallback exchange rates from {source}");

        Ok(Self { source, rates })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RateError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|error| RateError::Dataset(format!("{}: {error}", path.display())))?;

        Self::from_json(path.display().to_string(), &json)
    }

    pub fn rate(&self, from: Currency, to: Currency) -> Option<Decimal> {
        self.rates.get(&(from, to)).copied()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl Default for FallbackRates {
    /// The dataset shipped with the crate (`exchange_rates.json`).
    fn default() -> Self {
        let rates = [
            ((Currency::Usd, Currency::Eur), Decimal::new(85, 2)),
            ((Currency::Usd, Currency::Gbp), Decimal::new(75, 2)),
            ((Currency::Eur, Currency::Usd), Decimal::new(118, 2)),
            ((Currency::Eur, Currency::Gbp), Decimal::new(88, 2)),
            ((Currency::Gbp, Currency::Usd), Decimal::new(133, 2)),
            ((Currency::Gbp, Currency::Eur), Decimal::new(114, 2)),
        ];

        Self {
            source: "built-in".to_string(),
            rates: rates.into_iter().collect()
        }
    }
}
