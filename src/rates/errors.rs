use crate::types::Currency;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RateError {
    #[error("Rate source request failed: {0}")]
    Request(String),
    #[error("Rate source reported a failure: {0}")]
    SourceFailure(String),
    #[error("Rate source response has no rate for [{from}] -> [{to}]")]
    MissingRate {
        from: Currency,
        to: Currency
    },
    #[error("Rate for [{from}] -> [{to}] is not positive")]
    NonPositiveRate {
        from: Currency,
        to: Currency
    },
    #[error("Fallback rate dataset could not be loaded: {0}")]
    Dataset(String),
    #[error("No exchange rate available for [{from}] -> [{to}]")]
    Unavailable {
        from: Currency,
        to: Currency
    }
}
