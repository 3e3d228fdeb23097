use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("Money error: {0}")]
    InvalidMoney(String),
    #[error("Money error: [{0}] has more than two decimal places")]
    TooManyDecimalPlaces(String),
    #[error("Currency [{0}] is not supported")]
    UnsupportedCurrency(String),
    #[error("Account number [{0}] must be exactly 12 digits")]
    InvalidAccountNumber(String),
    #[error("Institution prefix [{0}] must be exactly 3 digits")]
    InvalidInstitutionPrefix(String)
}
