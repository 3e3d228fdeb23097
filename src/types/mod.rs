mod account_number;
mod currency;
mod errors;
mod money;
#[cfg(test)]
mod tests;

pub use account_number::{AccountNumber, InstitutionPrefix};
pub use currency::Currency;
pub use errors::TypeError;
pub use money::Money;

pub type AccountId = u64;
pub type OwnerId = u64;
pub type TransactionId = uuid::Uuid;
