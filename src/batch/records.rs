use serde::Deserialize;

use crate::models::{AccountStatus, AccountType};
use crate::types::{AccountNumber, Currency, Money, OwnerId};

/// One row of the accounts file. Without a number the account is provisioned.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRecord {
    pub owner: OwnerId,
    pub account_type: AccountType,
    pub currency: Currency,
    pub balance: Money,
    #[serde(default)]
    pub status: Option<AccountStatus>,
    #[serde(default)]
    pub account_number: Option<AccountNumber>
}

/// One row of the transfers file. `owner` is the authenticated sender.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferRecord {
    pub owner: OwnerId,
    pub receiver: String,
    /// Kept as text so malformed or sub-cent amounts surface as a rejected
    /// transfer, not a skipped row.
    pub amount: String,
    pub to_currency: Currency,
    #[serde(default)]
    pub description: Option<String>
}
