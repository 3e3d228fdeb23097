use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Direction, Transaction, TransactionStatus, TransferError};
use crate::types::{AccountNumber, Currency, Money, TransactionId};

/// Inbound transfer payload, already authenticated and shape-validated.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferRequest {
    pub receiver_account_number: String,
    /// In the sender's currency.
    pub amount: Money,
    /// Must equal the receiver's currency.
    pub to_currency: Currency,
    #[serde(default)]
    pub description: Option<String>
}

impl TransferRequest {
    /// Builds a request from a raw decimal, rejecting sub-cent precision.
    pub fn new(receiver_account_number: impl Into<String>, amount: Decimal, to_currency: Currency, description: Option<String>) -> Result<Self, TransferError> {
        let amount = Money::new(amount).map_err(|_| TransferError::InvalidAmount { amount: amount.to_string() })?;

        Ok(Self {
            receiver_account_number: receiver_account_number.into(),
            amount,
            to_currency,
            description
        })
    }
}

/// Inbound payload of the non-mutating conversion preview.
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewRequest {
    pub amount: Money,
    pub to_currency: Currency
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferReceipt {
    pub transaction_id: TransactionId,
    pub status: TransactionStatus,
    pub amount: Money,
    pub currency: Currency,
    pub to_currency: Currency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<Decimal>,
    pub credited_amount: Money,
    pub timestamp: DateTime<Utc>
}

impl From<&Transaction> for TransferReceipt {
    fn from(transaction: &Transaction) -> Self {
        Self {
            transaction_id: transaction.transaction_id,
            status: transaction.status,
            amount: transaction.amount,
            currency: transaction.currency,
            to_currency: transaction.to_currency,
            exchange_rate: transaction.exchange_rate,
            credited_amount: transaction.credited_amount,
            timestamp: transaction.timestamp
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversionPreview {
    pub from_currency: Currency,
    pub to_currency: Currency,
    pub amount: Money,
    pub converted_amount: Money,
    pub exchange_rate: Decimal,
    pub spread: Decimal,
    pub spread_amount: Money,
    /// What the receiver would be credited: `converted_amount + spread_amount`.
    pub total_amount: Money
}

/// One line of an owner's transaction history.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub account_number: AccountNumber,
    pub direction: Direction,
    #[serde(flatten)]
    pub transaction: Transaction
}
