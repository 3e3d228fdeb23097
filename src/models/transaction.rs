use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::errors::TransferError;
use crate::models::{Account, Direction, TransactionStatus};
use crate::types::{AccountId, Currency, Money, TransactionId};

/// A transfer record between two accounts.
///
/// Created `PENDING` right before the balance mutation and moved exactly once
/// to `COMPLETED` or `FAILED`; after that it is an immutable ledger fact.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub transaction_id: TransactionId,
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    /// Debited amount, in the sender's currency.
    pub amount: Money,
    /// Sender's currency.
    pub currency: Currency,
    /// Receiver's currency at creation time.
    pub to_currency: Currency,
    /// Only present when the transfer crossed currencies.
    pub exchange_rate: Option<Decimal>,
    /// Credited amount, in the receiver's currency.
    pub credited_amount: Money,
    pub status: TransactionStatus,
    pub timestamp: DateTime<Utc>,
    pub description: Option<String>
}

impl Transaction {
    pub fn pending(
        sender: &Account,
        receiver: &Account,
        amount: Money,
        credited_amount: Money,
        exchange_rate: Option<Decimal>,
        description: Option<String>
    ) -> Result<Self, TransferError> {
        if sender.account_id == receiver.account_id {
            return Err(TransferError::same_account(sender))
        }

        if !amount.is_positive() {
            return Err(TransferError::InvalidAmount { amount: amount.to_string() })
        }

        Ok(Self {
            transaction_id: Uuid::new_v4(),
            sender_id: sender.account_id,
            receiver_id: receiver.account_id,
            amount,
            currency: sender.currency,
            to_currency: receiver.currency,
            exchange_rate,
            credited_amount,
            status: TransactionStatus::Pending,
            timestamp: Utc::now(),
            description
        })
    }

    pub fn complete(&mut self, committed_at: DateTime<Utc>) -> Result<(), TransferError> {
        self.finish(TransactionStatus::Completed)?;
        self.timestamp = committed_at;

        Ok(())
    }

    pub fn fail(&mut self) -> Result<(), TransferError> {
        self.finish(TransactionStatus::Failed)
    }

    pub fn direction_for(&self, account_id: AccountId) -> Direction {
        if account_id == self.sender_id {
            Direction::Debit
        } else if account_id == self.receiver_id {
            Direction::Credit
        } else {
            Direction::Unknown
        }
    }

    pub fn involves(&self, account_id: AccountId) -> bool {
        self.sender_id == account_id || self.receiver_id == account_id
    }

    fn finish(&mut self, status: TransactionStatus) -> Result<(), TransferError> {
        if self.status.is_terminal() {
            return Err(TransferError::Storage(format!(
                "Transaction [{}] is already {} and cannot become {}", self.transaction_id, self.status, status
            )))
        }

        self.status = status;

        Ok(())
    }
}
