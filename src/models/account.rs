use crate::models::errors::{ProvisioningError, TransferError};
use crate::models::{AccountStatus, AccountType};
use crate::types::{AccountId, AccountNumber, Currency, Money, OwnerId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Represents the state of a single customer account.
///
/// The balance is private: the only writers are `debit` and `credit`, which
/// the ledger store calls from inside its atomic transfer scope.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    /// Store assigned numeric identity. Also the global lock order.
    pub account_id: AccountId,
    /// The user identity that owns this account.
    pub owner_id: OwnerId,
    /// Public, immutable 12 digit identifier.
    pub account_number: AccountNumber,
    pub account_type: AccountType,
    pub currency: Currency,
    pub status: AccountStatus,
    pub opened_at: DateTime<Utc>,
    /// Commit time of the most recent transfer touching this account.
    pub last_transaction_date: Option<DateTime<Utc>>,
    balance: Money
}

/// A fully provisioned account that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub owner_id: OwnerId,
    pub account_number: AccountNumber,
    pub account_type: AccountType,
    pub currency: Currency,
    pub opening_balance: Money
}

impl NewAccount {
    /// Checks the invariants a record must satisfy before the store accepts it.
    pub fn validate(&self) -> Result<(), ProvisioningError> {
        if self.opening_balance.is_negative() {
            return Err(ProvisioningError::NegativeOpeningBalance(self.opening_balance))
        }

        if self.account_number.type_code() != self.account_type.type_code() {
            return Err(ProvisioningError::InvalidAccountNumber {
                account_number: self.account_number.clone(),
                account_type: self.account_type
            })
        }

        Ok(())
    }
}

impl Account {
    pub(crate) fn open(account_id: AccountId, new_account: NewAccount) -> Self {
        Self {
            account_id,
            owner_id: new_account.owner_id,
            account_number: new_account.account_number,
            account_type: new_account.account_type,
            currency: new_account.currency,
            status: AccountStatus::Active,
            opened_at: Utc::now(),
            last_transaction_date: None,
            balance: new_account.opening_balance
        }
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Fails unless the account may send or receive a transfer.
    pub fn ensure_active(&self) -> Result<(), TransferError> {
        if !self.is_active() {
            return Err(TransferError::account_inactive(self))
        }

        Ok(())
    }

    /// Moves the account to a new status. `closed` is terminal.
    pub fn transition(&mut self, status: AccountStatus) -> Result<(), TransferError> {
        if self.status == AccountStatus::Closed && status != AccountStatus::Closed {
            return Err(TransferError::InvalidStatusTransition {
                account_id: self.account_id,
                from: self.status,
                to: status
            })
        }

        self.status = status;

        Ok(())
    }

    pub(crate) fn debit(&mut self, amount: Money, at: DateTime<Utc>) -> Result<(), TransferError> {
        if self.balance < amount {
            return Err(TransferError::insufficient_funds(self, amount))
        }

        self.balance = self.balance.checked_sub(amount)
            .ok_or_else(|| TransferError::overflow(self))?;
        self.last_transaction_date = Some(at);

        Ok(())
    }

    pub(crate) fn credit(&mut self, amount: Money, at: DateTime<Utc>) -> Result<(), TransferError> {
        self.balance = self.balance.checked_add(amount)
            .ok_or_else(|| TransferError::overflow(self))?;
        self.last_transaction_date = Some(at);

        Ok(())
    }
}
