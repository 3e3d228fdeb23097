use crate::models::{Account, AccountStatus, AccountType};
use crate::types::{AccountId, AccountNumber, Currency, Money, OwnerId, TransactionId};
use thiserror::Error;

/// Every way a transfer, preview or ledger lookup can be rejected.
///
/// Each kind carries a stable machine code (see `code`) so callers can tell
/// "insufficient funds" apart from "rate unavailable" without parsing text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Account [{account_number}] was not found")]
    AccountNotFound {
        account_number: String
    },
    #[error("Account [{account_number}] is {status} and cannot take part in a transfer")]
    AccountInactive {
        account_number: AccountNumber,
        status: AccountStatus
    },
    #[error("Owner [{owner_id}] does not have an active account")]
    NoActiveAccount {
        owner_id: OwnerId
    },
    #[error("Sender and receiver cannot be the same account [{account_number}]")]
    SameAccount {
        account_number: AccountNumber
    },
    #[error("Cannot convert [{currency}] to the same currency")]
    SameCurrency {
        currency: Currency
    },
    #[error("Amount [{amount}] must be greater than zero with at most two decimal places")]
    InvalidAmount {
        amount: String
    },
    #[error("Requested currency [{requested}] does not match the receiver's currency [{expected}]")]
    CurrencyMismatch {
        requested: Currency,
        expected: Currency
    },
    #[error("Insufficient funds in account [{account_number}]: balance [{balance}], required [{required}]")]
    InsufficientFunds {
        account_number: AccountNumber,
        balance: Money,
        required: Money
    },
    #[error("No exchange rate available for [{from}] -> [{to}]")]
    RateUnavailable {
        from: Currency,
        to: Currency
    },
    #[error("Transaction [{transaction_id}] was not found")]
    TransactionNotFound {
        transaction_id: TransactionId
    },
    #[error("Account [{account_id}] cannot move from {from} to {to}")]
    InvalidStatusTransition {
        account_id: AccountId,
        from: AccountStatus,
        to: AccountStatus
    },
    #[error("Numeric overflow while updating account [{account_number}]")]
    Overflow {
        account_number: AccountNumber
    },
    #[error("Ledger storage failure: {0}")]
    Storage(String)
}

impl TransferError {
    pub fn account_not_found(account_number: impl ToString) -> Self {
        Self::AccountNotFound { account_number: account_number.to_string() }
    }

    pub fn account_inactive(account: &Account) -> Self {
        Self::AccountInactive {
            account_number: account.account_number.clone(),
            status: account.status
        }
    }

    pub fn same_account(account: &Account) -> Self {
        Self::SameAccount { account_number: account.account_number.clone() }
    }

    pub fn insufficient_funds(account: &Account, required: Money) -> Self {
        Self::InsufficientFunds {
            account_number: account.account_number.clone(),
            balance: account.balance(),
            required
        }
    }

    pub fn overflow(account: &Account) -> Self {
        Self::Overflow { account_number: account.account_number.clone() }
    }

    /// Stable, machine readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AccountNotFound { .. } => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive { .. } => "ACCOUNT_INACTIVE",
            Self::NoActiveAccount { .. } => "NO_ACTIVE_ACCOUNT",
            Self::SameAccount { .. } => "SAME_ACCOUNT",
            Self::SameCurrency { .. } => "SAME_CURRENCY",
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::RateUnavailable { .. } => "RATE_UNAVAILABLE",
            Self::TransactionNotFound { .. } => "TRANSACTION_NOT_FOUND",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::Overflow { .. } => "OVERFLOW",
            Self::Storage(_) => "STORAGE_FAILURE"
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProvisioningError {
    #[error("No unused account number found after [{attempts}] attempts")]
    NumberSpaceExhausted {
        attempts: u32
    },
    #[error("Account number [{0}] is already assigned")]
    DuplicateAccountNumber(AccountNumber),
    #[error("Owner [{owner_id}] already holds a {account_type:?} account")]
    AccountTypeTaken {
        owner_id: OwnerId,
        account_type: AccountType
    },
    #[error("Account number [{account_number}] does not encode account type {account_type:?}")]
    InvalidAccountNumber {
        account_number: AccountNumber,
        account_type: AccountType
    },
    #[error("Suffix [{0}] does not fit in eight digits")]
    InvalidSuffix(u32),
    #[error("Opening balance [{0}] cannot be negative")]
    NegativeOpeningBalance(Money)
}
