mod account_storage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Account, AccountStatus, NewAccount, ProvisioningError, Transaction, TransferError};
use crate::types::{AccountId, AccountNumber, Money, OwnerId, TransactionId};

pub use account_storage::AccountStorage;

/// Durable home of accounts and transfer records.
///
/// Balances change only through `apply_transfer`, which must re-check funds
/// and commit both halves of a transfer as one unit. Implementations lock
/// accounts in ascending `AccountId` order.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    async fn account_number_exists(&self, account_number: &AccountNumber) -> bool;

    /// Persists a provisioned account and assigns its numeric id.
    ///
    /// # Errors
    /// - `DuplicateAccountNumber` if the number is already assigned.
    /// - `AccountTypeTaken` if the owner already holds an account of this type.
    async fn insert_account(&self, new_account: NewAccount) -> Result<Account, ProvisioningError>;

    async fn account(&self, account_id: AccountId) -> Option<Account>;

    async fn account_by_number(&self, account_number: &AccountNumber) -> Option<Account>;

    /// All accounts of one owner, ordered by id.
    async fn accounts_for(&self, owner_id: OwnerId) -> Vec<Account>;

    /// All accounts, ordered by id.
    async fn accounts(&self) -> Vec<Account>;

    /// The owner's lowest-id active account.
    async fn active_account_for(&self, owner_id: OwnerId) -> Result<Account, TransferError>;

    /// Consistent snapshots of both transfer parties, taken under both locks.
    ///
    /// # Errors
    /// - `AccountNotFound` if either account does not exist.
    /// - `AccountInactive` if either account is not active.
    async fn fetch_for_transfer(&self, sender_id: AccountId, receiver_number: &AccountNumber) -> Result<(Account, Account), TransferError>;

    /// Debits the sender and credits the receiver as one indivisible unit,
    /// returning the commit timestamp.
    ///
    /// # Errors
    /// - `InsufficientFunds` if the sender cannot cover `debit` at commit time.
    /// - `AccountInactive` if either party was deactivated since validation.
    async fn apply_transfer(&self, sender_id: AccountId, receiver_id: AccountId, debit: Money, credit: Money) -> Result<DateTime<Utc>, TransferError>;

    async fn set_status(&self, account_id: AccountId, status: AccountStatus) -> Result<Account, TransferError>;

    /// Inserts or updates a transfer record. Terminal records are immutable.
    async fn save_transaction(&self, transaction: Transaction) -> Result<(), TransferError>;

    async fn transaction(&self, transaction_id: TransactionId) -> Option<Transaction>;

    /// Every record touching the account, newest first.
    async fn transactions_for(&self, account_id: AccountId) -> Vec<Transaction>;
}
