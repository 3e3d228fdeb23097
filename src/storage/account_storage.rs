use crate::models::{Account, AccountStatus, AccountType, NewAccount, ProvisioningError, Transaction, TransferError};
use crate::storage::LedgerStore;
use crate::types::{AccountId, AccountNumber, Money, OwnerId, TransactionId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

type AccountHandle = Arc<Mutex<Account>>;

/// In-memory ledger with one async mutex per account.
///
/// The `DashMap` indexes only hand out cloned handles; no index guard is ever
/// held across an `.await`.
pub struct AccountStorage {
    accounts: DashMap<AccountId, AccountHandle>,
    numbers: DashMap<AccountNumber, AccountId>,
    owners: DashMap<OwnerId, Vec<(AccountType, AccountId)>>,
    transactions: DashMap<TransactionId, Transaction>,
    next_account_id: AtomicU64
}

impl AccountStorage {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            numbers: DashMap::new(),
            owners: DashMap::new(),
            transactions: DashMap::new(),
            next_account_id: AtomicU64::new(1)
        }
    }

    fn handle(&self, account_id: AccountId) -> Option<AccountHandle> {
        self.accounts.get(&account_id).map(|entry| entry.value().clone())
    }

    async fn snapshot(&self, account_ids: Vec<AccountId>) -> Vec<Account> {
        let mut accounts = Vec::with_capacity(account_ids.len());

        for account_id in account_ids {
            if let Some(handle) = self.handle(account_id) {
                accounts.push(handle.lock().await.clone());
            }
        }

        accounts.sort_by_key(|account| account.account_id);
        accounts
    }

    /// Locks two distinct accounts in ascending id order and returns the guards
    /// as `(sender, receiver)`.
    async fn lock_pair(
        sender_id: AccountId,
        sender: AccountHandle,
        receiver_id: AccountId,
        receiver: AccountHandle
    ) -> (OwnedMutexGuard<Account>, OwnedMutexGuard<Account>) {
        if sender_id < receiver_id {
            let sender_guard = sender.lock_owned().await;
            let receiver_guard = receiver.lock_owned().await;
            (sender_guard, receiver_guard)
        } else {
            let receiver_guard = receiver.lock_owned().await;
            let sender_guard = sender.lock_owned().await;
            (sender_guard, receiver_guard)
        }
    }

    fn sender_handle(&self, sender_id: AccountId) -> Result<AccountHandle, TransferError> {
        self.handle(sender_id)
            .ok_or_else(|| TransferError::account_not_found(format!("#{sender_id}")))
    }
}

impl Default for AccountStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for AccountStorage {
    async fn account_number_exists(&self, account_number: &AccountNumber) -> bool {
        self.numbers.contains_key(account_number)
    }

    async fn insert_account(&self, new_account: NewAccount) -> Result<Account, ProvisioningError> {
        new_account.validate()?;

        let mut owned = self.owners.entry(new_account.owner_id).or_default();

        if owned.iter().any(|(account_type, _)| *account_type == new_account.account_type) {
            return Err(ProvisioningError::AccountTypeTaken {
                owner_id: new_account.owner_id,
                account_type: new_account.account_type
            })
        }

        let account = match self.numbers.entry(new_account.account_number.clone()) {
            Entry::Occupied(entry) => {
                return Err(ProvisioningError::DuplicateAccountNumber(entry.key().clone()))
            }
            Entry::Vacant(slot) => {
                let account_id = self.next_account_id.fetch_add(1, Ordering::SeqCst);
                let account = Account::open(account_id, new_account);

                self.accounts.insert(account_id, Arc::new(Mutex::new(account.clone())));
                slot.insert(account_id);
                account
            }
        };

        owned.push((account.account_type, account.account_id));
        debug!(account_id = account.account_id, account_number = %account.account_number, "Account persisted");

        Ok(account)
    }

    async fn account(&self, account_id: AccountId) -> Option<Account> {
        let handle = self.handle(account_id)?;
        let account = handle.lock().await.clone();
        Some(account)
    }

    async fn account_by_number(&self, account_number: &AccountNumber) -> Option<Account> {
        let account_id = self.numbers.get(account_number).map(|entry| *entry.value())?;
        self.account(account_id).await
    }

    async fn accounts_for(&self, owner_id: OwnerId) -> Vec<Account> {
        let account_ids: Vec<AccountId> = self.owners.get(&owner_id)
            .map(|entry| entry.value().iter().map(|(_, account_id)| *account_id).collect())
            .unwrap_or_default();

        self.snapshot(account_ids).await
    }

    async fn accounts(&self) -> Vec<Account> {
        let account_ids: Vec<AccountId> = self.accounts.iter().map(|entry| *entry.key()).collect();
        self.snapshot(account_ids).await
    }

    async fn active_account_for(&self, owner_id: OwnerId) -> Result<Account, TransferError> {
        self.accounts_for(owner_id).await
            .into_iter()
            .find(|account| account.is_active())
            .ok_or(TransferError::NoActiveAccount { owner_id })
    }

    async fn fetch_for_transfer(&self, sender_id: AccountId, receiver_number: &AccountNumber) -> Result<(Account, Account), TransferError> {
        let sender = self.sender_handle(sender_id)?;
        let receiver_id = self.numbers.get(receiver_number)
            .map(|entry| *entry.value())
            .ok_or_else(|| TransferError::account_not_found(receiver_number))?;

        if receiver_id == sender_id {
            let account = sender.lock().await.clone();
            account.ensure_active()?;
            return Ok((account.clone(), account))
        }

        let receiver = self.handle(receiver_id)
            .ok_or_else(|| TransferError::account_not_found(receiver_number))?;
        let (sender_guard, receiver_guard) = Self::lock_pair(sender_id, sender, receiver_id, receiver).await;

        sender_guard.ensure_active()?;
        receiver_guard.ensure_active()?;

        Ok((sender_guard.clone(), receiver_guard.clone()))
    }

    async fn apply_transfer(&self, sender_id: AccountId, receiver_id: AccountId, debit: Money, credit: Money) -> Result<DateTime<Utc>, TransferError> {
        let sender = self.sender_handle(sender_id)?;

        if sender_id == receiver_id {
            let account = sender.lock().await;
            return Err(TransferError::same_account(&account))
        }

        let receiver = self.handle(receiver_id)
            .ok_or_else(|| TransferError::account_not_found(format!("#{receiver_id}")))?;
        let (mut sender_guard, mut receiver_guard) = Self::lock_pair(sender_id, sender, receiver_id, receiver).await;

        sender_guard.ensure_active()?;
        receiver_guard.ensure_active()?;

        //NOTE: Both halves are computed on copies first so a failure on either side leaves the stored accounts untouched
        let committed_at = Utc::now();
        let mut debited = sender_guard.clone();
        let mut credited = receiver_guard.clone();

        if let Err(error) = debited.debit(debit, committed_at) {
            warn!(sender_id, receiver_id, %debit, "Atomic balance re-check rejected transfer: {error}");
            return Err(error)
        }

        credited.credit(credit, committed_at)?;

        *sender_guard = debited;
        *receiver_guard = credited;

        debug!(sender_id, receiver_id, %debit, %credit, "Transfer committed");

        Ok(committed_at)
    }

    async fn set_status(&self, account_id: AccountId, status: AccountStatus) -> Result<Account, TransferError> {
        let handle = self.handle(account_id)
            .ok_or_else(|| TransferError::account_not_found(format!("#{account_id}")))?;
        let mut account = handle.lock().await;

        account.transition(status)?;

        Ok(account.clone())
    }

    async fn save_transaction(&self, transaction: Transaction) -> Result<(), TransferError> {
        match self.transactions.entry(transaction.transaction_id) {
            Entry::Occupied(mut entry) => {
                if entry.get().status.is_terminal() {
                    return Err(TransferError::Storage(format!(
                        "Transaction [{}] is {} and immutable", transaction.transaction_id, entry.get().status
                    )))
                }

                entry.insert(transaction);
            }
            Entry::Vacant(entry) => {
                entry.insert(transaction);
            }
        }

        Ok(())
    }

    async fn transaction(&self, transaction_id: TransactionId) -> Option<Transaction> {
        self.transactions.get(&transaction_id).map(|entry| entry.value().clone())
    }

    async fn transactions_for(&self, account_id: AccountId) -> Vec<Transaction> {
        let mut transactions: Vec<Transaction> = self.transactions.iter()
            .filter(|entry| entry.value().involves(account_id))
            .map(|entry| entry.value().clone())
            .collect();

        transactions.sort_by(|left, right| right.timestamp.cmp(&left.timestamp));
        transactions
    }
}
