mod records;
#[cfg(test)]
mod tests;

use crate::engine::{TransferEngine, TransferReceipt, TransferRequest};
use crate::models::{AccountStatus, NewAccount, TransferError};
use crate::provisioning::{AccountProvisioner, OpenAccount};
use crate::storage::LedgerStore;
use anyhow::Context;
use csv::{ReaderBuilder, Trim};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::{spawn_blocking, JoinSet};
use tracing::{error, info, warn};

pub use records::{AccountRecord, TransferRecord};

/// Outcome counts of one transfers file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub completed: usize,
    /// Rejections keyed by error code.
    pub rejected: BTreeMap<&'static str, usize>
}

impl BatchSummary {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// Drives the engine from CSV files: seeds accounts, then fires every
/// transfer concurrently.
pub struct BatchRunner<S: LedgerStore> {
    engine: Arc<TransferEngine<S>>,
    provisioner: AccountProvisioner<S>
}

impl<S: LedgerStore> BatchRunner<S> {
    pub fn new(engine: Arc<TransferEngine<S>>, provisioner: AccountProvisioner<S>) -> Self {
        Self {
            engine,
            provisioner
        }
    }

    /// Creates every account in the file, returning how many were opened.
    /// Rows the store rejects are logged and skipped.
    pub async fn seed_accounts(&self, path: &str) -> anyhow::Result<usize> {
        let records: Vec<AccountRecord> = read_records(path).await?;
        let mut opened = 0;

        for record in records {
            match self.open(record).await {
                Ok(()) => opened += 1,
                Err(error) => error!("Could not open account: {error:#}")
            }
        }

        Ok(opened)
    }

    async fn open(&self, record: AccountRecord) -> anyhow::Result<()> {
        let store = self.engine.store();

        let account = match record.account_number {
            Some(account_number) => store.insert_account(NewAccount {
                owner_id: record.owner,
                account_number,
                account_type: record.account_type,
                currency: record.currency,
                opening_balance: record.balance
            }).await?,
            None => self.provisioner.open_account(OpenAccount {
                owner_id: record.owner,
                account_type: record.account_type,
                currency: record.currency,
                opening_balance: Some(record.balance)
            }).await?
        };

        if let Some(status) = record.status.filter(|status| *status != AccountStatus::Active) {
            store.set_status(account.account_id, status).await
                .with_context(|| format!("Account [{}] opened but kept active", account.account_number))?;
        }

        Ok(())
    }

    /// Executes every transfer in the file concurrently and waits for all of them.
    pub async fn run_transfers(&self, path: &str) -> anyhow::Result<BatchSummary> {
        let records: Vec<TransferRecord> = read_records(path).await?;
        let mut transfers = JoinSet::new();

        for (index, record) in records.into_iter().enumerate() {
            let engine = self.engine.clone();
            let row = index + 1;

            transfers.spawn(async move { (row, execute(engine, record).await) });
        }

        let mut summary = BatchSummary::default();

        while let Some(joined) = transfers.join_next().await {
            match joined {
                Ok((row, Ok(receipt))) => {
                    info!(row, transaction_id = %receipt.transaction_id, credited = %receipt.credited_amount, "Transfer completed");
                    summary.completed += 1;
                }
                Ok((row, Err(error))) => {
                    warn!(row, code = error.code(), "Transfer rejected: {error}");
                    *summary.rejected.entry(error.code()).or_default() += 1;
                }
                Err(error) => error!("Transfer task did not finish: {error}")
            }
        }

        Ok(summary)
    }
}

async fn execute<S: LedgerStore>(engine: Arc<TransferEngine<S>>, record: TransferRecord) -> Result<TransferReceipt, TransferError> {
    let amount = Decimal::from_str(record.amount.trim())
        .map_err(|_| TransferError::InvalidAmount { amount: record.amount.clone() })?;
    let request = TransferRequest::new(record.receiver, amount, record.to_currency, record.description)?;
    engine.transfer(record.owner, request).await
}

/// Reads a whole CSV file on the blocking pool. Malformed rows are logged and skipped.
async fn read_records<T>(path: &str) -> anyhow::Result<Vec<T>>
where
    T: DeserializeOwned + Send + 'static
{
    let path = PathBuf::from(path);

    spawn_blocking(move || -> anyhow::Result<Vec<T>> {
        let file = File::open(&path)
            .with_context(|| format!("Error opening CSV at path: {}", path.display()))?;

        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let mut records = Vec::new();

        for result in reader.deserialize::<T>() {
            match result {
                Ok(record) => records.push(record),
                Err(error) => error!("CSV deserialization error in {}: {error}", path.display())
            }
        }

        Ok(records)
    }).await?
}
