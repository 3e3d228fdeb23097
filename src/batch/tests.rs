use super::BatchRunner;

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

use tempfile::NamedTempFile;

use crate::engine::TransferEngine;
use crate::models::AccountStatus;
use crate::provisioning::AccountProvisioner;
use crate::rates::{ExchangeRateResolver, FallbackRates};
use crate::storage::{AccountStorage, LedgerStore};
use crate::types::{AccountNumber, InstitutionPrefix, Money};

fn create_temporary_csv(header: &str, rows: &[&str]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;

    writeln!(file, "{header}")?;

    for row in rows {
        writeln!(file, "{row}")?;
    }

    Ok(file)
}

fn runner(storage: Arc<AccountStorage>) -> Result<BatchRunner<AccountStorage>> {
    let resolver = Arc::new(ExchangeRateResolver::offline(FallbackRates::default()));
    let engine = Arc::new(TransferEngine::new(storage.clone(), resolver, Decimal::from_str("0.05")?));
    let provisioner = AccountProvisioner::new(storage, InstitutionPrefix::default(), 16, Money::from_str("10000")?);

    Ok(BatchRunner::new(engine, provisioner))
}

fn path(file: &NamedTempFile) -> Result<&str> {
    file.path().to_str().ok_or_else(|| anyhow!("temporary path is not valid UTF-8"))
}

async fn balance_of(storage: &AccountStorage, number: &str) -> Result<String> {
    let account = storage.account_by_number(&AccountNumber::from_str(number)?).await
        .ok_or_else(|| anyhow!("account {number} missing"))?;

    Ok(account.balance().to_string())
}

const ACCOUNTS_HEADER: &str = "owner,account_type,currency,balance,status,account_number";
const TRANSFERS_HEADER: &str = "owner,receiver,amount,to_currency,description";

#[tokio::test]
async fn test_seeding_provisions_missing_numbers_and_applies_status() -> Result<()> {
    let accounts = create_temporary_csv(ACCOUNTS_HEADER, &[
        "1,savings,USD,500.00,,099100000001",
        "2,current,EUR,0,suspended,",
        "3,savings,GBP,25,,"
    ])?;

    let storage = Arc::new(AccountStorage::new());
    let opened = runner(storage.clone())?.seed_accounts(path(&accounts)?).await?;

    assert_eq!(opened, 3);
    assert_eq!(balance_of(&storage, "099100000001").await?, "500.00");

    let provisioned = storage.accounts_for(2).await;
    assert_eq!(provisioned.len(), 1);
    assert_eq!(provisioned[0].status, AccountStatus::Suspended);
    assert!(provisioned[0].account_number.as_str().starts_with("0992"));

    let third = storage.accounts_for(3).await;
    assert_eq!(third[0].balance().to_string(), "25.00");

    Ok(())
}

#[tokio::test]
async fn test_seeding_skips_malformed_and_duplicate_rows() -> Result<()> {
    let accounts = create_temporary_csv(ACCOUNTS_HEADER, &[
        "1,savings,USD,100,,099100000001",
        "2,savings,JPY,100,,099100000002",
        "3,savings,USD,100,,099100000001",
        "1,savings,USD,100,,099100000004",
        "4,checking,USD,100,,"
    ])?;

    let storage = Arc::new(AccountStorage::new());
    let opened = runner(storage.clone())?.seed_accounts(path(&accounts)?).await?;

    assert_eq!(opened, 1);
    assert_eq!(storage.accounts().await.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_transfers_run_and_rejections_are_counted_by_code() -> Result<()> {
    let accounts = create_temporary_csv(ACCOUNTS_HEADER, &[
        "1,savings,USD,500,,099100000001",
        "2,savings,EUR,0,,099100000002",
        "3,savings,USD,0,closed,099100000003"
    ])?;
    let transfers = create_temporary_csv(TRANSFERS_HEADER, &[
        "1,099100000002,200,EUR,rent",
        "1,099100000003,10,USD,",
        "1,099100000002,5.001,EUR,",
        "1,099100000002,10,GBP,",
        "9,099100000002,10,EUR,",
        "not,a,valid,row,"
    ])?;

    let storage = Arc::new(AccountStorage::new());
    let runner = runner(storage.clone())?;
    runner.seed_accounts(path(&accounts)?).await?;

    let summary = runner.run_transfers(path(&transfers)?).await?;

    assert_eq!(summary.completed, 1);
    assert_eq!(summary.rejected_total(), 4);
    assert_eq!(summary.rejected.get("ACCOUNT_NOT_FOUND"), Some(&1));
    assert_eq!(summary.rejected.get("INVALID_AMOUNT"), Some(&1));
    assert_eq!(summary.rejected.get("CURRENCY_MISMATCH"), Some(&1));
    assert_eq!(summary.rejected.get("NO_ACTIVE_ACCOUNT"), Some(&1));

    assert_eq!(balance_of(&storage, "099100000001").await?, "300.00");
    assert_eq!(balance_of(&storage, "099100000002").await?, "178.50");

    Ok(())
}

#[tokio::test]
async fn test_missing_csv_file_is_an_error() -> Result<()> {
    let storage = Arc::new(AccountStorage::new());
    let runner = runner(storage.clone())?;

    assert!(runner.seed_accounts("missing_accounts.csv").await.is_err());
    assert!(runner.run_transfers("missing_transfers.csv").await.is_err());
    assert!(storage.accounts().await.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_large_amounts_and_lowercase_currencies_keep_exact_cents() -> Result<()> {
    let accounts = create_temporary_csv(ACCOUNTS_HEADER, &[
        "1,savings,usd,1234567890123456.78,,099100000001",
        "2,savings,Usd,0,,099100000002"
    ])?;
    let transfers = create_temporary_csv(TRANSFERS_HEADER, &[
        "1,099100000002,1234567890123456.77,usd,",
        "1,099100000002,ten,USD,"
    ])?;

    let storage = Arc::new(AccountStorage::new());
    let runner = runner(storage.clone())?;

    assert_eq!(runner.seed_accounts(path(&accounts)?).await?, 2);
    assert_eq!(balance_of(&storage, "099100000001").await?, "1234567890123456.78");

    let summary = runner.run_transfers(path(&transfers)?).await?;

    assert_eq!(summary.completed, 1);
    assert_eq!(summary.rejected.get("INVALID_AMOUNT"), Some(&1));
    assert_eq!(balance_of(&storage, "099100000001").await?, "0.01");
    assert_eq!(balance_of(&storage, "099100000002").await?, "1234567890123456.77");

    Ok(())
}
