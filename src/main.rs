use std::io::{stderr, stdout, BufWriter, Write};
use std::process::exit;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use bank_transfer_engine::batch::BatchRunner;
use bank_transfer_engine::config::EngineConfig;
use bank_transfer_engine::engine::TransferEngine;
use bank_transfer_engine::provisioning::AccountProvisioner;
use bank_transfer_engine::rates::{ExchangeRateResolver, FallbackRates, HttpRateSource, RateSource};
use bank_transfer_engine::storage::{AccountStorage, LedgerStore};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: bank-transfer-engine [accounts].csv [transfers].csv [log_level:optional] > [output].csv");
        eprintln!("Available log levels: error, warn, info, debug, trace (default: error)");
        exit(1);
    }

    let accounts_path = &args[1];
    let transfers_path = &args[2];
    let log_level = args.get(3)
        .map(|s| parse_log_level(s)).unwrap_or_else(|| LevelFilter::ERROR);

    setup_logging(log_level);

    let config = EngineConfig::from_env()?;
    let storage = Arc::new(AccountStorage::new());
    let resolver = Arc::new(build_resolver(&config)?);
    let engine = Arc::new(TransferEngine::new(storage.clone(), resolver, config.conversion_spread));
    let provisioner = AccountProvisioner::new(
        storage.clone(),
        config.institution_prefix.clone(),
        config.account_number_max_attempts,
        config.opening_balance
    );
    let runner = BatchRunner::new(engine, provisioner);

    let opened = runner.seed_accounts(accounts_path).await?;
    info!("Opened {opened} accounts");

    let timer = Instant::now();
    let summary = runner.run_transfers(transfers_path).await?;
    let duration = timer.elapsed();

    info!(completed = summary.completed, rejected = summary.rejected_total(), "Processed transfers in: {duration:?}");

    write_results_to_stdout(storage).await?;

    Ok(())
}

fn build_resolver(config: &EngineConfig) -> Result<ExchangeRateResolver> {
    let fallback = match &config.fallback_rates_path {
        Some(path) => FallbackRates::load(path)?,
        None => FallbackRates::default()
    };

    let live = match &config.rate_api_url {
        Some(url) => {
            let source = HttpRateSource::new(url.clone(), config.rate_api_key.clone(), config.rate_timeout)?;
            Some(Arc::new(source) as Arc<dyn RateSource>)
        }
        None => None
    };

    Ok(ExchangeRateResolver::new(live, fallback).with_cache_ttl(config.rate_cache_ttl))
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: Results go to stdout, so logging has to stay on stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

async fn write_results_to_stdout(storage: Arc<AccountStorage>) -> Result<()> {
    let accounts = storage.accounts().await;
    let mut output = BufWriter::new(stdout().lock());

    writeln!(output, "account_number,owner,currency,balance,status")?;

    for account in accounts {
        writeln!(
            output,
            "{},{},{},{},{}",
            account.account_number,
            account.owner_id,
            account.currency,
            account.balance(),
            account.status
        )?;
    }

    output.flush()?;

    Ok(())
}
