use super::mock::{StaticRateSource, UnreachableRateSource};
use super::{ExchangeRateResolver, FallbackRates, HttpRateSource, RateError, RateSource};
use crate::types::Currency;
use anyhow::Result;
use mockito::Matcher;
use rust_decimal::Decimal;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

const DATASET: &str = r#"{
    "USD": {"EUR": 0.90, "GBP": 0.75, "JPY": 150.0},
    "EUR": {"USD": 1.18},
    "CHF": {"USD": 1.10}
}"#;

fn latest_body(success: bool, rates: &str) -> String {
    format!(r#"{{"success": {success}, "timestamp": 1519296206, "base": "USD", "rates": {rates}}}"#)
}

#[test]
fn test_fallback_dataset_parses_supported_pairs_only() -> Result<()> {
    let rates = FallbackRates::from_json("inline", DATASET)?;

    assert_eq!(rates.len(), 3);
    assert_eq!(rates.rate(Currency::Usd, Currency::Eur), Some(Decimal::from_str("0.90")?));
    assert_eq!(rates.rate(Currency::Eur, Currency::Usd), Some(Decimal::from_str("1.18")?));
    assert_eq!(rates.rate(Currency::Gbp, Currency::Usd), None);

    Ok(())
}

#[test]
fn test_fallback_dataset_rejects_non_positive_rates_and_bad_json() {
    let negative = FallbackRates::from_json("inline", r#"{"USD": {"EUR": -0.5}}"#);
    let malformed = FallbackRates::from_json("inline", r#"{"USD": ["EUR"]}"#);

    assert!(matches!(negative, Err(RateError::Dataset(_))));
    assert!(matches!(malformed, Err(RateError::Dataset(_))));
}

#[test]
fn test_fallback_dataset_loads_from_file_and_builtin_covers_every_pair() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{DATASET}")?;

    let loaded = FallbackRates::load(file.path())?;
    assert_eq!(loaded.rate(Currency::Usd, Currency::Gbp), Some(Decimal::from_str("0.75")?));
    assert!(FallbackRates::load("missing_rates.json").is_err());

    let builtin = FallbackRates::default();
    for from in Currency::ALL {
        for to in Currency::ALL.into_iter().filter(|to| *to != from) {
            assert!(builtin.rate(from, to).is_some_and(|rate| rate > Decimal::ZERO), "missing {from} -> {to}");
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_resolver_prefers_live_source() -> Result<()> {
    let live = Arc::new(StaticRateSource::new(Decimal::from_str("0.81")?));
    let resolver = ExchangeRateResolver::new(Some(live.clone()), FallbackRates::from_json("inline", DATASET)?);

    assert_eq!(resolver.resolve(Currency::Usd, Currency::Eur).await?, Decimal::from_str("0.81")?);
    assert_eq!(live.calls(), 1);

    Ok(())
}

#[tokio::test]
async fn test_resolver_falls_back_when_live_source_is_unreachable() -> Result<()> {
    let resolver = ExchangeRateResolver::new(Some(Arc::new(UnreachableRateSource)), FallbackRates::from_json("inline", DATASET)?);

    assert_eq!(resolver.resolve(Currency::Usd, Currency::Eur).await?, Decimal::from_str("0.90")?);

    Ok(())
}

#[tokio::test]
async fn test_resolver_fails_when_neither_source_knows_the_pair() -> Result<()> {
    let resolver = ExchangeRateResolver::new(Some(Arc::new(UnreachableRateSource)), FallbackRates::from_json("inline", DATASET)?);

    let result = resolver.resolve(Currency::Gbp, Currency::Eur).await;

    assert_eq!(result, Err(RateError::Unavailable { from: Currency::Gbp, to: Currency::Eur }));

    Ok(())
}

#[tokio::test]
async fn test_resolver_identity_pair_needs_no_lookup() -> Result<()> {
    let live = Arc::new(StaticRateSource::new(Decimal::from_str("0.5")?));
    let resolver = ExchangeRateResolver::new(Some(live.clone()), FallbackRates::default());

    assert_eq!(resolver.resolve(Currency::Gbp, Currency::Gbp).await?, Decimal::ONE);
    assert_eq!(live.calls(), 0);

    Ok(())
}

#[tokio::test]
async fn test_resolver_cache_serves_repeated_lookups() -> Result<()> {
    let live = Arc::new(StaticRateSource::new(Decimal::from_str("0.81")?));
    let resolver = ExchangeRateResolver::new(Some(live.clone()), FallbackRates::default())
        .with_cache_ttl(Duration::from_secs(60));

    resolver.resolve(Currency::Usd, Currency::Eur).await?;
    resolver.resolve(Currency::Usd, Currency::Eur).await?;
    resolver.resolve(Currency::Eur, Currency::Usd).await?;

    assert_eq!(live.calls(), 2);

    Ok(())
}

#[tokio::test]
async fn test_http_source_reads_requested_rate() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("GET", "/latest")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("access_key".into(), "secret".into()),
            Matcher::UrlEncoded("base".into(), "USD".into()),
            Matcher::UrlEncoded("symbols".into(), "EUR".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(latest_body(true, r#"{"EUR": 0.813399}"#))
        .create_async()
        .await;

    let source = HttpRateSource::new(format!("{}/latest", server.url()), Some("secret".to_string()), Duration::from_secs(5))?;

    assert_eq!(source.fetch(Currency::Usd, Currency::Eur).await?, Decimal::from_str("0.813399")?);
    mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn test_http_source_treats_failure_flag_and_missing_key_as_errors() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _failure = server.mock("GET", "/failure")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"success": false, "error": {"code": 105, "type": "function_access_restricted"}}"#)
        .create_async()
        .await;
    let _missing = server.mock("GET", "/missing")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(latest_body(true, r#"{"GBP": 0.72}"#))
        .create_async()
        .await;
    let _broken = server.mock("GET", "/broken")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let timeout = Duration::from_secs(5);
    let failure = HttpRateSource::new(format!("{}/failure", server.url()), None, timeout)?;
    let missing = HttpRateSource::new(format!("{}/missing", server.url()), None, timeout)?;
    let broken = HttpRateSource::new(format!("{}/broken", server.url()), None, timeout)?;

    assert!(matches!(failure.fetch(Currency::Usd, Currency::Eur).await, Err(RateError::SourceFailure(_))));
    assert!(matches!(missing.fetch(Currency::Usd, Currency::Eur).await, Err(RateError::MissingRate { .. })));
    assert!(matches!(broken.fetch(Currency::Usd, Currency::Eur).await, Err(RateError::Request(_))));

    Ok(())
}

#[tokio::test]
async fn test_resolver_falls_back_after_source_reported_failure() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _failure = server.mock("GET", "/latest")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"success": false}"#)
        .create_async()
        .await;

    let live = HttpRateSource::new(format!("{}/latest", server.url()), None, Duration::from_secs(5))?;
    let resolver = ExchangeRateResolver::new(Some(Arc::new(live)), FallbackRates::from_json("inline", DATASET)?);

    assert_eq!(resolver.resolve(Currency::Usd, Currency::Eur).await?, Decimal::from_str("0.90")?);

    Ok(())
}
