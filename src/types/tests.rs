use super::{AccountNumber, Currency, InstitutionPrefix, Money, TypeError};
use anyhow::Result;
use rust_decimal::Decimal;
use std::str::FromStr;

#[test]
fn test_money_successfully_parses_valid_strings() -> Result<()> {
    let test_cases = vec![
        ("1.0", "1.00"),
        ("1.12", "1.12"),
        ("0.01", "0.01"),
        ("  1.0  ", "1.00"),
        ("+1.0", "1.00"),
        ("100", "100.00"),
        ("1.500", "1.50"),
        ("-3.25", "-3.25"),
    ];

    for (input_string, expected_output) in test_cases {
        assert_eq!(Money::from_str(input_string)?.to_string(), expected_output);
    }

    Ok(())
}

#[test]
fn test_money_fails_to_parse_invalid_strings() {
    assert!(matches!(Money::from_str("1.123"), Err(TypeError::TooManyDecimalPlaces(_))));
    assert!(Money::from_str("abc").is_err());
    assert!(Money::from_str("1.2.3").is_err());
    assert!(Money::from_str("").is_err());
}

#[test]
fn test_money_rounds_half_to_even_at_cent_precision() -> Result<()> {
    assert_eq!(Money::rounded(Decimal::from_str("1.005")?).to_string(), "1.00");
    assert_eq!(Money::rounded(Decimal::from_str("1.015")?).to_string(), "1.02");
    assert_eq!(Money::rounded(Decimal::from_str("178.5")?).to_string(), "178.50");

    Ok(())
}

#[test]
fn test_money_checked_arithmetic() -> Result<()> {
    let balance = Money::from_str("100.00")?;
    let debit = Money::from_str("60.00")?;

    let remaining = balance.checked_sub(debit).and_then(|value| value.checked_sub(debit));

    assert!(remaining.is_some_and(|value| value.is_negative()));
    assert_eq!(balance.checked_add(debit).map(|value| value.to_string()), Some("160.00".to_string()));
    assert!(Money::from_str("0.01")?.is_positive());
    assert!(!Money::ZERO.is_positive());

    Ok(())
}

#[test]
fn test_money_deserializes_from_decimal_strings_only() -> Result<()> {
    let short: Money = serde_json::from_str("\"12.5\"")?;
    let full: Money = serde_json::from_str("\"12.50\"")?;
    let large: Money = serde_json::from_str("\"1234567890123456.78\"")?;

    assert_eq!(short, full);
    assert_eq!(serde_json::to_string(&short)?, "\"12.50\"");
    assert_eq!(large.to_string(), "1234567890123456.78");
    assert!(serde_json::from_str::<Money>("\"12.505\"").is_err());
    assert!(serde_json::from_str::<Money>("12.5").is_err());

    Ok(())
}

#[test]
fn test_currency_parsing_is_case_insensitive() -> Result<()> {
    assert_eq!(Currency::from_str("usd")?, Currency::Usd);
    assert_eq!(Currency::from_str(" GBP ")?, Currency::Gbp);
    assert_eq!(Currency::Eur.to_string(), "EUR");
    assert!(matches!(Currency::from_str("JPY"), Err(TypeError::UnsupportedCurrency(_))));

    let lowercase: Currency = serde_json::from_str("\"eur\"")?;
    assert_eq!(lowercase, Currency::Eur);
    assert_eq!(serde_json::to_string(&Currency::Gbp)?, "\"GBP\"");
    assert!(serde_json::from_str::<Currency>("\"jpy\"").is_err());

    Ok(())
}

#[test]
fn test_account_number_composition_and_validation() -> Result<()> {
    let prefix = InstitutionPrefix::default();
    let number = AccountNumber::compose(&prefix, 2, 12345678)?;

    assert_eq!(number.as_str(), "099212345678");
    assert_eq!(number.type_code(), 2);

    assert!(AccountNumber::from_str("09921234567").is_err());
    assert!(AccountNumber::from_str("0992123456789").is_err());
    assert!(AccountNumber::from_str("09921234567x").is_err());
    assert!(AccountNumber::compose(&prefix, 1, 123456789).is_err());
    assert!(InstitutionPrefix::from_str("99").is_err());

    Ok(())
}
