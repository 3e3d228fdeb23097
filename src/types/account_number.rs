use crate::types::errors::TypeError;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const PREFIX_LENGTH: usize = 3;
const ACCOUNT_NUMBER_LENGTH: usize = 12;

/// Three digit institution identifier that leads every account number.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct InstitutionPrefix(String);

impl InstitutionPrefix {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for InstitutionPrefix {
    fn default() -> Self {
        InstitutionPrefix("099".to_string())
    }
}

impl FromStr for InstitutionPrefix {
    type Err = TypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();

        if value.len() != PREFIX_LENGTH || !value.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(TypeError::InvalidInstitutionPrefix(value.to_string()));
        }

        Ok(InstitutionPrefix(value.to_string()))
    }
}

/// Immutable 12 digit account identifier: `<prefix:3><type code:1><suffix:8>`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct AccountNumber(String);

impl AccountNumber {
    pub fn compose(prefix: &InstitutionPrefix, type_code: u8, suffix: u32) -> Result<Self, TypeError> {
        format!("{}{}{:08}", prefix.as_str(), type_code, suffix).parse()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn type_code(&self) -> u8 {
        self.0.as_bytes()[PREFIX_LENGTH] - b'0'
    }
}

impl Display for AccountNumber {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl FromStr for AccountNumber {
    type Err = TypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();

        if value.len() != ACCOUNT_NUMBER_LENGTH || !value.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(TypeError::InvalidAccountNumber(value.to_string()));
        }

        Ok(AccountNumber(value.to_string()))
    }
}

impl<'de> Deserialize<'de> for AccountNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        AccountNumber::from_str(&value).map_err(de::Error::custom)
    }
}
