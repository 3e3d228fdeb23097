use crate::models::{Account, AccountType, NewAccount, ProvisioningError};
use crate::storage::LedgerStore;
use crate::types::{AccountNumber, Currency, InstitutionPrefix, Money, OwnerId};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, error, info};

const SUFFIX_RANGE: std::ops::RangeInclusive<u32> = 10_000_000..=99_999_999;

/// Supplies the 8 digit random part of new account numbers.
pub trait SuffixSource: Send + Sync {
    fn next_suffix(&self) -> u32;
}

pub struct RandomSuffix;

impl SuffixSource for RandomSuffix {
    fn next_suffix(&self) -> u32 {
        rand::thread_rng().gen_range(SUFFIX_RANGE)
    }
}

/// Request to open an account for an already authenticated owner.
#[derive(Debug, Clone)]
pub struct OpenAccount {
    pub owner_id: OwnerId,
    pub account_type: AccountType,
    pub currency: Currency,
    /// Overrides the configured opening balance.
    pub opening_balance: Option<Money>
}

/// Explicit account creation step: assigns a unique number, then persists.
pub struct AccountProvisioner<S: LedgerStore> {
    store: Arc<S>,
    prefix: InstitutionPrefix,
    max_attempts: u32,
    opening_balance: Money,
    suffixes: Box<dyn SuffixSource>
}

impl<S: LedgerStore> AccountProvisioner<S> {
    pub fn new(store: Arc<S>, prefix: InstitutionPrefix, max_attempts: u32, opening_balance: Money) -> Self {
        Self {
            store,
            prefix,
            max_attempts: max_attempts.max(1),
            opening_balance,
            suffixes: Box::new(RandomSuffix)
        }
    }

    pub fn with_suffix_source(mut self, suffixes: impl SuffixSource + 'static) -> Self {
        self.suffixes = Box::new(suffixes);
        self
    }

    fn draw(&self, account_type: AccountType) -> Result<AccountNumber, ProvisioningError> {
        let suffix = self.suffixes.next_suffix();

        AccountNumber::compose(&self.prefix, account_type.type_code(), suffix)
            .map_err(|_| ProvisioningError::InvalidSuffix(suffix))
    }

    /// Draws candidates until one is unused, giving up after `max_attempts`.
    pub async fn generate_account_number(&self, account_type: AccountType) -> Result<AccountNumber, ProvisioningError> {
        for attempt in 1..=self.max_attempts {
            let candidate = self.draw(account_type)?;

            if !self.store.account_number_exists(&candidate).await {
                return Ok(candidate)
            }

            debug!(attempt, account_number = %candidate, "Account number collision, drawing again");
        }

        error!(attempts = self.max_attempts, ?account_type, "Account number space exhausted");

        Err(ProvisioningError::NumberSpaceExhausted { attempts: self.max_attempts })
    }

    /// Opens a new account. A number lost to a concurrent insert between the
    /// uniqueness check and the insert counts as another attempt.
    pub async fn open_account(&self, request: OpenAccount) -> Result<Account, ProvisioningError> {
        let opening_balance = request.opening_balance.unwrap_or(self.opening_balance);

        for attempt in 1..=self.max_attempts {
            let account_number = self.generate_account_number(request.account_type).await?;
            let new_account = NewAccount {
                owner_id: request.owner_id,
                account_number,
                account_type: request.account_type,
                currency: request.currency,
                opening_balance
            };

            match self.store.insert_account(new_account).await {
                Ok(account) => {
                    info!(
                        account_id = account.account_id,
                        owner_id = account.owner_id,
                        account_number = %account.account_number,
                        currency = %account.currency,
                        "Account opened"
                    );
                    return Ok(account)
                }
                Err(ProvisioningError::DuplicateAccountNumber(account_number)) => {
                    debug!(attempt, %account_number, "Account number taken by a concurrent insert, retrying");
                }
                Err(error) => return Err(error)
            }
        }

        Err(ProvisioningError::NumberSpaceExhausted { attempts: self.max_attempts })
    }
}
