use crate::engine::{Conversion, ConversionPreview, HistoryEntry, PreviewRequest, TransferPhase, TransferReceipt, TransferRequest};
use crate::models::{Account, Transaction, TransferError};
use crate::rates::ExchangeRateResolver;
use crate::storage::LedgerStore;
use crate::types::{AccountNumber, Currency, Money, OwnerId, TransactionId};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Credit side of a validated transfer.
struct Quote {
    credit: Money,
    exchange_rate: Option<Decimal>
}

/// Executes transfers between accounts, converting across currencies.
///
/// Validation and rate resolution happen before any account lock is taken;
/// the store re-checks funds when it commits both balances together.
pub struct TransferEngine<S: LedgerStore> {
    store: Arc<S>,
    rates: Arc<ExchangeRateResolver>,
    spread: Decimal
}

impl<S: LedgerStore> TransferEngine<S> {
    pub fn new(store: Arc<S>, rates: Arc<ExchangeRateResolver>, spread: Decimal) -> Self {
        Self {
            store,
            rates,
            spread
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn spread(&self) -> Decimal {
        self.spread
    }

    /// Moves `request.amount` out of the owner's active account into the
    /// receiver's account.
    ///
    /// # Errors
    /// Checks run in this order and the first failure wins:
    /// `NoActiveAccount`, `AccountNotFound`, `SameAccount`, `InvalidAmount`,
    /// `CurrencyMismatch`, `InsufficientFunds`, `RateUnavailable`.
    /// A transfer that loses a race for funds at commit time fails with
    /// `InsufficientFunds` and leaves a `FAILED` record behind.
    pub async fn transfer(&self, owner_id: OwnerId, request: TransferRequest) -> Result<TransferReceipt, TransferError> {
        debug!(phase = %TransferPhase::Validating, owner_id, receiver = %request.receiver_account_number, amount = %request.amount);

        let (sender, receiver) = self.validate(owner_id, &request).await
            .inspect_err(|error| debug!(phase = %TransferPhase::Failed, owner_id, code = error.code(), "Transfer rejected: {error}"))?;

        let quote = self.quote(&sender, &receiver, request.amount).await?;

        self.apply(sender, receiver, request, quote).await
    }

    async fn validate(&self, owner_id: OwnerId, request: &TransferRequest) -> Result<(Account, Account), TransferError> {
        let sender = self.store.active_account_for(owner_id).await?;

        //NOTE: A malformed or inactive receiver is indistinguishable from a missing one to the caller
        let receiver_number = AccountNumber::from_str(&request.receiver_account_number)
            .map_err(|_| TransferError::account_not_found(&request.receiver_account_number))?;

        let (sender, receiver) = self.store.fetch_for_transfer(sender.account_id, &receiver_number).await
            .map_err(|error| match error {
                TransferError::AccountInactive { account_number, .. } if account_number == receiver_number => {
                    TransferError::account_not_found(account_number)
                }
                other => other
            })?;

        if sender.account_id == receiver.account_id {
            return Err(TransferError::same_account(&sender))
        }

        if !request.amount.is_positive() {
            return Err(TransferError::InvalidAmount { amount: request.amount.to_string() })
        }

        if request.to_currency != receiver.currency {
            return Err(TransferError::CurrencyMismatch {
                requested: request.to_currency,
                expected: receiver.currency
            })
        }

        if sender.balance() < request.amount {
            return Err(TransferError::insufficient_funds(&sender, request.amount))
        }

        Ok((sender, receiver))
    }

    async fn quote(&self, sender: &Account, receiver: &Account, amount: Money) -> Result<Quote, TransferError> {
        if sender.currency == receiver.currency {
            return Ok(Quote { credit: amount, exchange_rate: None })
        }

        debug!(phase = %TransferPhase::Converting, from = %sender.currency, to = %receiver.currency, %amount);

        let conversion = self.convert(sender.currency, receiver.currency, amount).await?
            .ok_or_else(|| TransferError::overflow(receiver))?;

        Ok(Quote {
            credit: conversion.credit,
            exchange_rate: Some(conversion.rate)
        })
    }

    /// `Ok(None)` signals decimal overflow during the conversion.
    async fn convert(&self, from: Currency, to: Currency, amount: Money) -> Result<Option<Conversion>, TransferError> {
        let rate = self.rates.resolve(from, to).await.map_err(|error| {
            warn!(%from, %to, "Exchange rate unavailable: {error}");
            TransferError::RateUnavailable { from, to }
        })?;

        Ok(Conversion::compute(amount, rate, self.spread))
    }

    async fn apply(&self, sender: Account, receiver: Account, request: TransferRequest, quote: Quote) -> Result<TransferReceipt, TransferError> {
        let mut transaction = Transaction::pending(
            &sender,
            &receiver,
            request.amount,
            quote.credit,
            quote.exchange_rate,
            request.description
        )?;

        debug!(phase = %TransferPhase::Applying, transaction_id = %transaction.transaction_id, debit = %request.amount, credit = %quote.credit);

        self.store.save_transaction(transaction.clone()).await?;

        match self.store.apply_transfer(sender.account_id, receiver.account_id, request.amount, quote.credit).await {
            Ok(committed_at) => {
                transaction.complete(committed_at)?;
                self.store.save_transaction(transaction.clone()).await?;

                info!(
                    phase = %TransferPhase::Completed,
                    transaction_id = %transaction.transaction_id,
                    sender = %sender.account_number,
                    receiver = %receiver.account_number,
                    amount = %transaction.amount,
                    credited = %transaction.credited_amount,
                    "Transfer completed"
                );

                Ok(TransferReceipt::from(&transaction))
            }
            Err(cause) => {
                transaction.fail()?;

                if let Err(save_error) = self.store.save_transaction(transaction.clone()).await {
                    error!(transaction_id = %transaction.transaction_id, "Could not record failed transfer: {save_error}");
                }

                warn!(
                    phase = %TransferPhase::Failed,
                    transaction_id = %transaction.transaction_id,
                    code = cause.code(),
                    "Transfer failed at commit: {cause}"
                );

                Err(cause)
            }
        }
    }

    /// Quotes a conversion from the owner's active account currency without
    /// touching any balance.
    pub async fn preview(&self, owner_id: OwnerId, request: PreviewRequest) -> Result<ConversionPreview, TransferError> {
        let account = self.store.active_account_for(owner_id).await?;
        self.preview_from(account.currency, request).await
    }

    /// Quotes a conversion from an explicit source currency.
    pub async fn preview_from(&self, from: Currency, request: PreviewRequest) -> Result<ConversionPreview, TransferError> {
        if !request.amount.is_positive() {
            return Err(TransferError::InvalidAmount { amount: request.amount.to_string() })
        }

        if from == request.to_currency {
            return Err(TransferError::SameCurrency { currency: from })
        }

        let conversion = self.convert(from, request.to_currency, request.amount).await?
            .ok_or_else(|| TransferError::InvalidAmount { amount: request.amount.to_string() })?;

        Ok(ConversionPreview {
            from_currency: from,
            to_currency: request.to_currency,
            amount: request.amount,
            converted_amount: conversion.converted,
            exchange_rate: conversion.rate,
            spread: self.spread,
            spread_amount: conversion.spread_amount,
            total_amount: conversion.credit
        })
    }

    /// Every transaction touching any of the owner's accounts, newest first.
    ///
    /// A transfer between two accounts of the same owner shows up once per side.
    pub async fn history(&self, owner_id: OwnerId) -> Vec<HistoryEntry> {
        let mut entries = Vec::new();

        for account in self.store.accounts_for(owner_id).await {
            for transaction in self.store.transactions_for(account.account_id).await {
                entries.push(HistoryEntry {
                    account_number: account.account_number.clone(),
                    direction: transaction.direction_for(account.account_id),
                    transaction
                });
            }
        }

        entries.sort_by(|left, right| right.transaction.timestamp.cmp(&left.transaction.timestamp));
        entries
    }

    /// A single transaction, visible only if one of the owner's accounts took part.
    pub async fn transaction(&self, owner_id: OwnerId, transaction_id: TransactionId) -> Result<Transaction, TransferError> {
        let not_found = || TransferError::TransactionNotFound { transaction_id };
        let transaction = self.store.transaction(transaction_id).await.ok_or_else(not_found)?;

        let visible = self.store.accounts_for(owner_id).await
            .iter()
            .any(|account| transaction.involves(account.account_id));

        if visible {
            Ok(transaction)
        } else {
            Err(not_found())
        }
    }
}
