#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::Mutex;

use ledgercore::application::bus::Handler;
use ledgercore::application::executor::{BalanceChangedEvent, ExecutionEvent};
use ledgercore::domain::balance::{AccountId, BalanceId, BalanceKind, CardId, RevenueAccountId, UserId};
use ledgercore::domain::ports::{AuditSink, Notifier, StorageTx, TransferStrategy};
use ledgercore::domain::request::{Difference, Request, RequestId, TransferDetails};
use ledgercore::domain::transaction::{
    LedgerTransaction, TransactionId, TransactionPurpose, TransactionStatus,
};
use ledgercore::error::{LedgerError, Result};

/// Installs the log subscriber for test output; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Credits a fixed account with the request amount, optionally also crediting
/// a fee into a revenue account. Ledger writes go through the coordinator's
/// transaction; derived-amount validation is left to the subscribers.
pub struct TopUpStrategy {
    pub account: AccountId,
    pub fee: Option<(RevenueAccountId, Decimal)>,
    next_tx: AtomicU64,
}

impl TopUpStrategy {
    pub fn new(account: AccountId) -> Self {
        Self {
            account,
            fee: None,
            next_tx: AtomicU64::new(1000),
        }
    }

    pub fn with_fee(mut self, revenue: RevenueAccountId, fee: Decimal) -> Self {
        self.fee = Some((revenue, fee));
        self
    }

    fn next_id(&self) -> TransactionId {
        TransactionId(self.next_tx.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl TransferStrategy for TopUpStrategy {
    async fn execute(&self, tx: &dyn StorageTx, request: &Request) -> Result<TransferDetails> {
        let mut account = tx
            .account(self.account)
            .await?
            .ok_or_else(|| LedgerError::Storage(format!("missing account {}", self.account)))?;
        account.current_amount += request.amount;
        let currency = account.currency.clone();
        tx.put_account(account).await?;

        let mut credit = LedgerTransaction::for_account(
            self.next_id(),
            request.id,
            self.account,
            TransactionPurpose::Transfer,
            request.amount,
            currency.clone(),
        );
        credit.status = TransactionStatus::Executed;
        tx.insert_transaction(credit.clone()).await?;

        let mut details = TransferDetails {
            differences: vec![Difference {
                kind: BalanceKind::Account,
                balance_id: Some(BalanceId(self.account.0)),
                currency,
                amount: request.amount,
            }],
            transactions: vec![credit.id],
        };

        if let Some((revenue_id, fee)) = &self.fee {
            let mut revenue = tx.revenue_account(*revenue_id).await?.ok_or_else(|| {
                LedgerError::Storage(format!("missing revenue account {revenue_id}"))
            })?;
            revenue.current_amount += *fee;
            let fee_currency = revenue.currency.clone();
            tx.put_revenue_account(revenue).await?;

            let mut fee_tx = LedgerTransaction::for_revenue_account(
                self.next_id(),
                request.id,
                *revenue_id,
                TransactionPurpose::Fee,
                *fee,
                fee_currency.clone(),
            );
            fee_tx.status = TransactionStatus::Executed;
            tx.insert_transaction(fee_tx.clone()).await?;

            details.differences.push(Difference {
                kind: BalanceKind::RevenueAccount,
                balance_id: Some(BalanceId(revenue_id.0)),
                currency: fee_currency,
                amount: *fee,
            });
            details.transactions.push(fee_tx.id);
        }

        Ok(details)
    }

    async fn cancel(&self, _tx: &dyn StorageTx, _request: &Request, _reason: &str) -> Result<()> {
        Ok(())
    }
}

/// Debits a fixed card with the request amount, without checking any limit;
/// the ledger-delta subscriber is the one that catches an exceeded credit
/// limit.
pub struct CardPaymentStrategy {
    pub card: CardId,
    next_tx: AtomicU64,
}

impl CardPaymentStrategy {
    pub fn new(card: CardId) -> Self {
        Self {
            card,
            next_tx: AtomicU64::new(2000),
        }
    }
}

#[async_trait]
impl TransferStrategy for CardPaymentStrategy {
    async fn execute(&self, tx: &dyn StorageTx, request: &Request) -> Result<TransferDetails> {
        let mut card = tx
            .card(self.card)
            .await?
            .ok_or_else(|| LedgerError::Storage(format!("missing card {}", self.card)))?;
        card.current_amount -= request.amount;
        let currency = card.currency.clone();
        tx.put_card(card).await?;

        let mut debit = LedgerTransaction::for_card(
            TransactionId(self.next_tx.fetch_add(1, Ordering::SeqCst)),
            request.id,
            self.card,
            TransactionPurpose::Transfer,
            -request.amount,
            currency.clone(),
        );
        debit.status = TransactionStatus::Executed;
        tx.insert_transaction(debit.clone()).await?;

        Ok(TransferDetails {
            differences: vec![Difference {
                kind: BalanceKind::Card,
                balance_id: Some(BalanceId(self.card.0)),
                currency,
                amount: -request.amount,
            }],
            transactions: vec![debit.id],
        })
    }

    async fn cancel(&self, _tx: &dyn StorageTx, _request: &Request, _reason: &str) -> Result<()> {
        Ok(())
    }
}

/// Always rejects, both on execute and cancel.
pub struct RejectingStrategy {
    pub message: &'static str,
}

#[async_trait]
impl TransferStrategy for RejectingStrategy {
    async fn execute(&self, _tx: &dyn StorageTx, _request: &Request) -> Result<TransferDetails> {
        Err(LedgerError::Validation(self.message.to_string()))
    }

    async fn cancel(&self, _tx: &dyn StorageTx, _request: &Request, _reason: &str) -> Result<()> {
        Err(LedgerError::Validation(self.message.to_string()))
    }
}

/// Execution subscriber that always vetoes.
pub struct VetoSubscriber;

#[async_trait]
impl Handler<ExecutionEvent> for VetoSubscriber {
    fn name(&self) -> &str {
        "always-veto"
    }

    async fn handle(&self, _event: &ExecutionEvent) -> Result<()> {
        Err(LedgerError::Validation("vetoed by subscriber".to_string()))
    }
}

/// Execution subscriber that counts deliveries and remembers the differences
/// it observed.
#[derive(Default)]
pub struct CountingSubscriber {
    pub deliveries: AtomicUsize,
    pub observed: Mutex<Vec<Vec<Difference>>>,
}

#[async_trait]
impl Handler<ExecutionEvent> for CountingSubscriber {
    fn name(&self) -> &str {
        "counting"
    }

    async fn handle(&self, event: &ExecutionEvent) -> Result<()> {
        self.deliveries.fetch_add(1, Ordering::SeqCst);
        self.observed
            .lock()
            .await
            .push(event.details.differences.clone());
        Ok(())
    }
}

/// Notifier that records every call.
#[derive(Default)]
pub struct RecordingNotifier {
    pub calls: Mutex<Vec<(UserId, RequestId, usize)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn balance_changed(
        &self,
        user: UserId,
        request: RequestId,
        differences: &[Difference],
    ) -> Result<()> {
        self.calls
            .lock()
            .await
            .push((user, request, differences.len()));
        Ok(())
    }
}

/// Notifier whose RPC is down.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn balance_changed(
        &self,
        _user: UserId,
        _request: RequestId,
        _differences: &[Difference],
    ) -> Result<()> {
        Err(LedgerError::Notification("messaging RPC unreachable".to_string()))
    }
}

/// Audit sink collecting records in memory.
#[derive(Default)]
pub struct MemoryAuditSink {
    pub records: Mutex<Vec<serde_json::Value>>,
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, entry: serde_json::Value) -> Result<()> {
        self.records.lock().await.push(entry);
        Ok(())
    }
}

/// Balance-changed handler used to assert post-commit delivery counts.
#[derive(Default)]
pub struct CountingNotificationHandler {
    pub deliveries: AtomicUsize,
}

#[async_trait]
impl Handler<BalanceChangedEvent> for CountingNotificationHandler {
    fn name(&self) -> &str {
        "counting-notification"
    }

    async fn handle(&self, _event: &BalanceChangedEvent) -> Result<()> {
        self.deliveries.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
