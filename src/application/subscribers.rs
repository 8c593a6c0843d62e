use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;

use crate::application::bus::Handler;
use crate::application::canceller::CancellationEvent;
use crate::application::executor::{BalanceChangedEvent, ExecutionEvent};
use crate::application::resolver::{BalanceSource, ResolveBalance};
use crate::domain::balance::{AccountId, BalanceKind, CardId};
use crate::domain::ports::{AuditSink, Notifier, StorageRead};
use crate::domain::request::BalanceSnapshot;
use crate::error::{LedgerError, Result};

/// Recomputes the derived available amount of every balance a request
/// touched, inside the execution transaction. A card pushed past its credit
/// limit fails the recomputation, which vetoes the whole unit of work; this
/// subscriber knows nothing about how the executor reacts to that.
pub struct LedgerDeltaSubscriber;

#[async_trait]
impl Handler<ExecutionEvent> for LedgerDeltaSubscriber {
    fn name(&self) -> &str {
        "ledger-delta"
    }

    async fn handle(&self, event: &ExecutionEvent) -> Result<()> {
        for difference in &event.details.differences {
            let Some(id) = difference.balance_id else {
                continue;
            };
            match difference.kind {
                BalanceKind::Account => {
                    let mut account =
                        event.tx.account(AccountId(id.0)).await?.ok_or_else(|| {
                            LedgerError::Storage(format!("difference references missing account {id}"))
                        })?;
                    account.available_amount = account.current_amount;
                    event.tx.put_account(account).await?;
                }
                BalanceKind::Card => {
                    let mut card = event.tx.card(CardId(id.0)).await?.ok_or_else(|| {
                        LedgerError::Storage(format!("difference references missing card {id}"))
                    })?;
                    let available = card.current_amount + card.credit_limit;
                    if available < Decimal::ZERO {
                        return Err(LedgerError::Validation(format!(
                            "card {} exceeds its credit limit by {}",
                            card.id, -available,
                        )));
                    }
                    card.available_amount = available;
                    event.tx.put_card(card).await?;
                }
                // Revenue accounts carry no derived fields.
                BalanceKind::RevenueAccount => {}
            }
        }
        Ok(())
    }
}

/// Persists a point-in-time snapshot of every distinct balance a request
/// touched, deduplicated by `(kind, id)` within one emission. Balances are
/// resolved from the request's ledger transactions through a resolver clone
/// bound to the execution transaction, so uncommitted writes are visible.
pub struct BalanceSnapshotSubscriber {
    resolver: Arc<dyn ResolveBalance>,
}

impl BalanceSnapshotSubscriber {
    pub fn new(resolver: Arc<dyn ResolveBalance>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Handler<ExecutionEvent> for BalanceSnapshotSubscriber {
    fn name(&self) -> &str {
        "balance-snapshot"
    }

    async fn handle(&self, event: &ExecutionEvent) -> Result<()> {
        let reader: Arc<dyn StorageRead> = event.tx.clone();
        let resolver = self.resolver.with_reader(reader);

        let mut seen = HashSet::new();
        for tx in event.tx.transactions_for_request(event.request.id).await? {
            let balance = resolver.resolve(&BalanceSource::Transaction(tx)).await?;
            if !seen.insert((balance.kind(), balance.id())) {
                continue;
            }
            event
                .tx
                .insert_snapshot(BalanceSnapshot {
                    request_id: event.request.id,
                    kind: balance.kind(),
                    balance_id: balance.id(),
                    currency: balance.currency_code().to_string(),
                    current_amount: balance.current_balance(),
                    available_amount: balance.available_balance(),
                    taken_at: Utc::now(),
                })
                .await?;
        }
        Ok(())
    }
}

/// Writes an audit record for executed and cancelled requests through the
/// external audit RPC. Sink failures veto the unit of work.
pub struct AuditLogSubscriber {
    sink: Arc<dyn AuditSink>,
}

impl AuditLogSubscriber {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl Handler<ExecutionEvent> for AuditLogSubscriber {
    fn name(&self) -> &str {
        "audit-log"
    }

    async fn handle(&self, event: &ExecutionEvent) -> Result<()> {
        self.sink
            .record(serde_json::json!({
                "event": "request_executed",
                "request_id": event.request.id,
                "user_id": event.request.user_id,
                "subject": event.request.subject,
                "differences": event.details.differences,
            }))
            .await
    }
}

#[async_trait]
impl Handler<CancellationEvent> for AuditLogSubscriber {
    fn name(&self) -> &str {
        "audit-log"
    }

    async fn handle(&self, event: &CancellationEvent) -> Result<()> {
        self.sink
            .record(serde_json::json!({
                "event": "request_cancelled",
                "request_id": event.request_id,
                "user_id": event.user_id,
                "reason": event.reason,
            }))
            .await
    }
}

/// Forwards post-commit balance changes to the external messaging RPC. Runs
/// after the transaction is committed; the executor only logs its failures.
pub struct NotificationSubscriber {
    notifier: Arc<dyn Notifier>,
}

impl NotificationSubscriber {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl Handler<BalanceChangedEvent> for NotificationSubscriber {
    fn name(&self) -> &str {
        "balance-notification"
    }

    async fn handle(&self, event: &BalanceChangedEvent) -> Result<()> {
        self.notifier
            .balance_changed(event.user_id, event.request_id, &event.differences)
            .await
    }
}
