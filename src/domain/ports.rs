use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::domain::balance::{AccountId, CardId, RevenueAccountId, UserId};
use crate::domain::entities::{Account, Card, RevenueAccount};
use crate::domain::request::{BalanceSnapshot, Difference, Request, RequestId, TransferDetails};
use crate::domain::transaction::LedgerTransaction;
use crate::error::Result;

/// Read surface of the backing store.
///
/// Implemented both by the store itself and by its transactions, so that
/// resolvers and aggregators can be rebound to a transaction and observe its
/// uncommitted writes.
#[async_trait]
pub trait StorageRead: Send + Sync {
    async fn account(&self, id: AccountId) -> Result<Option<Account>>;
    async fn card(&self, id: CardId) -> Result<Option<Card>>;
    async fn revenue_account(&self, id: RevenueAccountId) -> Result<Option<RevenueAccount>>;
    async fn request(&self, id: RequestId) -> Result<Option<Request>>;

    async fn accounts_for_user(&self, user: UserId) -> Result<Vec<Account>>;
    async fn cards_for_user(&self, user: UserId) -> Result<Vec<Card>>;

    /// Transactions belonging to the user's pending requests.
    async fn pending_transactions_for_user(&self, user: UserId) -> Result<Vec<LedgerTransaction>>;

    /// Executed debit transactions of the user with `from <= created_at < till`.
    async fn debits_for_user_between(
        &self,
        user: UserId,
        from: DateTime<Utc>,
        till: DateTime<Utc>,
    ) -> Result<Vec<LedgerTransaction>>;

    async fn transactions_for_request(&self, request: RequestId)
    -> Result<Vec<LedgerTransaction>>;
}

/// Store entry point. `begin` opens a transaction; everything the lifecycle
/// coordinator does happens inside one.
#[async_trait]
pub trait Storage: StorageRead {
    async fn begin(&self) -> Result<Arc<dyn StorageTx>>;
}

/// One storage transaction. Writes are only visible through this handle until
/// `commit`; `rollback` discards them. Only the lifecycle coordinator may
/// commit or roll back. Any call after close fails `TransactionClosed`.
#[async_trait]
pub trait StorageTx: StorageRead {
    async fn put_account(&self, account: Account) -> Result<()>;
    async fn put_card(&self, card: Card) -> Result<()>;
    async fn put_revenue_account(&self, revenue: RevenueAccount) -> Result<()>;
    async fn insert_transaction(&self, tx: LedgerTransaction) -> Result<()>;
    async fn update_request(&self, request: Request) -> Result<()>;
    async fn insert_snapshot(&self, snapshot: BalanceSnapshot) -> Result<()>;
    async fn snapshots_for_request(&self, request: RequestId) -> Result<Vec<BalanceSnapshot>>;

    async fn commit(&self) -> Result<()>;
    async fn rollback(&self) -> Result<()>;
}

/// External exchange-rate feed. The reducer wraps this in a per-call cache;
/// implementations need not cache anything themselves.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn find_rate(&self, from: &str, to: &str) -> Result<Decimal>;
}

/// Subject-specific ledger logic, supplied by the surrounding service. Runs
/// inside the coordinator's transaction and reports the balances it touched.
#[async_trait]
pub trait TransferStrategy: Send + Sync {
    async fn execute(&self, tx: &dyn StorageTx, request: &Request) -> Result<TransferDetails>;
    async fn cancel(&self, tx: &dyn StorageTx, request: &Request, reason: &str) -> Result<()>;
}

/// External messaging RPC for post-commit balance-changed notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn balance_changed(
        &self,
        user: UserId,
        request: RequestId,
        differences: &[Difference],
    ) -> Result<()>;
}

/// External audit-log RPC.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: serde_json::Value) -> Result<()>;
}
