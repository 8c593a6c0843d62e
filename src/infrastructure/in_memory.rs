use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::domain::balance::{AccountId, CardId, RevenueAccountId, UserId};
use crate::domain::entities::{Account, Card, RevenueAccount};
use crate::domain::ports::{Storage, StorageRead, StorageTx};
use crate::domain::request::{BalanceSnapshot, Request, RequestId, RequestStatus};
use crate::domain::transaction::{LedgerTransaction, TransactionId, TransactionStatus};
use crate::error::{LedgerError, Result};

#[derive(Default, Clone)]
struct State {
    accounts: HashMap<AccountId, Account>,
    cards: HashMap<CardId, Card>,
    revenue_accounts: HashMap<RevenueAccountId, RevenueAccount>,
    requests: HashMap<RequestId, Request>,
    transactions: HashMap<TransactionId, LedgerTransaction>,
    snapshots: Vec<BalanceSnapshot>,
}

impl State {
    /// Folds a transaction overlay into this state. Overlay entries win.
    fn apply(&mut self, overlay: State) {
        self.accounts.extend(overlay.accounts);
        self.cards.extend(overlay.cards);
        self.revenue_accounts.extend(overlay.revenue_accounts);
        self.requests.extend(overlay.requests);
        self.transactions.extend(overlay.transactions);
        self.snapshots.extend(overlay.snapshots);
    }

    fn merged_with(&self, overlay: &State) -> State {
        let mut merged = self.clone();
        merged.apply(overlay.clone());
        merged
    }

    fn accounts_for_user(&self, user: UserId) -> Vec<Account> {
        let mut accounts: Vec<_> = self
            .accounts
            .values()
            .filter(|a| a.user_id == user)
            .cloned()
            .collect();
        accounts.sort_by_key(|a| a.id);
        accounts
    }

    fn cards_for_user(&self, user: UserId) -> Vec<Card> {
        let mut cards: Vec<_> = self
            .cards
            .values()
            .filter(|c| c.user_id == user)
            .cloned()
            .collect();
        cards.sort_by_key(|c| c.id);
        cards
    }

    fn request_owner_matches(&self, tx: &LedgerTransaction, user: UserId) -> bool {
        self.requests
            .get(&tx.request_id)
            .is_some_and(|r| r.user_id == user)
    }

    fn pending_transactions_for_user(&self, user: UserId) -> Vec<LedgerTransaction> {
        let mut txs: Vec<_> = self
            .transactions
            .values()
            .filter(|t| {
                self.requests
                    .get(&t.request_id)
                    .is_some_and(|r| r.user_id == user && r.status == RequestStatus::Pending)
            })
            .cloned()
            .collect();
        txs.sort_by_key(|t| t.id);
        txs
    }

    fn debits_for_user_between(
        &self,
        user: UserId,
        from: DateTime<Utc>,
        till: DateTime<Utc>,
    ) -> Vec<LedgerTransaction> {
        let mut txs: Vec<_> = self
            .transactions
            .values()
            .filter(|t| {
                t.is_debit()
                    && t.status == TransactionStatus::Executed
                    && t.created_at >= from
                    && t.created_at < till
                    && self.request_owner_matches(t, user)
            })
            .cloned()
            .collect();
        txs.sort_by_key(|t| t.id);
        txs
    }

    fn transactions_for_request(&self, request: RequestId) -> Vec<LedgerTransaction> {
        let mut txs: Vec<_> = self
            .transactions
            .values()
            .filter(|t| t.request_id == request)
            .cloned()
            .collect();
        txs.sort_by_key(|t| t.id);
        txs
    }
}

/// Thread-safe in-memory store, `Arc<RwLock<_>>` maps keyed by id.
///
/// Transactions stage their writes in an overlay state that is folded into
/// the base on commit and dropped on rollback.
#[derive(Default, Clone)]
pub struct InMemoryStorage {
    state: Arc<RwLock<State>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_account(&self, account: Account) {
        self.state.write().await.accounts.insert(account.id, account);
    }

    pub async fn seed_card(&self, card: Card) {
        self.state.write().await.cards.insert(card.id, card);
    }

    pub async fn seed_revenue_account(&self, revenue: RevenueAccount) {
        self.state
            .write()
            .await
            .revenue_accounts
            .insert(revenue.id, revenue);
    }

    pub async fn seed_request(&self, request: Request) {
        self.state.write().await.requests.insert(request.id, request);
    }

    pub async fn seed_transaction(&self, tx: LedgerTransaction) {
        self.state.write().await.transactions.insert(tx.id, tx);
    }

    /// All committed snapshots, for inspection.
    pub async fn snapshots(&self) -> Vec<BalanceSnapshot> {
        self.state.read().await.snapshots.clone()
    }

    /// Number of committed ledger transactions, for inspection.
    pub async fn transaction_count(&self) -> usize {
        self.state.read().await.transactions.len()
    }
}

#[async_trait]
impl StorageRead for InMemoryStorage {
    async fn account(&self, id: AccountId) -> Result<Option<Account>> {
        Ok(self.state.read().await.accounts.get(&id).cloned())
    }

    async fn card(&self, id: CardId) -> Result<Option<Card>> {
        Ok(self.state.read().await.cards.get(&id).cloned())
    }

    async fn revenue_account(&self, id: RevenueAccountId) -> Result<Option<RevenueAccount>> {
        Ok(self.state.read().await.revenue_accounts.get(&id).cloned())
    }

    async fn request(&self, id: RequestId) -> Result<Option<Request>> {
        Ok(self.state.read().await.requests.get(&id).cloned())
    }

    async fn accounts_for_user(&self, user: UserId) -> Result<Vec<Account>> {
        Ok(self.state.read().await.accounts_for_user(user))
    }

    async fn cards_for_user(&self, user: UserId) -> Result<Vec<Card>> {
        Ok(self.state.read().await.cards_for_user(user))
    }

    async fn pending_transactions_for_user(&self, user: UserId) -> Result<Vec<LedgerTransaction>> {
        Ok(self.state.read().await.pending_transactions_for_user(user))
    }

    async fn debits_for_user_between(
        &self,
        user: UserId,
        from: DateTime<Utc>,
        till: DateTime<Utc>,
    ) -> Result<Vec<LedgerTransaction>> {
        Ok(self
            .state
            .read()
            .await
            .debits_for_user_between(user, from, till))
    }

    async fn transactions_for_request(
        &self,
        request: RequestId,
    ) -> Result<Vec<LedgerTransaction>> {
        Ok(self.state.read().await.transactions_for_request(request))
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn begin(&self) -> Result<Arc<dyn StorageTx>> {
        Ok(Arc::new(InMemoryTx {
            base: self.state.clone(),
            staged: Mutex::new(Some(State::default())),
        }))
    }
}

/// One open transaction over [`InMemoryStorage`]. Reads see the overlay
/// first (read-your-writes); any call after commit/rollback fails
/// `TransactionClosed`.
pub struct InMemoryTx {
    base: Arc<RwLock<State>>,
    staged: Mutex<Option<State>>,
}

impl InMemoryTx {
    async fn snapshot_view(&self) -> Result<State> {
        let staged = self.staged.lock().await;
        let overlay = staged.as_ref().ok_or(LedgerError::TransactionClosed)?;
        Ok(self.base.read().await.merged_with(overlay))
    }

    async fn stage<F>(&self, write: F) -> Result<()>
    where
        F: FnOnce(&mut State),
    {
        let mut staged = self.staged.lock().await;
        let overlay = staged.as_mut().ok_or(LedgerError::TransactionClosed)?;
        write(overlay);
        Ok(())
    }
}

#[async_trait]
impl StorageRead for InMemoryTx {
    async fn account(&self, id: AccountId) -> Result<Option<Account>> {
        Ok(self.snapshot_view().await?.accounts.get(&id).cloned())
    }

    async fn card(&self, id: CardId) -> Result<Option<Card>> {
        Ok(self.snapshot_view().await?.cards.get(&id).cloned())
    }

    async fn revenue_account(&self, id: RevenueAccountId) -> Result<Option<RevenueAccount>> {
        Ok(self
            .snapshot_view()
            .await?
            .revenue_accounts
            .get(&id)
            .cloned())
    }

    async fn request(&self, id: RequestId) -> Result<Option<Request>> {
        Ok(self.snapshot_view().await?.requests.get(&id).cloned())
    }

    async fn accounts_for_user(&self, user: UserId) -> Result<Vec<Account>> {
        Ok(self.snapshot_view().await?.accounts_for_user(user))
    }

    async fn cards_for_user(&self, user: UserId) -> Result<Vec<Card>> {
        Ok(self.snapshot_view().await?.cards_for_user(user))
    }

    async fn pending_transactions_for_user(&self, user: UserId) -> Result<Vec<LedgerTransaction>> {
        Ok(self
            .snapshot_view()
            .await?
            .pending_transactions_for_user(user))
    }

    async fn debits_for_user_between(
        &self,
        user: UserId,
        from: DateTime<Utc>,
        till: DateTime<Utc>,
    ) -> Result<Vec<LedgerTransaction>> {
        Ok(self
            .snapshot_view()
            .await?
            .debits_for_user_between(user, from, till))
    }

    async fn transactions_for_request(
        &self,
        request: RequestId,
    ) -> Result<Vec<LedgerTransaction>> {
        Ok(self.snapshot_view().await?.transactions_for_request(request))
    }
}

#[async_trait]
impl StorageTx for InMemoryTx {
    async fn put_account(&self, account: Account) -> Result<()> {
        self.stage(|s| {
            s.accounts.insert(account.id, account);
        })
        .await
    }

    async fn put_card(&self, card: Card) -> Result<()> {
        self.stage(|s| {
            s.cards.insert(card.id, card);
        })
        .await
    }

    async fn put_revenue_account(&self, revenue: RevenueAccount) -> Result<()> {
        self.stage(|s| {
            s.revenue_accounts.insert(revenue.id, revenue);
        })
        .await
    }

    async fn insert_transaction(&self, tx: LedgerTransaction) -> Result<()> {
        if self.snapshot_view().await?.transactions.contains_key(&tx.id) {
            return Err(LedgerError::Storage(format!(
                "duplicate transaction id {}",
                tx.id
            )));
        }
        self.stage(|s| {
            s.transactions.insert(tx.id, tx);
        })
        .await
    }

    async fn update_request(&self, request: Request) -> Result<()> {
        self.stage(|s| {
            s.requests.insert(request.id, request);
        })
        .await
    }

    async fn insert_snapshot(&self, snapshot: BalanceSnapshot) -> Result<()> {
        self.stage(|s| {
            s.snapshots.push(snapshot);
        })
        .await
    }

    async fn snapshots_for_request(&self, request: RequestId) -> Result<Vec<BalanceSnapshot>> {
        Ok(self
            .snapshot_view()
            .await?
            .snapshots
            .into_iter()
            .filter(|s| s.request_id == request)
            .collect())
    }

    async fn commit(&self) -> Result<()> {
        let overlay = self
            .staged
            .lock()
            .await
            .take()
            .ok_or(LedgerError::TransactionClosed)?;
        self.base.write().await.apply(overlay);
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        self.staged
            .lock()
            .await
            .take()
            .ok_or(LedgerError::TransactionClosed)?;
        Ok(())
    }
}
