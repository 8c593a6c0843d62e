use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::balance::BalanceRef;
use crate::domain::ports::StorageRead;
use crate::domain::transaction::LedgerTransaction;
use crate::error::{LedgerError, Result};

/// Anything a balance can be resolved from: either a value that already is a
/// balance, or a ledger transaction pointing at one.
#[derive(Clone)]
pub enum BalanceSource {
    Balance(BalanceRef),
    Transaction(LedgerTransaction),
}

/// Maps a [`BalanceSource`] to its balance.
///
/// `NotResolved` is the non-fatal miss other resolvers may recover from;
/// any other error short-circuits a composite chain. `with_reader` returns an
/// independent instance bound to the given reader (typically a storage
/// transaction), leaving the original untouched and shareable.
#[async_trait]
pub trait ResolveBalance: Send + Sync {
    async fn resolve(&self, source: &BalanceSource) -> Result<BalanceRef>;
    fn with_reader(&self, reader: Arc<dyn StorageRead>) -> Box<dyn ResolveBalance>;
}

/// Resolves ledger transactions to the entity they move money on.
///
/// Policy: `account_id` wins, then `card_id`, then `revenue_account_id`;
/// a transaction with none of them set is `NotResolved`. An id pointing at a
/// missing row is a storage inconsistency, not a miss.
pub struct EntityResolver {
    reader: Arc<dyn StorageRead>,
}

impl EntityResolver {
    pub fn new(reader: Arc<dyn StorageRead>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl ResolveBalance for EntityResolver {
    async fn resolve(&self, source: &BalanceSource) -> Result<BalanceRef> {
        let tx = match source {
            // Already a balance: idempotent fixed point.
            BalanceSource::Balance(balance) => return Ok(balance.clone()),
            BalanceSource::Transaction(tx) => tx,
        };

        if let Some(id) = tx.account_id {
            let account = self.reader.account(id).await?.ok_or_else(|| {
                LedgerError::Storage(format!("transaction {} references missing account {id}", tx.id))
            })?;
            return Ok(Arc::new(account));
        }
        if let Some(id) = tx.card_id {
            let card = self.reader.card(id).await?.ok_or_else(|| {
                LedgerError::Storage(format!("transaction {} references missing card {id}", tx.id))
            })?;
            return Ok(Arc::new(card));
        }
        if let Some(id) = tx.revenue_account_id {
            let revenue = self.reader.revenue_account(id).await?.ok_or_else(|| {
                LedgerError::Storage(format!(
                    "transaction {} references missing revenue account {id}",
                    tx.id
                ))
            })?;
            return Ok(Arc::new(revenue));
        }

        Err(LedgerError::NotResolved)
    }

    fn with_reader(&self, reader: Arc<dyn StorageRead>) -> Box<dyn ResolveBalance> {
        Box::new(Self { reader })
    }
}

/// Ordered name→resolver registry, built once at startup.
///
/// Members are tried in registration order and the first non-`NotResolved`
/// outcome wins. Registering the same name twice fails `AlreadyRegistered`
/// and leaves the first registration intact.
#[derive(Default)]
pub struct CompositeResolver {
    members: Vec<(String, Box<dyn ResolveBalance>)>,
}

impl CompositeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        resolver: Box<dyn ResolveBalance>,
    ) -> Result<()> {
        let name = name.into();
        if self.members.iter().any(|(n, _)| *n == name) {
            return Err(LedgerError::AlreadyRegistered(name));
        }
        self.members.push((name, resolver));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[async_trait]
impl ResolveBalance for CompositeResolver {
    async fn resolve(&self, source: &BalanceSource) -> Result<BalanceRef> {
        for (_, member) in &self.members {
            match member.resolve(source).await {
                Err(LedgerError::NotResolved) => continue,
                other => return other,
            }
        }
        Err(LedgerError::NotResolved)
    }

    fn with_reader(&self, reader: Arc<dyn StorageRead>) -> Box<dyn ResolveBalance> {
        let members = self
            .members
            .iter()
            .map(|(name, member)| (name.clone(), member.with_reader(reader.clone())))
            .collect();
        Box::new(Self { members })
    }
}
