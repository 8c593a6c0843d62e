use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::balance::UserId;
use crate::domain::ports::StorageRead;
use crate::error::Result;

/// One per-currency total inside an [`AggregationResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationItem {
    pub amount: Decimal,
    pub currency: String,
}

impl AggregationItem {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

/// Multi-currency dataset produced by an aggregator, grouped by currency.
pub type AggregationResult = Vec<AggregationItem>;

/// A canned analytical query over the ledger.
#[async_trait]
pub trait Aggregator: Send + Sync {
    async fn aggregate(&self) -> Result<AggregationResult>;
}

// Currencies are keyed through a BTreeMap so results come out in a stable
// order regardless of store iteration order.
fn into_items(totals: BTreeMap<String, Decimal>) -> AggregationResult {
    totals
        .into_iter()
        .map(|(currency, amount)| AggregationItem { amount, currency })
        .collect()
}

/// Current balances of all the user's accounts and cards plus the absolute
/// amounts of their pending transactions, per currency. This is the user's
/// general exposure towards the service.
pub struct GeneralTotalAggregator {
    reader: Arc<dyn StorageRead>,
    user: UserId,
}

#[async_trait]
impl Aggregator for GeneralTotalAggregator {
    async fn aggregate(&self) -> Result<AggregationResult> {
        let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();

        for account in self.reader.accounts_for_user(self.user).await? {
            *totals.entry(account.currency.clone()).or_default() += account.current_amount;
        }
        for card in self.reader.cards_for_user(self.user).await? {
            *totals.entry(card.currency.clone()).or_default() += card.current_amount;
        }
        for tx in self.reader.pending_transactions_for_user(self.user).await? {
            *totals.entry(tx.currency.clone()).or_default() += tx.amount.abs();
        }

        Ok(into_items(totals))
    }
}

/// Absolute totals of the user's executed debits with
/// `from <= created_at < till`, per currency.
pub struct DebitedPerPeriodAggregator {
    reader: Arc<dyn StorageRead>,
    user: UserId,
    from: DateTime<Utc>,
    till: DateTime<Utc>,
}

#[async_trait]
impl Aggregator for DebitedPerPeriodAggregator {
    async fn aggregate(&self) -> Result<AggregationResult> {
        let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();

        for tx in self
            .reader
            .debits_for_user_between(self.user, self.from, self.till)
            .await?
        {
            *totals.entry(tx.currency.clone()).or_default() += tx.amount.abs();
        }

        Ok(into_items(totals))
    }
}

/// Produces the matching aggregator for a set of domain parameters.
///
/// `with_reader` rebinds the factory to another reader (typically a storage
/// transaction); the unbound factory stays shareable across requests.
#[derive(Clone)]
pub struct AggregationFactory {
    reader: Arc<dyn StorageRead>,
}

impl AggregationFactory {
    pub fn new(reader: Arc<dyn StorageRead>) -> Self {
        Self { reader }
    }

    pub fn general_total_by_user(&self, user: UserId) -> Box<dyn Aggregator> {
        Box::new(GeneralTotalAggregator {
            reader: self.reader.clone(),
            user,
        })
    }

    pub fn total_debited_by_user_per_period(
        &self,
        user: UserId,
        from: DateTime<Utc>,
        till: DateTime<Utc>,
    ) -> Box<dyn Aggregator> {
        Box::new(DebitedPerPeriodAggregator {
            reader: self.reader.clone(),
            user,
            from,
            till,
        })
    }

    pub fn with_reader(&self, reader: Arc<dyn StorageRead>) -> Self {
        Self { reader }
    }
}
