use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::application::aggregation::{AggregationFactory, AggregationItem, AggregationResult};
use crate::application::reducer::Reducer;
use crate::domain::balance::UserId;
use crate::domain::ports::StorageRead;
use crate::error::Result;

/// Facade over factory + reducer for the canonical analytical queries.
///
/// The reducer is transaction-agnostic, so `with_reader` only retargets the
/// factory.
#[derive(Clone)]
pub struct AggregationService {
    factory: AggregationFactory,
    reducer: Arc<Reducer>,
}

impl AggregationService {
    pub fn new(factory: AggregationFactory, reducer: Arc<Reducer>) -> Self {
        Self { factory, reducer }
    }

    /// Total user exposure (balances plus pending movements) expressed in
    /// one currency.
    pub async fn general_total_by_user(
        &self,
        user: UserId,
        out_currency: &str,
    ) -> Result<AggregationItem> {
        let result = self.factory.general_total_by_user(user).aggregate().await?;
        self.reducer.reduce(&result, out_currency).await
    }

    /// Total debited by the user in `[from, till)`, expressed in one currency.
    pub async fn total_debited_by_user_per_period(
        &self,
        user: UserId,
        from: DateTime<Utc>,
        till: DateTime<Utc>,
        out_currency: &str,
    ) -> Result<AggregationItem> {
        let result = self
            .factory
            .total_debited_by_user_per_period(user, from, till)
            .aggregate()
            .await?;
        self.reducer.reduce(&result, out_currency).await
    }

    /// Passthrough reduction for results fetched elsewhere.
    pub async fn reduce(
        &self,
        result: &AggregationResult,
        out_currency: &str,
    ) -> Result<AggregationItem> {
        self.reducer.reduce(result, out_currency).await
    }

    pub fn with_reader(&self, reader: Arc<dyn StorageRead>) -> Self {
        Self {
            factory: self.factory.with_reader(reader),
            reducer: self.reducer.clone(),
        }
    }
}
