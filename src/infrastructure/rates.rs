use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::domain::ports::RateSource;
use crate::error::{LedgerError, Result};

/// Fixed-table [`RateSource`] for tests and offline setups. Lookups are
/// directional: a `EUR->USD` entry does not answer `USD->EUR`.
#[derive(Default, Clone)]
pub struct FixedRateTable {
    rates: HashMap<(String, String), Decimal>,
}

impl FixedRateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, from: impl Into<String>, to: impl Into<String>, rate: Decimal) -> Self {
        self.rates.insert((from.into(), to.into()), rate);
        self
    }

    pub fn remove_rate(&mut self, from: &str, to: &str) {
        self.rates.remove(&(from.to_string(), to.to_string()));
    }
}

#[async_trait]
impl RateSource for FixedRateTable {
    async fn find_rate(&self, from: &str, to: &str) -> Result<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        self.rates
            .get(&(from.to_string(), to.to_string()))
            .copied()
            .ok_or_else(|| LedgerError::RateUnavailable {
                from: from.to_string(),
                to: to.to_string(),
                reason: "pair not present in rate table".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn lookups_are_directional() {
        let table = FixedRateTable::new().with_rate("EUR", "USD", dec!(1.1));
        assert_eq!(table.find_rate("EUR", "USD").await.unwrap(), dec!(1.1));
        assert!(table.find_rate("USD", "EUR").await.is_err());
    }

    #[tokio::test]
    async fn identity_rate_is_one() {
        let table = FixedRateTable::new();
        assert_eq!(table.find_rate("EUR", "EUR").await.unwrap(), Decimal::ONE);
    }
}
