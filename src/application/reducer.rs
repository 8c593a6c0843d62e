use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use crate::application::aggregation::AggregationItem;
use crate::domain::ports::RateSource;
use crate::error::{LedgerError, Result};

/// Collapses a multi-currency dataset into one amount in a target currency.
///
/// Rates are fetched through a cache scoped to a single `reduce` call, so one
/// reduction hits the external source at most once per currency and two
/// reductions never share stale rates. The first missing rate aborts the
/// whole reduction; there are no partial totals. All arithmetic is decimal
/// with no intermediate rounding.
pub struct Reducer {
    rates: Arc<dyn RateSource>,
}

impl Reducer {
    pub fn new(rates: Arc<dyn RateSource>) -> Self {
        Self { rates }
    }

    pub async fn reduce(
        &self,
        items: &[AggregationItem],
        target_currency: &str,
    ) -> Result<AggregationItem> {
        let mut cache: HashMap<String, Decimal> = HashMap::new();
        let mut total = Decimal::ZERO;

        for item in items {
            if item.currency == target_currency {
                total += item.amount;
                continue;
            }

            let rate = match cache.get(&item.currency) {
                Some(rate) => *rate,
                None => {
                    let rate = self
                        .rates
                        .find_rate(&item.currency, target_currency)
                        .await
                        .map_err(|err| match err {
                            found @ LedgerError::RateUnavailable { .. } => found,
                            other => LedgerError::RateUnavailable {
                                from: item.currency.clone(),
                                to: target_currency.to_string(),
                                reason: other.to_string(),
                            },
                        })?;
                    cache.insert(item.currency.clone(), rate);
                    rate
                }
            };

            total += item.amount * rate;
        }

        Ok(AggregationItem::new(total, target_currency))
    }
}
