use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::ports::TransferStrategy;
use crate::domain::request::RequestSubject;
use crate::error::{LedgerError, Result};

/// Explicit subject→strategy map, built once at startup and shared by the
/// executor and the canceller.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: HashMap<RequestSubject, Arc<dyn TransferStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        subject: RequestSubject,
        strategy: Arc<dyn TransferStrategy>,
    ) -> Result<()> {
        if self.strategies.contains_key(&subject) {
            return Err(LedgerError::AlreadyRegistered(format!("{subject:?}")));
        }
        self.strategies.insert(subject, strategy);
        Ok(())
    }

    pub fn get(&self, subject: RequestSubject) -> Result<Arc<dyn TransferStrategy>> {
        self.strategies
            .get(&subject)
            .cloned()
            .ok_or(LedgerError::StrategyMissing(subject))
    }
}
