use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{LedgerError, Result};

/// A subscriber on one event kind. Failure is signalled through the returned
/// `Result`; the bus aggregates these for the publisher.
#[async_trait]
pub trait Handler<E: Send + Sync>: Send + Sync {
    fn name(&self) -> &str;
    async fn handle(&self, event: &E) -> Result<()>;
}

/// Synchronous in-process event bus.
///
/// `emit` returns only after every handler registered at call time has
/// processed the payload, in registration order. There is no buffering and no
/// partial fan-out: even when a handler fails, the remaining handlers still
/// run, and the first failure is returned afterwards. Emission with zero
/// handlers is a no-op success. Handlers are expected to be registered before
/// steady-state traffic begins; nothing cancels a hanging handler.
pub struct EventBus<E> {
    handlers: Vec<Arc<dyn Handler<E>>>,
}

impl<E: Send + Sync> EventBus<E> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, handler: Arc<dyn Handler<E>>) -> Result<()> {
        if self.handlers.iter().any(|h| h.name() == handler.name()) {
            return Err(LedgerError::AlreadyRegistered(handler.name().to_string()));
        }
        self.handlers.push(handler);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub async fn emit(&self, event: &E) -> Result<()> {
        let mut first_error = None;
        for handler in &self.handlers {
            if let Err(err) = handler.handle(event).await {
                tracing::debug!(handler = handler.name(), error = %err, "handler rejected event");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<E: Send + Sync> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}
