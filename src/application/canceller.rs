use std::sync::Arc;

use crate::application::bus::EventBus;
use crate::application::executor::roll_back;
use crate::application::strategy::StrategyRegistry;
use crate::domain::balance::UserId;
use crate::domain::ports::{Storage, StorageTx};
use crate::domain::request::{Request, RequestId, RequestStatus};
use crate::error::{LedgerError, Result};

/// Synchronous lifecycle event: a request has been cancelled inside the
/// carried transaction.
pub struct CancellationEvent {
    pub tx: Arc<dyn StorageTx>,
    pub user_id: UserId,
    pub request_id: RequestId,
    pub reason: String,
}

/// Flips a pending request to cancelled, mirroring the executor's protocol:
/// strategy, status flip, synchronous event, commit. There is no post-commit
/// phase for cancellations.
pub struct RequestCanceller {
    storage: Arc<dyn Storage>,
    strategies: Arc<StrategyRegistry>,
    cancelled: EventBus<CancellationEvent>,
}

impl RequestCanceller {
    pub fn new(
        storage: Arc<dyn Storage>,
        strategies: Arc<StrategyRegistry>,
        cancelled: EventBus<CancellationEvent>,
    ) -> Self {
        Self {
            storage,
            strategies,
            cancelled,
        }
    }

    pub async fn call(&self, request: &Request, reason: &str) -> Result<Request> {
        if !request.is_pending() {
            return Err(LedgerError::NotPending(request.id));
        }
        let strategy = self.strategies.get(request.subject)?;

        let tx = self.storage.begin().await?;

        if let Err(err) = strategy.cancel(tx.as_ref(), request, reason).await {
            roll_back(&tx, request.id).await;
            return Err(err);
        }

        let mut cancelled = request.clone();
        cancelled.status = RequestStatus::Cancelled;
        if let Err(err) = tx.update_request(cancelled.clone()).await {
            roll_back(&tx, request.id).await;
            return Err(err);
        }

        let event = CancellationEvent {
            tx: tx.clone(),
            user_id: cancelled.user_id,
            request_id: cancelled.id,
            reason: reason.to_string(),
        };
        if let Err(veto) = self.cancelled.emit(&event).await {
            roll_back(&tx, request.id).await;
            return Err(veto);
        }

        tx.commit().await?;
        tracing::info!(request = %request.id, reason, "request cancelled");

        Ok(cancelled)
    }
}
