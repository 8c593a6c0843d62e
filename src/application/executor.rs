use std::sync::Arc;

use crate::application::bus::EventBus;
use crate::application::strategy::StrategyRegistry;
use crate::domain::balance::UserId;
use crate::domain::ports::{Storage, StorageTx};
use crate::domain::request::{Difference, Request, RequestId, RequestStatus, TransferDetails};
use crate::error::{LedgerError, Result};

/// Synchronous lifecycle event: a request has been executed inside the
/// carried transaction. Handlers operate within that transaction
/// (read-your-writes) and veto the commit by returning an error; only the
/// executor commits or rolls back.
pub struct ExecutionEvent {
    pub tx: Arc<dyn StorageTx>,
    pub request: Request,
    pub details: TransferDetails,
}

/// Post-commit notification: balances changed for this user. Best-effort;
/// by the time this is emitted the transaction is already committed.
pub struct BalanceChangedEvent {
    pub user_id: UserId,
    pub request_id: RequestId,
    pub differences: Vec<Difference>,
}

/// Flips a pending request to executed as one atomic unit of work.
///
/// Protocol: begin a transaction, run the subject's transfer strategy,
/// persist the status flip, synchronously publish the execution event, then
/// commit if no subscriber vetoed. Strategy errors and subscriber vetoes are
/// propagated verbatim and leave the request pending with the ledger
/// untouched. The post-commit balance-changed notification never unwinds an
/// already-committed transaction; its failures are logged only.
pub struct RequestExecutor {
    storage: Arc<dyn Storage>,
    strategies: Arc<StrategyRegistry>,
    executed: EventBus<ExecutionEvent>,
    balance_changed: EventBus<BalanceChangedEvent>,
}

impl RequestExecutor {
    pub fn new(
        storage: Arc<dyn Storage>,
        strategies: Arc<StrategyRegistry>,
        executed: EventBus<ExecutionEvent>,
        balance_changed: EventBus<BalanceChangedEvent>,
    ) -> Self {
        Self {
            storage,
            strategies,
            executed,
            balance_changed,
        }
    }

    pub async fn call(&self, request: &Request) -> Result<Request> {
        if !request.is_pending() {
            return Err(LedgerError::NotPending(request.id));
        }
        let strategy = self.strategies.get(request.subject)?;

        let tx = self.storage.begin().await?;

        let details = match strategy.execute(tx.as_ref(), request).await {
            Ok(details) => details,
            Err(err) => {
                // No event is published for a strategy failure.
                roll_back(&tx, request.id).await;
                return Err(err);
            }
        };

        let mut executed = request.clone();
        executed.status = RequestStatus::Executed;
        if let Err(err) = tx.update_request(executed.clone()).await {
            roll_back(&tx, request.id).await;
            return Err(err);
        }

        let event = ExecutionEvent {
            tx: tx.clone(),
            request: executed.clone(),
            details: details.clone(),
        };
        if let Err(veto) = self.executed.emit(&event).await {
            roll_back(&tx, request.id).await;
            return Err(veto);
        }

        tx.commit().await?;
        tracing::info!(request = %request.id, subject = ?request.subject, "request executed");

        let notice = BalanceChangedEvent {
            user_id: executed.user_id,
            request_id: executed.id,
            differences: details.differences,
        };
        if let Err(err) = self.balance_changed.emit(&notice).await {
            tracing::warn!(request = %request.id, error = %err, "balance-changed notification failed");
        }

        Ok(executed)
    }
}

pub(crate) async fn roll_back(tx: &Arc<dyn StorageTx>, request: RequestId) {
    if let Err(err) = tx.rollback().await {
        tracing::error!(request = %request, error = %err, "rollback failed");
    }
}
