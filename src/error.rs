use thiserror::Error;

use crate::domain::request::{RequestId, RequestSubject};

/// Errors produced by the wallet core.
///
/// `NotResolved` is non-fatal and used for resolver chaining; everything else
/// either aborts the current unit of work (pre-commit) or is logged and
/// swallowed (post-commit notifications).
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The balance source could not be mapped to a balance by this resolver.
    #[error("balance source not resolved")]
    NotResolved,
    #[error("`{0}` is already registered")]
    AlreadyRegistered(String),
    #[error("no exchange rate for {from}->{to}: {reason}")]
    RateUnavailable {
        from: String,
        to: String,
        reason: String,
    },
    #[error("no transfer strategy for subject {0:?}")]
    StrategyMissing(RequestSubject),
    #[error("request {0} is not pending")]
    NotPending(RequestId),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("storage transaction already closed")]
    TransactionClosed,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("notification error: {0}")]
    Notification(String),
    #[error("audit error: {0}")]
    Audit(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
