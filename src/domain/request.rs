use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::balance::{BalanceId, BalanceKind, UserId};
use crate::domain::transaction::TransactionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestSubject {
    TopUp,
    Withdrawal,
    InternalTransfer,
    CurrencyExchange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Executed,
    Cancelled,
}

/// A monetary operation progressing through pending/executed/cancelled.
///
/// Created pending by an upstream handler; after that only the lifecycle
/// coordinator mutates it, and each request leaves `Pending` at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub user_id: UserId,
    pub subject: RequestSubject,
    pub status: RequestStatus,
    pub amount: Decimal,
    pub currency: String,
    /// Set for currency exchanges: the currency bought and the agreed rate.
    pub target_currency: Option<String>,
    pub rate: Option<Decimal>,
    pub initiated_by_admin: bool,
    pub initiated_by_system: bool,
    /// Opaque keyed parameters supplied by the upstream handler
    /// (e.g. counterparty IBAN, card token).
    pub input: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl Request {
    pub fn new(
        id: RequestId,
        user_id: UserId,
        subject: RequestSubject,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id,
            user_id,
            subject,
            status: RequestStatus::Pending,
            amount,
            currency: currency.into(),
            target_currency: None,
            rate: None,
            initiated_by_admin: false,
            initiated_by_system: false,
            input: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Signed net effect of a request on one distinct balance. Computed on the
/// read side, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difference {
    pub kind: BalanceKind,
    pub balance_id: Option<BalanceId>,
    pub currency: String,
    pub amount: Decimal,
}

/// What a transfer strategy reports back after mutating the ledger: one
/// difference per balance it touched and the transactions it inserted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferDetails {
    pub differences: Vec<Difference>,
    pub transactions: Vec<TransactionId>,
}

/// Point-in-time copy of a balance, taken inside the execution transaction
/// for every distinct balance a request touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub request_id: RequestId,
    pub kind: BalanceKind,
    pub balance_id: Option<BalanceId>,
    pub currency: String,
    pub current_amount: Decimal,
    pub available_amount: Decimal,
    pub taken_at: DateTime<Utc>,
}
