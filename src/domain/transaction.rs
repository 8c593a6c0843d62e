use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::balance::{AccountId, CardId, RevenueAccountId};
use crate::domain::request::RequestId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionPurpose {
    Transfer,
    Fee,
    Exchange,
    Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Executed,
    Cancelled,
}

/// One signed ledger movement, owned by exactly one request and tied to
/// exactly one balance entity. The three entity ids are mutually exclusive;
/// the constructors are the only way to set them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: TransactionId,
    pub request_id: RequestId,
    pub account_id: Option<AccountId>,
    pub card_id: Option<CardId>,
    pub revenue_account_id: Option<RevenueAccountId>,
    pub purpose: TransactionPurpose,
    pub status: TransactionStatus,
    /// Signed: credits are positive, debits negative.
    pub amount: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl LedgerTransaction {
    fn bare(
        id: TransactionId,
        request_id: RequestId,
        purpose: TransactionPurpose,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id,
            request_id,
            account_id: None,
            card_id: None,
            revenue_account_id: None,
            purpose,
            status: TransactionStatus::Pending,
            amount,
            currency: currency.into(),
            created_at: Utc::now(),
        }
    }

    pub fn for_account(
        id: TransactionId,
        request_id: RequestId,
        account_id: AccountId,
        purpose: TransactionPurpose,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        let mut tx = Self::bare(id, request_id, purpose, amount, currency);
        tx.account_id = Some(account_id);
        tx
    }

    pub fn for_card(
        id: TransactionId,
        request_id: RequestId,
        card_id: CardId,
        purpose: TransactionPurpose,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        let mut tx = Self::bare(id, request_id, purpose, amount, currency);
        tx.card_id = Some(card_id);
        tx
    }

    pub fn for_revenue_account(
        id: TransactionId,
        request_id: RequestId,
        revenue_account_id: RevenueAccountId,
        purpose: TransactionPurpose,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        let mut tx = Self::bare(id, request_id, purpose, amount, currency);
        tx.revenue_account_id = Some(revenue_account_id);
        tx
    }

    /// A debit moves money out of the balance.
    pub fn is_debit(&self) -> bool {
        self.amount < Decimal::ZERO
    }
}
