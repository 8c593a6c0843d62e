use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::balance::{
    AccountId, Balance, BalanceId, BalanceKind, CardId, RevenueAccountId, UserId,
};

/// A user's currency account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub currency: String,
    pub current_amount: Decimal,
    /// Derived field, recomputed by the ledger-delta subscriber after every
    /// executed request.
    pub available_amount: Decimal,
}

impl Account {
    pub fn new(id: AccountId, user_id: UserId, currency: impl Into<String>) -> Self {
        Self {
            id,
            user_id,
            currency: currency.into(),
            current_amount: Decimal::ZERO,
            available_amount: Decimal::ZERO,
        }
    }
}

impl Balance for Account {
    fn kind(&self) -> BalanceKind {
        BalanceKind::Account
    }

    fn id(&self) -> Option<BalanceId> {
        Some(BalanceId(self.id.0))
    }

    fn owner_user_id(&self) -> Option<UserId> {
        Some(self.user_id)
    }

    fn currency_code(&self) -> &str {
        &self.currency
    }

    fn current_balance(&self) -> Decimal {
        self.current_amount
    }

    fn available_balance(&self) -> Decimal {
        self.available_amount
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Debit,
    Credit,
}

/// A payment card. Credit cards extend the available amount by their credit
/// limit; a debit card carries a zero limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub user_id: UserId,
    pub card_type: CardType,
    pub currency: String,
    pub credit_limit: Decimal,
    pub current_amount: Decimal,
    pub available_amount: Decimal,
}

impl Card {
    pub fn new(id: CardId, user_id: UserId, card_type: CardType, currency: impl Into<String>) -> Self {
        Self {
            id,
            user_id,
            card_type,
            currency: currency.into(),
            credit_limit: Decimal::ZERO,
            current_amount: Decimal::ZERO,
            available_amount: Decimal::ZERO,
        }
    }
}

impl Balance for Card {
    fn kind(&self) -> BalanceKind {
        BalanceKind::Card
    }

    fn id(&self) -> Option<BalanceId> {
        Some(BalanceId(self.id.0))
    }

    fn owner_user_id(&self) -> Option<UserId> {
        Some(self.user_id)
    }

    fn currency_code(&self) -> &str {
        &self.currency
    }

    fn current_balance(&self) -> Decimal {
        self.current_amount
    }

    fn available_balance(&self) -> Decimal {
        self.available_amount
    }
}

/// House account collecting fees and exchange margins. Owned by the service
/// itself, not by any user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueAccount {
    pub id: RevenueAccountId,
    pub currency: String,
    pub current_amount: Decimal,
}

impl RevenueAccount {
    pub fn new(id: RevenueAccountId, currency: impl Into<String>) -> Self {
        Self {
            id,
            currency: currency.into(),
            current_amount: Decimal::ZERO,
        }
    }
}

impl Balance for RevenueAccount {
    fn kind(&self) -> BalanceKind {
        BalanceKind::RevenueAccount
    }

    fn id(&self) -> Option<BalanceId> {
        Some(BalanceId(self.id.0))
    }

    fn owner_user_id(&self) -> Option<UserId> {
        None
    }

    fn currency_code(&self) -> &str {
        &self.currency
    }

    fn current_balance(&self) -> Decimal {
        self.current_amount
    }

    fn available_balance(&self) -> Decimal {
        self.current_amount
    }
}
