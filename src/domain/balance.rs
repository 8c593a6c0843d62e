use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(UserId);
id_type!(AccountId);
id_type!(CardId);
id_type!(RevenueAccountId);
id_type!(BalanceId);

/// Discriminates the concrete entity behind a [`Balance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceKind {
    Account,
    Card,
    RevenueAccount,
}

impl fmt::Display for BalanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceKind::Account => write!(f, "account"),
            BalanceKind::Card => write!(f, "card"),
            BalanceKind::RevenueAccount => write!(f, "revenue_account"),
        }
    }
}

/// Uniform view over any ledger-bearing entity.
///
/// The core only ever consumes this capability surface; the concrete types
/// (accounts, cards, revenue accounts) live in [`crate::domain::entities`].
/// Revenue accounts have no owner, hence `owner_user_id` is optional.
pub trait Balance: Send + Sync {
    fn kind(&self) -> BalanceKind;
    fn id(&self) -> Option<BalanceId>;
    fn owner_user_id(&self) -> Option<UserId>;
    fn currency_code(&self) -> &str;
    fn current_balance(&self) -> Decimal;
    fn available_balance(&self) -> Decimal;
}

pub type BalanceRef = Arc<dyn Balance>;
