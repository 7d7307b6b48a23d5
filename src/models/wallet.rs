//! Wallet and ledger models for fund tracking

use crate::currency;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's wallet. Balance is held in SPY and never goes negative.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: Uuid,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// USD display value for the current balance
    pub fn balance_usd(&self) -> Decimal {
        currency::spy_to_usd(self.balance)
    }

    /// Whether the balance covers `amount_spy`
    pub fn can_cover(&self, amount_spy: i64) -> bool {
        self.balance >= amount_spy
    }
}

/// One ledger row per balance mutation. Immutable once written; for every
/// wallet the deltas sum to the current balance.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub delta: i64,
    pub category: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn is_credit(&self) -> bool {
        self.delta > 0
    }

    pub fn is_debit(&self) -> bool {
        self.delta < 0
    }
}
