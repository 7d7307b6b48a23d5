//! The only code path permitted to mutate a wallet balance.
//!
//! Every mutation runs as one database transaction: the balance write and
//! the matching ledger append commit together or not at all. The
//! non-negative invariant is enforced under the same row lock the write
//! uses.

use crate::error::{AppError, AppResult, RepositoryError};
use crate::models::Wallet;
use crate::repositories::WalletRepository;
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

pub struct WalletService {
    pool: PgPool,
    wallets: Arc<WalletRepository>,
}

impl WalletService {
    pub fn new(pool: PgPool, wallets: Arc<WalletRepository>) -> Self {
        Self { pool, wallets }
    }

    fn validate(amount_spy: i64, reason: &str) -> AppResult<()> {
        if amount_spy <= 0 {
            return Err(AppError::InvalidAmount(amount_spy));
        }
        if reason.trim().is_empty() {
            return Err(AppError::Validation(
                "A non-empty reason is required for every balance mutation".to_string(),
            ));
        }
        Ok(())
    }

    /// Credit `amount_spy` to the user's wallet, creating it with a zero
    /// balance first if this is the user's first funds operation.
    pub async fn add_funds(
        &self,
        user_id: Uuid,
        amount_spy: i64,
        category: &str,
        reason: &str,
    ) -> AppResult<Wallet> {
        let mut tx = self.pool.begin().await?;
        let wallet = self
            .add_funds_in_tx(&mut tx, user_id, amount_spy, category, reason)
            .await?;
        tx.commit().await?;
        Ok(wallet)
    }

    /// Credit variant composing onto a caller-owned transaction. Used by
    /// the approval workflow so the credit and the request state
    /// transition commit as one unit.
    pub async fn add_funds_in_tx(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        amount_spy: i64,
        category: &str,
        reason: &str,
    ) -> AppResult<Wallet> {
        Self::validate(amount_spy, reason)?;

        if let Err(e) = self.wallets.ensure_exists(conn, user_id).await {
            return Err(match e {
                RepositoryError::ForeignKey(_) => {
                    error!(%user_id, "wallet creation failed: owning user does not exist");
                    AppError::WalletNotFound(user_id)
                }
                other => other.into(),
            });
        }

        let wallet = self
            .wallets
            .fetch_for_update(conn, user_id)
            .await?
            .ok_or(AppError::WalletNotFound(user_id))?;

        wallet.balance.checked_add(amount_spy).ok_or_else(|| {
            AppError::Validation(format!("Balance overflow crediting wallet {}", user_id))
        })?;

        let updated = self.wallets.apply_delta(conn, user_id, amount_spy).await?;
        self.wallets
            .append_ledger(conn, user_id, amount_spy, category, reason)
            .await?;

        info!(
            %user_id,
            amount_spy,
            balance = updated.balance,
            category,
            "wallet credited"
        );
        Ok(updated)
    }

    /// Debit `amount_spy` from the user's wallet.
    ///
    /// The balance is re-checked under the row lock used for the write, so
    /// an earlier advisory check passing does not guarantee success here.
    pub async fn deduct_funds(
        &self,
        user_id: Uuid,
        amount_spy: i64,
        category: &str,
        reason: &str,
    ) -> AppResult<Wallet> {
        let mut tx = self.pool.begin().await?;
        let wallet = self
            .deduct_funds_in_tx(&mut tx, user_id, amount_spy, category, reason)
            .await?;
        tx.commit().await?;
        Ok(wallet)
    }

    /// Debit variant composing onto a caller-owned transaction
    pub async fn deduct_funds_in_tx(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        amount_spy: i64,
        category: &str,
        reason: &str,
    ) -> AppResult<Wallet> {
        Self::validate(amount_spy, reason)?;

        // A wallet that was never created holds a zero balance; the debit
        // fails without creating the row.
        let available = self
            .wallets
            .fetch_for_update(conn, user_id)
            .await?
            .map(|w| w.balance)
            .unwrap_or(0);

        if available < amount_spy {
            return Err(AppError::InsufficientBalance {
                available,
                required: amount_spy,
            });
        }

        let updated = self.wallets.apply_delta(conn, user_id, -amount_spy).await?;
        self.wallets
            .append_ledger(conn, user_id, -amount_spy, category, reason)
            .await?;

        info!(
            %user_id,
            amount_spy,
            balance = updated.balance,
            category,
            "wallet debited"
        );
        Ok(updated)
    }

    /// Advisory pre-flight check: whether the current balance covers
    /// `amount_spy`.
    ///
    /// The balance may change between this check and a later deduction;
    /// only the re-check inside `deduct_funds` is authoritative.
    pub async fn validate_sufficient_balance(
        &self,
        user_id: Uuid,
        amount_spy: i64,
    ) -> AppResult<bool> {
        if amount_spy <= 0 {
            return Err(AppError::InvalidAmount(amount_spy));
        }
        Ok(self.wallets.has_sufficient_balance(user_id, amount_spy).await?)
    }

    /// Sum of all ledger deltas for the wallet, for reconciliation against
    /// the stored balance
    pub async fn ledger_balance(&self, user_id: Uuid) -> AppResult<i64> {
        Ok(self.wallets.ledger_sum(user_id).await?)
    }
}
