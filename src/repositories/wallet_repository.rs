//! Repository for wallet rows and the append-only ledger.
//!
//! Pool-level methods are plain reads. The transaction-scoped methods take
//! an explicit `&mut PgConnection` so WalletService and the approval
//! workflow can compose the balance write, the ledger append, and the
//! request state transition onto a single transaction.

use crate::error::RepositoryError;
use crate::models::{LedgerEntry, Wallet};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

pub struct WalletRepository {
    pool: PgPool,
}

impl WalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Pool-level reads
    // =========================================================================

    /// Get a user's wallet, if one has been created
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Wallet>, RepositoryError> {
        let wallet = sqlx::query_as::<_, Wallet>(
            r#"
            SELECT user_id, balance, created_at, updated_at
            FROM wallets
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(wallet)
    }

    /// Check whether the balance covers `required` (available >= required).
    /// A user without a wallet row has a zero balance and is never sufficient.
    pub async fn has_sufficient_balance(
        &self,
        user_id: Uuid,
        required: i64,
    ) -> Result<bool, RepositoryError> {
        let sufficient = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT balance >= $1
            FROM wallets
            WHERE user_id = $2
            "#,
        )
        .bind(required)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sufficient.unwrap_or(false))
    }

    /// Most recent ledger entries for a user's wallet
    pub async fn ledger_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<LedgerEntry>, RepositoryError> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, user_id, delta, category, reason, created_at
            FROM wallet_ledger
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Sum of all ledger deltas for a wallet. Equals the wallet balance
    /// after any sequence of operations (reconciliation property).
    pub async fn ledger_sum(&self, user_id: Uuid) -> Result<i64, RepositoryError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(delta), 0)::BIGINT
            FROM wallet_ledger
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    // =========================================================================
    // Transaction-scoped primitives
    // =========================================================================

    /// Create the wallet row with a zero balance if it does not exist yet.
    /// Fails with a foreign-key violation if the owning user is missing.
    pub async fn ensure_exists(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO wallets (user_id, balance)
            VALUES ($1, 0)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Lock and return the wallet row for the rest of the transaction
    pub async fn fetch_for_update(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Option<Wallet>, RepositoryError> {
        let wallet = sqlx::query_as::<_, Wallet>(
            r#"
            SELECT user_id, balance, created_at, updated_at
            FROM wallets
            WHERE user_id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(wallet)
    }

    /// Apply a signed delta to a locked wallet row
    pub async fn apply_delta(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        delta: i64,
    ) -> Result<Wallet, RepositoryError> {
        let wallet = sqlx::query_as::<_, Wallet>(
            r#"
            UPDATE wallets
            SET balance = balance + $2, updated_at = NOW()
            WHERE user_id = $1
            RETURNING user_id, balance, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(delta)
        .fetch_one(&mut *conn)
        .await?;

        Ok(wallet)
    }

    /// Append one ledger row for a mutation already applied on this
    /// transaction
    pub async fn append_ledger(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        delta: i64,
        category: &str,
        reason: &str,
    ) -> Result<LedgerEntry, RepositoryError> {
        let entry = sqlx::query_as::<_, LedgerEntry>(
            r#"
            INSERT INTO wallet_ledger (user_id, delta, category, reason)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, delta, category, reason, created_at
            "#,
        )
        .bind(user_id)
        .bind(delta)
        .bind(category)
        .bind(reason)
        .fetch_one(&mut *conn)
        .await?;

        Ok(entry)
    }
}
