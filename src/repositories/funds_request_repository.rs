//! Repository for funds-request rows and their moderation listing

use crate::currency;
use crate::error::RepositoryError;
use crate::models::{FundsRequest, Page, RequestFilter, RequestType};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

const REQUEST_COLUMNS: &str = "id, user_id, request_type, amount_spy, amount_usd, \
     status, reason, approved_by, approved_at, created_at";

pub struct FundsRequestRepository {
    pool: PgPool,
}

impl FundsRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new pending request. `amount_usd` is derived here from
    /// `amount_spy` so the stored pair is always consistent.
    pub async fn create(
        &self,
        user_id: Uuid,
        request_type: RequestType,
        amount_spy: i64,
    ) -> Result<FundsRequest, RepositoryError> {
        let amount_usd = currency::spy_to_usd(amount_spy);

        let request = sqlx::query_as::<_, FundsRequest>(&format!(
            r#"
            INSERT INTO funds_requests (user_id, request_type, amount_spy, amount_usd)
            VALUES ($1, $2, $3, $4)
            RETURNING {REQUEST_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(request_type.as_str())
        .bind(amount_spy)
        .bind(amount_usd)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }

    /// Find a request by id
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<FundsRequest>, RepositoryError> {
        let request = sqlx::query_as::<_, FundsRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM funds_requests
            WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    /// Lock and return the request row for the rest of the transaction.
    /// The approval workflow locks the request before the wallet, always in
    /// that order.
    pub async fn find_for_update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<FundsRequest>, RepositoryError> {
        let request = sqlx::query_as::<_, FundsRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM funds_requests
            WHERE id = $1
            FOR UPDATE
            "#,
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(request)
    }

    /// Flip a pending request to approved, stamping the processing admin.
    /// The `status = 'pending'` condition is the compare-and-swap guard:
    /// returns `None` when the row was no longer pending.
    pub async fn mark_approved(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        admin_id: Uuid,
    ) -> Result<Option<FundsRequest>, RepositoryError> {
        let request = sqlx::query_as::<_, FundsRequest>(&format!(
            r#"
            UPDATE funds_requests
            SET status = 'approved', approved_by = $2, approved_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {REQUEST_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(admin_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(request)
    }

    /// Flip a pending request to rejected with the admin's reason.
    /// Same compare-and-swap guard as `mark_approved`.
    pub async fn mark_rejected(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        admin_id: Uuid,
        reason: &str,
    ) -> Result<Option<FundsRequest>, RepositoryError> {
        let request = sqlx::query_as::<_, FundsRequest>(&format!(
            r#"
            UPDATE funds_requests
            SET status = 'rejected', reason = $3, approved_by = $2, approved_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {REQUEST_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(admin_id)
        .bind(reason)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(request)
    }

    /// List requests for the moderation screens, newest first
    pub async fn list(
        &self,
        filter: &RequestFilter,
        page: Page,
    ) -> Result<Vec<FundsRequest>, RepositoryError> {
        let requests = sqlx::query_as::<_, FundsRequest>(
            r#"
            SELECT fr.id, fr.user_id, fr.request_type, fr.amount_spy, fr.amount_usd,
                   fr.status, fr.reason, fr.approved_by, fr.approved_at, fr.created_at
            FROM funds_requests fr
            JOIN users u ON u.id = fr.user_id
            WHERE ($1::VARCHAR IS NULL OR fr.status = $1)
              AND ($2::TEXT IS NULL OR u.email ILIKE '%' || $2 || '%')
            ORDER BY fr.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.search.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// Total row count for the same filter, for pagination
    pub async fn count(&self, filter: &RequestFilter) -> Result<i64, RepositoryError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM funds_requests fr
            JOIN users u ON u.id = fr.user_id
            WHERE ($1::VARCHAR IS NULL OR fr.status = $1)
              AND ($2::TEXT IS NULL OR u.email ILIKE '%' || $2 || '%')
            "#,
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.search.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}
