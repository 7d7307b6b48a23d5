//! Admin approval workflow for funds requests.
//!
//! Approve and reject each run as a single database transaction. The
//! request row is locked first, the wallet row second, always in that
//! order; the wallet mutation and the status transition commit together
//! or not at all, so a crash mid-operation can never leave funds moved
//! with the request still pending.

use crate::error::{AppError, AppResult};
use crate::models::{FundsRequest, RequestType};
use crate::repositories::FundsRequestRepository;
use crate::services::WalletService;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct ApprovalService {
    pool: PgPool,
    requests: Arc<FundsRequestRepository>,
    wallet_service: Arc<WalletService>,
}

impl ApprovalService {
    pub fn new(
        pool: PgPool,
        requests: Arc<FundsRequestRepository>,
        wallet_service: Arc<WalletService>,
    ) -> Self {
        Self {
            pool,
            requests,
            wallet_service,
        }
    }

    /// Approve a pending request, applying the corresponding wallet
    /// mutation exactly once.
    ///
    /// Concurrent approvals of the same request serialize on the request
    /// row lock; the loser observes a non-pending status and fails with
    /// `RequestNotPending`. An insufficient-balance withdrawal aborts the
    /// transaction and leaves the request pending, so the admin can wait
    /// or reject it instead.
    pub async fn approve(&self, request_id: Uuid, admin_id: Uuid) -> AppResult<FundsRequest> {
        let mut tx = self.pool.begin().await?;

        let request = self
            .requests
            .find_for_update(&mut tx, request_id)
            .await?
            .ok_or(AppError::RequestNotFound(request_id))?;

        if !request.is_pending() {
            return Err(AppError::RequestNotPending {
                id: request_id,
                status: request.status,
            });
        }

        match request.request_type {
            RequestType::Deposit => {
                let reason = format!(
                    "Admin approved deposit request of {} USD",
                    request.amount_usd
                );
                self.wallet_service
                    .add_funds_in_tx(&mut tx, request.user_id, request.amount_spy, "deposit", &reason)
                    .await?;
            }
            RequestType::Withdrawal => {
                // The authoritative balance check runs inside the debit,
                // under the same lock as the write. On InsufficientBalance
                // the transaction rolls back and the request stays pending.
                let reason = format!(
                    "Admin approved withdrawal request of {} USD",
                    request.amount_usd
                );
                self.wallet_service
                    .deduct_funds_in_tx(
                        &mut tx,
                        request.user_id,
                        request.amount_spy,
                        "withdrawal",
                        &reason,
                    )
                    .await?;
            }
        }

        // Conditional on status = 'pending' as a second guard even though
        // the row is locked; a zero-row update surfaces as a conflict.
        let approved = self
            .requests
            .mark_approved(&mut tx, request_id, admin_id)
            .await?
            .ok_or(AppError::RequestNotPending {
                id: request_id,
                status: request.status,
            })?;

        tx.commit().await?;

        info!(
            %request_id,
            %admin_id,
            request_type = request.request_type.as_str(),
            amount_spy = request.amount_spy,
            "funds request approved"
        );
        Ok(approved)
    }

    /// Reject a pending request with a mandatory reason. Never touches the
    /// wallet.
    pub async fn reject(
        &self,
        request_id: Uuid,
        admin_id: Uuid,
        reason: &str,
    ) -> AppResult<FundsRequest> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation(
                "A rejection reason is required".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let request = self
            .requests
            .find_for_update(&mut tx, request_id)
            .await?
            .ok_or(AppError::RequestNotFound(request_id))?;

        if !request.is_pending() {
            return Err(AppError::RequestNotPending {
                id: request_id,
                status: request.status,
            });
        }

        let max_len = request.request_type.max_rejection_reason_len();
        if reason.chars().count() > max_len {
            return Err(AppError::Validation(format!(
                "Rejection reason exceeds {} characters",
                max_len
            )));
        }

        let rejected = self
            .requests
            .mark_rejected(&mut tx, request_id, admin_id, reason)
            .await?
            .ok_or(AppError::RequestNotPending {
                id: request_id,
                status: request.status,
            })?;

        tx.commit().await?;

        info!(%request_id, %admin_id, "funds request rejected");
        Ok(rejected)
    }
}
