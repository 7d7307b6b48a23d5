//! StayHub Wallet Library
//!
//! This module exposes the wallet and funds-request components for use by
//! the service binary, tests, and other consumers.

pub mod api;
pub mod config;
pub mod currency;
pub mod database;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use database::Database;
use repositories::*;
use services::*;
use std::sync::Arc;

/// Application state containing all repositories and services
pub struct AppState {
    pub database: Database,
    pub user_repo: Arc<UserRepository>,
    pub wallet_repo: Arc<WalletRepository>,
    pub funds_request_repo: Arc<FundsRequestRepository>,
    pub wallet_service: Arc<WalletService>,
    pub approval_service: Arc<ApprovalService>,
}

impl AppState {
    /// Create a new AppState with initialized repositories and services
    pub fn new(pool: sqlx::PgPool) -> Self {
        let database = Database::new(pool.clone());

        let user_repo = Arc::new(UserRepository::new(pool.clone()));
        let wallet_repo = Arc::new(WalletRepository::new(pool.clone()));
        let funds_request_repo = Arc::new(FundsRequestRepository::new(pool.clone()));

        let wallet_service = Arc::new(WalletService::new(pool.clone(), wallet_repo.clone()));
        let approval_service = Arc::new(ApprovalService::new(
            pool,
            funds_request_repo.clone(),
            wallet_service.clone(),
        ));

        Self {
            database,
            user_repo,
            wallet_repo,
            funds_request_repo,
            wallet_service,
            approval_service,
        }
    }
}
