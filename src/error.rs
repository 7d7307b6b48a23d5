use crate::database::DatabaseError;
use crate::models::RequestStatus;
use sqlx::Error as SqlxError;
use thiserror::Error;
use uuid::Uuid;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database errors
    #[error("SQL error: {0}")]
    Sqlx(#[from] SqlxError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Non-positive amount passed to a wallet mutation
    #[error("Invalid amount: {0} SPY (must be a positive integer)")]
    InvalidAmount(i64),

    /// Deduction would drive the balance negative
    #[error("Insufficient balance: {available} SPY available, {required} SPY required")]
    InsufficientBalance { available: i64, required: i64 },

    /// Unknown funds request id
    #[error("Funds request {0} not found")]
    RequestNotFound(Uuid),

    /// Transition attempted on an already-terminal request
    #[error("Funds request {id} is not pending (status: {status})")]
    RequestNotPending { id: Uuid, status: RequestStatus },

    /// The owning user record is missing; data-integrity failure
    #[error("Wallet owner {0} does not exist")]
    WalletNotFound(Uuid),

    /// Not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Unauthorized access errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// UUID parsing errors
    #[error("Invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Check if error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_) | AppError::RequestNotFound(_))
    }

    /// Stable machine-readable error kind, used in API responses
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidAmount(_) => "invalid_amount",
            AppError::InsufficientBalance { .. } => "insufficient_balance",
            AppError::RequestNotFound(_) => "request_not_found",
            AppError::RequestNotPending { .. } => "request_not_pending",
            AppError::WalletNotFound(_) => "wallet_not_found",
            AppError::Validation(_) | AppError::InvalidUuid(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Config(_) => "config",
            AppError::Database(_) | AppError::Sqlx(_) => "database",
            AppError::Serialization(_) => "serialization",
        }
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::RequestNotFound(_) | AppError::NotFound(_) => 404,
            AppError::RequestNotPending { .. } => 409,
            AppError::InsufficientBalance { .. } => 422,
            AppError::InvalidAmount(_) | AppError::Validation(_) | AppError::InvalidUuid(_) => 400,
            AppError::Unauthorized(_) => 401,
            // Missing owner is a data-integrity fault, not a client error
            AppError::WalletNotFound(_) => 500,
            AppError::Config(_) => 500,
            AppError::Database(_) | AppError::Sqlx(_) => 500,
            AppError::Serialization(_) => 500,
        }
    }
}

/// Repository-specific error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database query error
    #[error("Query error: {0}")]
    Query(SqlxError),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Duplicate record
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// Constraint violation (foreign key or check constraint)
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Foreign key violation; the referenced row does not exist
    #[error("Missing referenced row: {0}")]
    ForeignKey(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => AppError::NotFound(msg),
            RepositoryError::Query(e) => AppError::Sqlx(e),
            RepositoryError::Duplicate(msg) => AppError::Validation(format!("Duplicate: {}", msg)),
            RepositoryError::ConstraintViolation(msg) => AppError::Validation(msg),
            RepositoryError::ForeignKey(msg) => AppError::Validation(msg),
            RepositoryError::InvalidInput(msg) => AppError::Validation(msg),
        }
    }
}

impl From<SqlxError> for RepositoryError {
    fn from(err: SqlxError) -> Self {
        match &err {
            SqlxError::RowNotFound => RepositoryError::NotFound("Record not found".to_string()),
            SqlxError::Database(db_err) => {
                // Check for common PostgreSQL error codes
                let code = db_err.code().map(|c| c.to_string());
                if code.as_deref() == Some("23505") {
                    // Unique violation
                    RepositoryError::Duplicate(db_err.message().to_string())
                } else if code.as_deref() == Some("23503") {
                    // Foreign key violation
                    RepositoryError::ForeignKey(db_err.message().to_string())
                } else if code.as_deref() == Some("23514") {
                    // Check constraint violation
                    RepositoryError::ConstraintViolation(db_err.message().to_string())
                } else {
                    RepositoryError::Query(err)
                }
            }
            _ => RepositoryError::Query(err),
        }
    }
}
