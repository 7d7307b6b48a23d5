pub mod funds_request_repository;
pub mod user_repository;
pub mod wallet_repository;

// Re-export all repositories for convenient access
pub use funds_request_repository::FundsRequestRepository;
pub use user_repository::UserRepository;
pub use wallet_repository::WalletRepository;
