pub mod approval_service;
pub mod wallet_service;

pub use approval_service::ApprovalService;
pub use wallet_service::WalletService;
