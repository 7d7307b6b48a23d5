mod helpers;

use helpers::*;
use rust_decimal::Decimal;
use sqlx::PgPool;
use stayhub_wallet::currency;
use stayhub_wallet::error::AppError;
use stayhub_wallet::models::*;
use uuid::Uuid;

// =============================================================================
// WalletService
// =============================================================================

/// Deduction from an empty wallet fails and leaves the balance untouched
#[sqlx::test]
async fn test_deduct_from_empty_wallet_fails(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let user = create_test_user(&db, "alice@example.com").await;
    create_empty_wallet(&db, user.id).await;

    let result = db
        .wallet_service
        .deduct_funds(user.id, 500, "withdrawal", "test withdrawal")
        .await;

    assert!(matches!(
        result,
        Err(AppError::InsufficientBalance {
            available: 0,
            required: 500
        })
    ));

    let wallet = db
        .wallet_repo
        .find_by_user(user.id)
        .await
        .expect("Failed to fetch wallet")
        .expect("Wallet should exist");
    assert_eq!(wallet.balance, 0);
}

/// Credits update the balance and append exactly one ledger row
#[sqlx::test]
async fn test_add_funds_appends_ledger(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let user = create_test_user(&db, "alice@example.com").await;
    seed_wallet(&db, user.id, 1000).await;

    let wallet = db
        .wallet_service
        .add_funds(user.id, 500, "deposit", "test")
        .await
        .expect("Failed to add funds");

    assert_eq!(wallet.balance, 1500);

    let ledger = db
        .wallet_repo
        .ledger_for_user(user.id, 10)
        .await
        .expect("Failed to fetch ledger");
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[0].delta, 500);
    assert_eq!(ledger[0].category, "deposit");
    assert!(ledger[0].is_credit());
}

/// Non-positive amounts and empty reasons are rejected before any mutation
#[sqlx::test]
async fn test_mutation_input_validation(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let user = create_test_user(&db, "alice@example.com").await;

    let result = db.wallet_service.add_funds(user.id, 0, "deposit", "x").await;
    assert!(matches!(result, Err(AppError::InvalidAmount(0))));

    let result = db
        .wallet_service
        .deduct_funds(user.id, -5, "withdrawal", "x")
        .await;
    assert!(matches!(result, Err(AppError::InvalidAmount(-5))));

    let result = db.wallet_service.add_funds(user.id, 100, "deposit", "  ").await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    // Nothing was created or written
    assert!(db
        .wallet_repo
        .find_by_user(user.id)
        .await
        .expect("Failed to fetch wallet")
        .is_none());
}

/// Crediting an unknown user surfaces the data-integrity error
#[sqlx::test]
async fn test_add_funds_unknown_user(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let ghost = Uuid::new_v4();

    let result = db
        .wallet_service
        .add_funds(ghost, 100, "deposit", "test")
        .await;

    assert!(matches!(result, Err(AppError::WalletNotFound(id)) if id == ghost));
}

/// The deduction re-checks the balance under its own lock
#[sqlx::test]
async fn test_deduct_rechecks_balance(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let user = create_test_user(&db, "alice@example.com").await;
    seed_wallet(&db, user.id, 100).await;

    let result = db
        .wallet_service
        .deduct_funds(user.id, 200, "withdrawal", "test")
        .await;

    assert!(matches!(
        result,
        Err(AppError::InsufficientBalance {
            available: 100,
            required: 200
        })
    ));

    // Balance unchanged, no debit ledger row written
    let wallet = db
        .wallet_repo
        .find_by_user(user.id)
        .await
        .expect("Failed to fetch wallet")
        .expect("Wallet should exist");
    assert_eq!(wallet.balance, 100);

    let ledger = db
        .wallet_repo
        .ledger_for_user(user.id, 10)
        .await
        .expect("Failed to fetch ledger");
    assert_eq!(ledger.len(), 1);
}

/// The pre-flight check is advisory and never mutates anything
#[sqlx::test]
async fn test_validate_sufficient_balance(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let user = create_test_user(&db, "alice@example.com").await;
    seed_wallet(&db, user.id, 100).await;

    assert!(db
        .wallet_service
        .validate_sufficient_balance(user.id, 100)
        .await
        .expect("Check failed"));
    assert!(!db
        .wallet_service
        .validate_sufficient_balance(user.id, 101)
        .await
        .expect("Check failed"));

    // A user without a wallet has a zero balance
    let other = create_test_user(&db, "bob@example.com").await;
    assert!(!db
        .wallet_service
        .validate_sufficient_balance(other.id, 1)
        .await
        .expect("Check failed"));

    let result = db.wallet_service.validate_sufficient_balance(user.id, 0).await;
    assert!(matches!(result, Err(AppError::InvalidAmount(0))));
}

/// The ledger deltas always sum to the stored balance
#[sqlx::test]
async fn test_ledger_reconciliation(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let user = create_test_user(&db, "alice@example.com").await;

    seed_wallet(&db, user.id, 1000).await;
    db.wallet_service
        .add_funds(user.id, 250, "deposit", "second deposit")
        .await
        .expect("Failed to add funds");
    db.wallet_service
        .deduct_funds(user.id, 300, "withdrawal", "first withdrawal")
        .await
        .expect("Failed to deduct funds");

    // A failed deduction leaves no trace in the ledger
    let result = db
        .wallet_service
        .deduct_funds(user.id, 10_000, "withdrawal", "too large")
        .await;
    assert!(matches!(result, Err(AppError::InsufficientBalance { .. })));

    let wallet = db
        .wallet_repo
        .find_by_user(user.id)
        .await
        .expect("Failed to fetch wallet")
        .expect("Wallet should exist");
    assert_eq!(wallet.balance, 950);

    let ledger_sum = db
        .wallet_service
        .ledger_balance(user.id)
        .await
        .expect("Failed to sum ledger");
    assert_eq!(ledger_sum, wallet.balance);

    let ledger = db
        .wallet_repo
        .ledger_for_user(user.id, 10)
        .await
        .expect("Failed to fetch ledger");
    assert_eq!(ledger.len(), 3);
}

// =============================================================================
// Approval workflow
// =============================================================================

/// Approving a deposit credits the wallet and terminates the request
#[sqlx::test]
async fn test_approve_deposit(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let user = create_test_user(&db, "alice@example.com").await;
    let request = create_pending_request(&db, user.id, RequestType::Deposit, 5500).await;
    let admin = Uuid::new_v4();

    let approved = db
        .approval_service
        .approve(request.id, admin)
        .await
        .expect("Approval failed");

    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.approved_by, Some(admin));
    assert!(approved.approved_at.is_some());

    let wallet = db
        .wallet_repo
        .find_by_user(user.id)
        .await
        .expect("Failed to fetch wallet")
        .expect("Wallet should exist");
    assert_eq!(wallet.balance, 5500);

    // Second approval attempt on the same request is a conflict
    let result = db.approval_service.approve(request.id, admin).await;
    assert!(matches!(
        result,
        Err(AppError::RequestNotPending {
            status: RequestStatus::Approved,
            ..
        })
    ));

    // And the balance was applied exactly once
    let wallet = db
        .wallet_repo
        .find_by_user(user.id)
        .await
        .expect("Failed to fetch wallet")
        .expect("Wallet should exist");
    assert_eq!(wallet.balance, 5500);
}

/// Approving a withdrawal debits the wallet
#[sqlx::test]
async fn test_approve_withdrawal(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let user = create_test_user(&db, "alice@example.com").await;
    seed_wallet(&db, user.id, 1000).await;
    let request = create_pending_request(&db, user.id, RequestType::Withdrawal, 400).await;

    let approved = db
        .approval_service
        .approve(request.id, Uuid::new_v4())
        .await
        .expect("Approval failed");

    assert_eq!(approved.status, RequestStatus::Approved);

    let wallet = db
        .wallet_repo
        .find_by_user(user.id)
        .await
        .expect("Failed to fetch wallet")
        .expect("Wallet should exist");
    assert_eq!(wallet.balance, 600);

    let ledger_sum = db
        .wallet_service
        .ledger_balance(user.id)
        .await
        .expect("Failed to sum ledger");
    assert_eq!(ledger_sum, 600);
}

/// An underfunded withdrawal approval fails and leaves the request pending
#[sqlx::test]
async fn test_approve_withdrawal_insufficient_balance(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let user = create_test_user(&db, "alice@example.com").await;
    seed_wallet(&db, user.id, 100).await;
    let request = create_pending_request(&db, user.id, RequestType::Withdrawal, 200).await;

    let result = db.approval_service.approve(request.id, Uuid::new_v4()).await;
    assert!(matches!(
        result,
        Err(AppError::InsufficientBalance {
            available: 100,
            required: 200
        })
    ));

    // The request can still be retried or rejected later
    let request = db
        .funds_request_repo
        .find_by_id(request.id)
        .await
        .expect("Failed to fetch request")
        .expect("Request should exist");
    assert_eq!(request.status, RequestStatus::Pending);

    let wallet = db
        .wallet_repo
        .find_by_user(user.id)
        .await
        .expect("Failed to fetch wallet")
        .expect("Wallet should exist");
    assert_eq!(wallet.balance, 100);
}

/// Approving an unknown request id is a not-found error
#[sqlx::test]
async fn test_approve_unknown_request(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let ghost = Uuid::new_v4();

    let result = db.approval_service.approve(ghost, Uuid::new_v4()).await;
    assert!(matches!(result, Err(AppError::RequestNotFound(id)) if id == ghost));
}

/// Rejection requires a non-empty reason and never touches the wallet
#[sqlx::test]
async fn test_reject_requires_reason(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let user = create_test_user(&db, "alice@example.com").await;
    let request = create_pending_request(&db, user.id, RequestType::Deposit, 500).await;

    for reason in ["", "   "] {
        let result = db
            .approval_service
            .reject(request.id, Uuid::new_v4(), reason)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    let request = db
        .funds_request_repo
        .find_by_id(request.id)
        .await
        .expect("Failed to fetch request")
        .expect("Request should exist");
    assert_eq!(request.status, RequestStatus::Pending);
}

/// Rejection terminates the request and blocks later transitions
#[sqlx::test]
async fn test_reject_then_terminal_guards(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let user = create_test_user(&db, "alice@example.com").await;
    let request = create_pending_request(&db, user.id, RequestType::Withdrawal, 500).await;
    let admin = Uuid::new_v4();

    let rejected = db
        .approval_service
        .reject(request.id, admin, "Unverified bank account")
        .await
        .expect("Rejection failed");

    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(rejected.reason.as_deref(), Some("Unverified bank account"));
    assert_eq!(rejected.approved_by, Some(admin));
    assert!(rejected.approved_at.is_some());

    // No wallet was created, let alone mutated
    assert!(db
        .wallet_repo
        .find_by_user(user.id)
        .await
        .expect("Failed to fetch wallet")
        .is_none());

    // Terminal requests refuse both transitions
    let result = db.approval_service.approve(request.id, admin).await;
    assert!(matches!(
        result,
        Err(AppError::RequestNotPending {
            status: RequestStatus::Rejected,
            ..
        })
    ));

    let result = db.approval_service.reject(request.id, admin, "again").await;
    assert!(matches!(result, Err(AppError::RequestNotPending { .. })));
}

/// Rejection reasons are bounded per request type
#[sqlx::test]
async fn test_reject_reason_length_bound(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let user = create_test_user(&db, "alice@example.com").await;
    let request = create_pending_request(&db, user.id, RequestType::Deposit, 500).await;

    let result = db
        .approval_service
        .reject(request.id, Uuid::new_v4(), &"x".repeat(256))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    db.approval_service
        .reject(request.id, Uuid::new_v4(), &"x".repeat(255))
        .await
        .expect("Rejection at the bound should succeed");
}

/// N concurrent approvals of one request: exactly one wins, funds move once
#[sqlx::test]
async fn test_concurrent_approval_exactly_once(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let user = create_test_user(&db, "alice@example.com").await;
    let request = create_pending_request(&db, user.id, RequestType::Deposit, 500).await;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let service = db.approval_service.clone();
        let request_id = request.id;
        handles.push(tokio::spawn(async move {
            service.approve(request_id, Uuid::new_v4()).await
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.expect("Task panicked") {
            Ok(_) => successes += 1,
            Err(AppError::RequestNotPending { .. }) => conflicts += 1,
            Err(e) => panic!("Unexpected error: {}", e),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 3);

    // The balance moved by exactly one unit of the requested amount
    let wallet = db
        .wallet_repo
        .find_by_user(user.id)
        .await
        .expect("Failed to fetch wallet")
        .expect("Wallet should exist");
    assert_eq!(wallet.balance, 500);

    let ledger_sum = db
        .wallet_service
        .ledger_balance(user.id)
        .await
        .expect("Failed to sum ledger");
    assert_eq!(ledger_sum, 500);
}

// =============================================================================
// FundsRequest read models
// =============================================================================

/// The stored USD display value is a pure function of the SPY amount
#[sqlx::test]
async fn test_conversion_consistency_on_create(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let user = create_test_user(&db, "alice@example.com").await;

    for amount_spy in [1, 55, 110, 5500, 1_234_567] {
        let request = create_pending_request(&db, user.id, RequestType::Deposit, amount_spy).await;
        assert_eq!(request.amount_usd, currency::spy_to_usd(amount_spy));
        assert_eq!(request.amount_spy, amount_spy);
    }

    // Spot-check the documented ratio
    let request = create_pending_request(&db, user.id, RequestType::Withdrawal, 5500).await;
    assert_eq!(request.amount_usd, Decimal::new(5000, 2));
}

/// Listing filters by status and searches the owner's email
#[sqlx::test]
async fn test_list_requests_filtering_and_pagination(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let alice = create_test_user(&db, "alice@example.com").await;
    let bob = create_test_user(&db, "bob@example.com").await;

    for _ in 0..3 {
        create_pending_request(&db, alice.id, RequestType::Deposit, 1000).await;
    }
    let bob_request = create_pending_request(&db, bob.id, RequestType::Withdrawal, 2000).await;

    // Terminal requests drop out of the pending view
    seed_wallet(&db, bob.id, 5000).await;
    db.approval_service
        .approve(bob_request.id, Uuid::new_v4())
        .await
        .expect("Approval failed");

    let pending = RequestFilter {
        status: Some(RequestStatus::Pending),
        search: None,
    };
    let items = db
        .funds_request_repo
        .list(&pending, Page::default())
        .await
        .expect("List failed");
    assert_eq!(items.len(), 3);
    assert_eq!(
        db.funds_request_repo.count(&pending).await.expect("Count failed"),
        3
    );

    let approved = RequestFilter {
        status: Some(RequestStatus::Approved),
        search: None,
    };
    let items = db
        .funds_request_repo
        .list(&approved, Page::default())
        .await
        .expect("List failed");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, bob_request.id);

    // Email search is a case-insensitive substring match
    let search = RequestFilter {
        status: None,
        search: Some("ALICE".to_string()),
    };
    assert_eq!(
        db.funds_request_repo.count(&search).await.expect("Count failed"),
        3
    );

    // Pagination caps the page size
    let all = RequestFilter::default();
    let first_page = db
        .funds_request_repo
        .list(&all, Page::new(Some(1), Some(2)))
        .await
        .expect("List failed");
    assert_eq!(first_page.len(), 2);
    assert_eq!(
        db.funds_request_repo.count(&all).await.expect("Count failed"),
        4
    );
}
