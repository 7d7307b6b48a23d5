use crate::error::{AppError, AppResult};
use crate::models::{FundsRequest, LedgerEntry, Page, RequestFilter, RequestStatus};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_LEDGER_LIMIT: i64 = 50;
const MAX_LEDGER_LIMIT: i64 = 500;

/// Extract the acting admin's identity from the `x-admin-id` header
fn admin_id(headers: &HeaderMap) -> AppResult<Uuid> {
    let raw = headers
        .get("x-admin-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing x-admin-id header".to_string()))?;

    Ok(Uuid::parse_str(raw)?)
}

/// Liveness probe including database reachability
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let db_healthy = sqlx::query("SELECT 1")
        .execute(state.database.pool())
        .await
        .is_ok();

    Json(json!({
        "status": if db_healthy { "ok" } else { "degraded" },
        "database": db_healthy,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListRequestsQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct RequestListResponse {
    pub items: Vec<FundsRequest>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// List funds requests for the moderation screens
pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRequestsQuery>,
) -> AppResult<Json<RequestListResponse>> {
    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => Some(RequestStatus::from_str(raw).ok_or_else(|| {
            AppError::Validation(format!("Unknown status filter: {}", raw))
        })?),
    };

    let filter = RequestFilter {
        status,
        search: query.search.filter(|s| !s.trim().is_empty()),
    };
    let page = Page::new(query.page, query.per_page);

    let items = state.funds_request_repo.list(&filter, page).await?;
    let total = state.funds_request_repo.count(&filter).await?;

    Ok(Json(RequestListResponse {
        items,
        page: page.page(),
        per_page: page.per_page(),
        total,
    }))
}

/// Fetch a single funds request
pub async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<FundsRequest>> {
    let request = state
        .funds_request_repo
        .find_by_id(id)
        .await?
        .ok_or(AppError::RequestNotFound(id))?;

    Ok(Json(request))
}

/// Approve a pending funds request
pub async fn approve_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> AppResult<Json<FundsRequest>> {
    let admin = admin_id(&headers)?;
    let request = state.approval_service.approve(id, admin).await?;
    Ok(Json(request))
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
    pub reason: String,
}

/// Reject a pending funds request with a mandatory reason
pub async fn reject_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<RejectBody>,
) -> AppResult<Json<FundsRequest>> {
    let admin = admin_id(&headers)?;
    let request = state.approval_service.reject(id, admin, &body.reason).await?;
    Ok(Json(request))
}

#[derive(Debug, Serialize)]
pub struct WalletResponse {
    pub user_id: Uuid,
    pub balance_spy: i64,
    pub balance_usd: Decimal,
}

/// Fetch a user's wallet. A user whose wallet has not been created yet is
/// reported with a zero balance, since wallets are created lazily.
pub async fn get_wallet(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<WalletResponse>> {
    state
        .user_repo
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    let response = match state.wallet_repo.find_by_user(user_id).await? {
        Some(wallet) => WalletResponse {
            user_id: wallet.user_id,
            balance_spy: wallet.balance,
            balance_usd: wallet.balance_usd(),
        },
        None => WalletResponse {
            user_id,
            balance_spy: 0,
            balance_usd: crate::currency::spy_to_usd(0),
        },
    };

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    pub limit: Option<i64>,
}

/// Most recent ledger entries for a user's wallet
pub async fn get_ledger(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<LedgerQuery>,
) -> AppResult<Json<Vec<LedgerEntry>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LEDGER_LIMIT)
        .clamp(1, MAX_LEDGER_LIMIT);

    let entries = state.wallet_repo.ledger_for_user(user_id, limit).await?;
    Ok(Json(entries))
}
