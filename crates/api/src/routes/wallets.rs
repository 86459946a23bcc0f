//! Wallet routes: CRUD, transfers, the aggregate balance, and manual
//! ordering.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use centime_db::repositories::{
    CreateWalletInput, UpdateWalletInput, WalletError, WalletPosition, WalletRepository,
};
use centime_db::entities::wallets;

use crate::AppState;
use crate::middleware::AuthUser;

/// Smallest accepted monetary amount.
const MIN_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Creates the wallet routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallets", post(create_wallet).get(list_wallets))
        .route("/wallets/total-balance", get(total_balance))
        .route("/wallets/transfer", post(transfer))
        .route("/wallets/reorder", post(reorder))
        .route(
            "/wallets/{id}",
            get(get_wallet).patch(update_wallet).delete(delete_wallet),
        )
}

/// Request body for creating a wallet.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateWalletRequest {
    name: String,
    icon: Option<String>,
    color: Option<String>,
    included_in_total: Option<bool>,
}

/// Request body for updating a wallet's display fields. Balance moves
/// through incomes and transfers, position through the reorder endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateWalletRequest {
    name: Option<String>,
    icon: Option<String>,
    color: Option<String>,
    included_in_total: Option<bool>,
}

/// Request body for transferring between wallets.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferRequest {
    from_wallet_id: Uuid,
    to_wallet_id: Uuid,
    amount: Decimal,
}

/// One wallet position in a reorder request.
#[derive(Debug, Deserialize)]
struct WalletOrderItem {
    id: Uuid,
    order: i32,
}

/// Request body for reordering wallets.
#[derive(Debug, Deserialize)]
struct ReorderRequest {
    wallets: Vec<WalletOrderItem>,
}

/// Wallet payload returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WalletResponse {
    id: Uuid,
    user_id: Uuid,
    name: String,
    balance: Decimal,
    icon: String,
    color: String,
    included_in_total: bool,
    order: i32,
    created_at: DateTime<FixedOffset>,
    updated_at: DateTime<FixedOffset>,
}

impl From<wallets::Model> for WalletResponse {
    fn from(model: wallets::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            balance: model.balance,
            icon: model.icon,
            color: model.color,
            included_in_total: model.included_in_total,
            order: model.sort_order,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// POST /wallets - Create a wallet with a zero starting balance.
async fn create_wallet(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateWalletRequest>,
) -> impl IntoResponse {
    let repo = WalletRepository::new((*state.db).clone());

    let input = CreateWalletInput {
        user_id: auth.user_id(),
        name: payload.name,
        icon: payload.icon,
        color: payload.color,
        included_in_total: payload.included_in_total,
    };

    match repo.create_wallet(input).await {
        Ok(wallet) => {
            info!(user_id = %auth.user_id(), wallet_id = %wallet.id, "Wallet created");
            (
                StatusCode::CREATED,
                Json(json!({
                    "message": "Wallet created successfully",
                    "data": WalletResponse::from(wallet),
                })),
            )
                .into_response()
        }
        Err(e) => wallet_error_response(e),
    }
}

/// GET /wallets - List the user's wallets in display order.
async fn list_wallets(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = WalletRepository::new((*state.db).clone());

    match repo.list_wallets(auth.user_id()).await {
        Ok(wallets) => {
            let data: Vec<WalletResponse> =
                wallets.into_iter().map(WalletResponse::from).collect();
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Wallets retrieved successfully",
                    "data": data,
                })),
            )
                .into_response()
        }
        Err(e) => wallet_error_response(e),
    }
}

/// GET /wallets/total-balance - Sum of balances across wallets that are
/// included in the total.
async fn total_balance(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = WalletRepository::new((*state.db).clone());

    match repo.total_balance(auth.user_id()).await {
        Ok(total) => (
            StatusCode::OK,
            Json(json!({
                "message": "Total balance retrieved successfully",
                "data": { "totalBalance": total },
            })),
        )
            .into_response(),
        Err(e) => wallet_error_response(e),
    }
}

/// GET /wallets/{id} - Fetch one wallet.
async fn get_wallet(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = WalletRepository::new((*state.db).clone());

    match repo.find_wallet(auth.user_id(), id).await {
        Ok(wallet) => (
            StatusCode::OK,
            Json(json!({
                "message": "Wallet retrieved successfully",
                "data": WalletResponse::from(wallet),
            })),
        )
            .into_response(),
        Err(e) => wallet_error_response(e),
    }
}

/// PATCH /wallets/{id} - Update a wallet's display fields.
async fn update_wallet(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWalletRequest>,
) -> impl IntoResponse {
    let repo = WalletRepository::new((*state.db).clone());

    let input = UpdateWalletInput {
        name: payload.name,
        icon: payload.icon,
        color: payload.color,
        included_in_total: payload.included_in_total,
    };

    match repo.update_wallet(auth.user_id(), id, input).await {
        Ok(wallet) => (
            StatusCode::OK,
            Json(json!({
                "message": "Wallet updated successfully",
                "data": WalletResponse::from(wallet),
            })),
        )
            .into_response(),
        Err(e) => wallet_error_response(e),
    }
}

/// DELETE /wallets/{id} - Delete a wallet that no expenses reference.
async fn delete_wallet(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = WalletRepository::new((*state.db).clone());

    match repo.delete_wallet(auth.user_id(), id).await {
        Ok(()) => {
            info!(user_id = %auth.user_id(), wallet_id = %id, "Wallet deleted");
            (
                StatusCode::OK,
                Json(json!({ "message": "Wallet deleted successfully" })),
            )
                .into_response()
        }
        Err(e) => wallet_error_response(e),
    }
}

/// POST /wallets/transfer - Move money between two wallets atomically.
async fn transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<TransferRequest>,
) -> impl IntoResponse {
    if payload.amount < MIN_AMOUNT {
        return validation_error("Amount must be at least 0.01");
    }

    let repo = WalletRepository::new((*state.db).clone());

    match repo
        .transfer(
            auth.user_id(),
            payload.from_wallet_id,
            payload.to_wallet_id,
            payload.amount,
        )
        .await
    {
        Ok(()) => {
            info!(
                user_id = %auth.user_id(),
                from = %payload.from_wallet_id,
                to = %payload.to_wallet_id,
                amount = %payload.amount,
                "Wallet transfer completed"
            );
            (
                StatusCode::OK,
                Json(json!({ "message": "Transfer completed successfully" })),
            )
                .into_response()
        }
        Err(e) => wallet_error_response(e),
    }
}

/// POST /wallets/reorder - Apply new display positions to the user's
/// wallets.
async fn reorder(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ReorderRequest>,
) -> impl IntoResponse {
    let positions: Vec<WalletPosition> = payload
        .wallets
        .into_iter()
        .map(|item| WalletPosition {
            id: item.id,
            sort_order: item.order,
        })
        .collect();

    let repo = WalletRepository::new((*state.db).clone());

    match repo.reorder_wallets(auth.user_id(), &positions).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Wallets reordered successfully" })),
        )
            .into_response(),
        Err(e) => wallet_error_response(e),
    }
}

/// Maps wallet repository errors onto HTTP responses.
fn wallet_error_response(err: WalletError) -> Response {
    let (status, code, message) = match err {
        WalletError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            "wallet_not_found",
            "Wallet not found".to_string(),
        ),
        WalletError::DuplicateName(name) => (
            StatusCode::CONFLICT,
            "duplicate_name",
            format!("A wallet named '{name}' already exists"),
        ),
        WalletError::SameWallet => (
            StatusCode::BAD_REQUEST,
            "same_wallet",
            "Cannot transfer within the same wallet".to_string(),
        ),
        WalletError::InsufficientBalance { .. } => (
            StatusCode::BAD_REQUEST,
            "insufficient_balance",
            "Insufficient balance in the source wallet".to_string(),
        ),
        WalletError::HasExpenses(count) => (
            StatusCode::CONFLICT,
            "wallet_in_use",
            format!("Cannot delete wallet: {count} expenses still reference it"),
        ),
        WalletError::MissingWallets => (
            StatusCode::NOT_FOUND,
            "wallet_not_found",
            "Some wallets were not found".to_string(),
        ),
        WalletError::Database(e) => {
            error!(error = %e, "Database error in wallet operation");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An error occurred".to_string(),
            )
        }
    };

    (status, Json(json!({ "error": code, "message": message }))).into_response()
}

/// Shared 400 response for request validation failures.
fn validation_error(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "validation_error", "message": message })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_wallet() -> wallets::Model {
        let now = chrono::Utc::now().fixed_offset();
        wallets::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Cash".to_string(),
            balance: Decimal::new(15_075, 2),
            icon: "💼".to_string(),
            color: "#3b82f6".to_string(),
            included_in_total: true,
            sort_order: 3,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_response_exposes_sort_order_as_order() {
        let wallet = sample_wallet();
        let response = WalletResponse::from(wallet);
        assert_eq!(response.order, 3);

        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["order"], 3);
        assert!(json.get("sortOrder").is_none());
        assert!(json.get("includedInTotal").is_some());
    }

    #[test]
    fn test_reorder_request_shape() {
        let body = r#"{"wallets":[{"id":"7f2c1c1e-55a9-4ba9-9df0-2d2b3d0cfa01","order":2}]}"#;
        let request: ReorderRequest = serde_json::from_str(body).expect("deserialize");
        assert_eq!(request.wallets.len(), 1);
        assert_eq!(request.wallets[0].order, 2);
    }

    #[test]
    fn test_min_amount_is_one_cent() {
        assert_eq!(MIN_AMOUNT, Decimal::new(1, 2));
    }
}
