//! Income routes: CRUD that keeps wallet balances reconciled, date,
//! category and wallet filters, and aggregate analytics.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use centime_core::period::{DateWindow, month_window, week_window};
use centime_db::repositories::{
    CreateIncomeInput, IncomeError, IncomeRepository, UpdateIncomeInput,
};

use crate::AppState;
use crate::middleware::AuthUser;
use crate::routes::double_option;
use crate::routes::entries::{
    AnalyticsResponse, EntryQuery, EntryResponse, MIN_AMOUNT, parse_wallet_ref,
};

/// Creates the income routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/incomes", post(create_income).get(list_incomes))
        .route("/incomes/analytics", get(analytics))
        .route("/incomes/daily/{date}", get(daily_total))
        .route("/incomes/weekly/{start_date}", get(weekly_total))
        .route("/incomes/monthly/{year}/{month}", get(monthly_total))
        .route(
            "/incomes/{id}",
            get(get_income).patch(update_income).delete(delete_income),
        )
}

/// Request body for recording an income.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateIncomeRequest {
    amount: Decimal,
    category_id: Uuid,
    description: Option<String>,
    date: NaiveDate,
    /// Wallet reference as sent by clients; empty means "no wallet".
    wallet_id: Option<String>,
}

/// Request body for updating an income.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateIncomeRequest {
    amount: Option<Decimal>,
    category_id: Option<Uuid>,
    #[serde(default, deserialize_with = "double_option")]
    description: Option<Option<String>>,
    date: Option<NaiveDate>,
    /// Absent keeps the wallet, `null` or an empty string detaches it.
    #[serde(default, deserialize_with = "double_option")]
    wallet_id: Option<Option<String>>,
}

/// POST /incomes - Record an income and credit the linked wallet.
async fn create_income(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateIncomeRequest>,
) -> impl IntoResponse {
    if payload.amount < MIN_AMOUNT {
        return validation_error("Amount must be at least 0.01");
    }

    let wallet_id = match parse_wallet_ref(payload.wallet_id) {
        Ok(wallet_id) => wallet_id,
        Err(response) => return response,
    };

    let repo = IncomeRepository::new((*state.db).clone());

    let input = CreateIncomeInput {
        user_id: auth.user_id(),
        category_id: payload.category_id,
        wallet_id,
        amount: payload.amount,
        description: payload.description,
        date: payload.date,
    };

    match repo.create_income(input).await {
        Ok(income) => {
            info!(user_id = %auth.user_id(), income_id = %income.entry.id, "Income recorded");
            (
                StatusCode::CREATED,
                Json(json!({
                    "message": "Income created successfully",
                    "data": EntryResponse::from(income),
                })),
            )
                .into_response()
        }
        Err(e) => income_error_response(e),
    }
}

/// GET /incomes - List incomes, newest date first.
async fn list_incomes(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<EntryQuery>,
) -> impl IntoResponse {
    let repo = IncomeRepository::new((*state.db).clone());

    match repo.list_incomes(auth.user_id(), query.into_filter()).await {
        Ok(incomes) => {
            let data: Vec<EntryResponse> =
                incomes.into_iter().map(EntryResponse::from).collect();
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Incomes retrieved successfully",
                    "data": data,
                })),
            )
                .into_response()
        }
        Err(e) => income_error_response(e),
    }
}

/// GET /incomes/analytics - Aggregate totals, per-category and per-wallet
/// breakdowns, and the last 30 active days.
async fn analytics(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<EntryQuery>,
) -> impl IntoResponse {
    let repo = IncomeRepository::new((*state.db).clone());

    match repo.analytics(auth.user_id(), query.into_filter()).await {
        Ok(analytics) => (
            StatusCode::OK,
            Json(json!({
                "message": "Analytics retrieved successfully",
                "data": AnalyticsResponse::from(analytics),
            })),
        )
            .into_response(),
        Err(e) => income_error_response(e),
    }
}

/// GET /incomes/daily/{date} - Total received on one day.
async fn daily_total(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(date): Path<NaiveDate>,
) -> impl IntoResponse {
    let repo = IncomeRepository::new((*state.db).clone());
    let window = DateWindow {
        start: date,
        end: date,
    };

    match repo.total_between(auth.user_id(), window).await {
        Ok(total) => (
            StatusCode::OK,
            Json(json!({
                "message": "Daily total retrieved successfully",
                "data": { "date": date, "total": total },
            })),
        )
            .into_response(),
        Err(e) => income_error_response(e),
    }
}

/// GET /incomes/weekly/{start_date} - Total for the seven days starting
/// at the given date.
async fn weekly_total(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(start_date): Path<NaiveDate>,
) -> impl IntoResponse {
    let Some(window) = week_window(start_date) else {
        return validation_error("Invalid start date");
    };

    let repo = IncomeRepository::new((*state.db).clone());

    match repo.total_between(auth.user_id(), window).await {
        Ok(total) => (
            StatusCode::OK,
            Json(json!({
                "message": "Weekly total retrieved successfully",
                "data": {
                    "startDate": window.start,
                    "endDate": window.end,
                    "total": total,
                },
            })),
        )
            .into_response(),
        Err(e) => income_error_response(e),
    }
}

/// GET /incomes/monthly/{year}/{month} - Total for one calendar month.
async fn monthly_total(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((year, month)): Path<(i32, u32)>,
) -> impl IntoResponse {
    let Some(window) = month_window(year, month) else {
        return validation_error("Invalid year or month");
    };

    let repo = IncomeRepository::new((*state.db).clone());

    match repo.total_between(auth.user_id(), window).await {
        Ok(total) => (
            StatusCode::OK,
            Json(json!({
                "message": "Monthly total retrieved successfully",
                "data": { "year": year, "month": month, "total": total },
            })),
        )
            .into_response(),
        Err(e) => income_error_response(e),
    }
}

/// GET /incomes/{id} - Fetch one income.
async fn get_income(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = IncomeRepository::new((*state.db).clone());

    match repo.find_income(auth.user_id(), id).await {
        Ok(income) => (
            StatusCode::OK,
            Json(json!({
                "message": "Income retrieved successfully",
                "data": EntryResponse::from(income),
            })),
        )
            .into_response(),
        Err(e) => income_error_response(e),
    }
}

/// PATCH /incomes/{id} - Update an income, reconciling wallet balances.
async fn update_income(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateIncomeRequest>,
) -> impl IntoResponse {
    if payload.amount.is_some_and(|amount| amount < MIN_AMOUNT) {
        return validation_error("Amount must be at least 0.01");
    }

    let wallet_id = match payload.wallet_id {
        None => None,
        Some(raw) => match parse_wallet_ref(raw) {
            Ok(wallet_id) => Some(wallet_id),
            Err(response) => return response,
        },
    };

    let repo = IncomeRepository::new((*state.db).clone());

    let input = UpdateIncomeInput {
        category_id: payload.category_id,
        wallet_id,
        amount: payload.amount,
        description: payload.description,
        date: payload.date,
    };

    match repo.update_income(auth.user_id(), id, input).await {
        Ok(income) => {
            info!(user_id = %auth.user_id(), income_id = %id, "Income updated");
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Income updated successfully",
                    "data": EntryResponse::from(income),
                })),
            )
                .into_response()
        }
        Err(e) => income_error_response(e),
    }
}

/// DELETE /incomes/{id} - Delete an income and debit its wallet.
async fn delete_income(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = IncomeRepository::new((*state.db).clone());

    match repo.delete_income(auth.user_id(), id).await {
        Ok(()) => {
            info!(user_id = %auth.user_id(), income_id = %id, "Income deleted");
            (
                StatusCode::OK,
                Json(json!({ "message": "Income deleted successfully" })),
            )
                .into_response()
        }
        Err(e) => income_error_response(e),
    }
}

/// Maps income repository errors onto HTTP responses.
fn income_error_response(err: IncomeError) -> Response {
    let (status, code, message) = match err {
        IncomeError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            "income_not_found",
            "Income not found",
        ),
        IncomeError::CategoryNotFound(_) => (
            StatusCode::NOT_FOUND,
            "category_not_found",
            "Income category not found",
        ),
        IncomeError::WalletNotFound(_) => (
            StatusCode::NOT_FOUND,
            "wallet_not_found",
            "Wallet not found",
        ),
        IncomeError::Database(e) => {
            error!(error = %e, "Database error in income operation");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An error occurred",
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

    #[test]
    fn test_update_request_wallet_states() {
        let keep: UpdateIncomeRequest =
            serde_json::from_str(r#"{"amount":"10.00"}"#).expect("deserialize");
        assert!(keep.wallet_id.is_none());

        let clear: UpdateIncomeRequest =
            serde_json::from_str(r#"{"walletId":null}"#).expect("deserialize");
        assert_eq!(clear.wallet_id, Some(None));

        let set: UpdateIncomeRequest =
            serde_json::from_str(r#"{"walletId":"7f2c1c1e-55a9-4ba9-9df0-2d2b3d0cfa01"}"#)
                .expect("deserialize");
        assert!(matches!(set.wallet_id, Some(Some(_))));
    }

    #[test]
    fn test_create_request_reads_camel_case() {
        let request: CreateIncomeRequest = serde_json::from_str(
            r#"{"amount":"1500.00","categoryId":"7f2c1c1e-55a9-4ba9-9df0-2d2b3d0cfa01","date":"2026-02-01","walletId":""}"#,
        )
        .expect("deserialize");

        assert_eq!(request.amount, Decimal::new(150_000, 2));
        assert_eq!(request.date, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(request.wallet_id.as_deref(), Some(""));
        assert!(request.description.is_none());
    }
}
