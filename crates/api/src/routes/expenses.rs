//! Expense routes: CRUD over spending entries, date, category and wallet
//! filters, and aggregate analytics.
//!
//! Expenses never move money. The wallet link is a reporting label only,
//! so no handler here changes a wallet balance.

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
    CreateExpenseInput, ExpenseError, ExpenseRepository, UpdateExpenseInput,
};

use crate::AppState;
use crate::middleware::AuthUser;
use crate::routes::double_option;
use crate::routes::entries::{
    AnalyticsResponse, EntryQuery, EntryResponse, MIN_AMOUNT, parse_wallet_ref,
};

/// Creates the expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", post(create_expense).get(list_expenses))
        .route("/expenses/analytics", get(analytics))
        .route("/expenses/daily/{date}", get(daily_total))
        .route("/expenses/weekly/{start_date}", get(weekly_total))
        .route("/expenses/monthly/{year}/{month}", get(monthly_total))
        .route(
            "/expenses/{id}",
            get(get_expense).patch(update_expense).delete(delete_expense),
        )
}

/// Request body for recording an expense.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateExpenseRequest {
    amount: Decimal,
    category_id: Uuid,
    description: Option<String>,
    date: NaiveDate,
    /// Wallet reference as sent by clients; empty means "no wallet".
    wallet_id: Option<String>,
}

/// Request body for updating an expense.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateExpenseRequest {
    amount: Option<Decimal>,
    category_id: Option<Uuid>,
    #[serde(default, deserialize_with = "double_option")]
    description: Option<Option<String>>,
    date: Option<NaiveDate>,
    /// Absent keeps the wallet, `null` or an empty string detaches it.
    #[serde(default, deserialize_with = "double_option")]
    wallet_id: Option<Option<String>>,
}

/// POST /expenses - Record an expense. Wallet balances are unchanged.
async fn create_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateExpenseRequest>,
) -> impl IntoResponse {
    if payload.amount < MIN_AMOUNT {
        return validation_error("Amount must be at least 0.01");
    }

    let wallet_id = match parse_wallet_ref(payload.wallet_id) {
        Ok(wallet_id) => wallet_id,
        Err(response) => return response,
    };

    let repo = ExpenseRepository::new((*state.db).clone());

    let input = CreateExpenseInput {
        user_id: auth.user_id(),
        category_id: payload.category_id,
        wallet_id,
        amount: payload.amount,
        description: payload.description,
        date: payload.date,
    };

    match repo.create_expense(input).await {
        Ok(expense) => {
            info!(user_id = %auth.user_id(), expense_id = %expense.entry.id, "Expense recorded");
            (
                StatusCode::CREATED,
                Json(json!({
                    "message": "Expense created successfully",
                    "data": EntryResponse::from(expense),
                })),
            )
                .into_response()
        }
        Err(e) => expense_error_response(e),
    }
}

/// GET /expenses - List expenses, newest date first.
async fn list_expenses(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<EntryQuery>,
) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());

    match repo.list_expenses(auth.user_id(), query.into_filter()).await {
        Ok(expenses) => {
            let data: Vec<EntryResponse> =
                expenses.into_iter().map(EntryResponse::from).collect();
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Expenses retrieved successfully",
                    "data": data,
                })),
            )
                .into_response()
        }
        Err(e) => expense_error_response(e),
    }
}

/// GET /expenses/analytics - Aggregate totals, per-category and
/// per-wallet breakdowns, and the last 30 active days.
async fn analytics(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<EntryQuery>,
) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());

    match repo.analytics(auth.user_id(), query.into_filter()).await {
        Ok(analytics) => (
            StatusCode::OK,
            Json(json!({
                "message": "Analytics retrieved successfully",
                "data": AnalyticsResponse::from(analytics),
            })),
        )
            .into_response(),
        Err(e) => expense_error_response(e),
    }
}

/// GET /expenses/daily/{date} - Total spent on one day.
async fn daily_total(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(date): Path<NaiveDate>,
) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());
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
        Err(e) => expense_error_response(e),
    }
}

/// GET /expenses/weekly/{start_date} - Total for the seven days starting
/// at the given date.
async fn weekly_total(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(start_date): Path<NaiveDate>,
) -> impl IntoResponse {
    let Some(window) = week_window(start_date) else {
        return validation_error("Invalid start date");
    };

    let repo = ExpenseRepository::new((*state.db).clone());

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
        Err(e) => expense_error_response(e),
    }
}

/// GET /expenses/monthly/{year}/{month} - Total for one calendar month.
async fn monthly_total(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((year, month)): Path<(i32, u32)>,
) -> impl IntoResponse {
    let Some(window) = month_window(year, month) else {
        return validation_error("Invalid year or month");
    };

    let repo = ExpenseRepository::new((*state.db).clone());

    match repo.total_between(auth.user_id(), window).await {
        Ok(total) => (
            StatusCode::OK,
            Json(json!({
                "message": "Monthly total retrieved successfully",
                "data": { "year": year, "month": month, "total": total },
            })),
        )
            .into_response(),
        Err(e) => expense_error_response(e),
    }
}

/// GET /expenses/{id} - Fetch one expense.
async fn get_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());

    match repo.find_expense(auth.user_id(), id).await {
        Ok(expense) => (
            StatusCode::OK,
            Json(json!({
                "message": "Expense retrieved successfully",
                "data": EntryResponse::from(expense),
            })),
        )
            .into_response(),
        Err(e) => expense_error_response(e),
    }
}

/// PATCH /expenses/{id} - Update an expense. Wallet balances are
/// unchanged even when the amount or wallet link changes.
async fn update_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateExpenseRequest>,
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

    let repo = ExpenseRepository::new((*state.db).clone());

    let input = UpdateExpenseInput {
        category_id: payload.category_id,
        wallet_id,
        amount: payload.amount,
        description: payload.description,
        date: payload.date,
    };

    match repo.update_expense(auth.user_id(), id, input).await {
        Ok(expense) => {
            info!(user_id = %auth.user_id(), expense_id = %id, "Expense updated");
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Expense updated successfully",
                    "data": EntryResponse::from(expense),
                })),
            )
                .into_response()
        }
        Err(e) => expense_error_response(e),
    }
}

/// DELETE /expenses/{id} - Delete an expense.
async fn delete_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());

    match repo.delete_expense(auth.user_id(), id).await {
        Ok(()) => {
            info!(user_id = %auth.user_id(), expense_id = %id, "Expense deleted");
            (
                StatusCode::OK,
                Json(json!({ "message": "Expense deleted successfully" })),
            )
                .into_response()
        }
        Err(e) => expense_error_response(e),
    }
}

/// Maps expense repository errors onto HTTP responses.
fn expense_error_response(err: ExpenseError) -> Response {
    let (status, code, message) = match err {
        ExpenseError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            "expense_not_found",
            "Expense not found",
        ),
        ExpenseError::CategoryNotFound(_) => (
            StatusCode::NOT_FOUND,
            "category_not_found",
            "Expense category not found",
        ),
        ExpenseError::WalletNotFound(_) => (
            StatusCode::NOT_FOUND,
            "wallet_not_found",
            "Wallet not found",
        ),
        ExpenseError::Database(e) => {
            error!(error = %e, "Database error in expense operation");
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
    fn test_amount_accepts_string_and_number() {
        let from_string: CreateExpenseRequest = serde_json::from_str(
            r#"{"amount":"50.25","categoryId":"7f2c1c1e-55a9-4ba9-9df0-2d2b3d0cfa01","date":"2026-02-01"}"#,
        )
        .expect("deserialize");
        let from_number: CreateExpenseRequest = serde_json::from_str(
            r#"{"amount":50.25,"categoryId":"7f2c1c1e-55a9-4ba9-9df0-2d2b3d0cfa01","date":"2026-02-01"}"#,
        )
        .expect("deserialize");

        assert_eq!(from_string.amount, Decimal::new(5025, 2));
        assert_eq!(from_number.amount, Decimal::new(5025, 2));
    }

    #[test]
    fn test_update_request_clears_description() {
        let untouched: UpdateExpenseRequest =
            serde_json::from_str(r"{}").expect("deserialize");
        assert!(untouched.description.is_none());

        let cleared: UpdateExpenseRequest =
            serde_json::from_str(r#"{"description":null}"#).expect("deserialize");
        assert_eq!(cleared.description, Some(None));
    }
}
