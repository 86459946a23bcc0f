//! Wire types shared by the income and expense routes.
//!
//! Both entry kinds expose the same filters, the same enriched payload
//! shape, and the same analytics shape, so the serde types live here
//! and each route module maps its own repository results onto them.

use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use centime_db::entities::{expenses, incomes};
use centime_db::repositories::{EntryAnalytics, EntryFilter, EntryWithNames};

/// Smallest accepted monetary amount.
pub(super) const MIN_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Query filters accepted by the list and analytics endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EntryQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category_id: Option<Uuid>,
    pub wallet_id: Option<Uuid>,
}

impl EntryQuery {
    pub(super) fn into_filter(self) -> EntryFilter {
        EntryFilter {
            start_date: self.start_date,
            end_date: self.end_date,
            category_id: self.category_id,
            wallet_id: self.wallet_id,
        }
    }
}

/// Minimal `{id, name}` reference embedded in entry payloads.
#[derive(Debug, Serialize)]
pub(super) struct NamedRef {
    pub id: Uuid,
    pub name: String,
}

/// Entry payload returned to clients, with category and wallet names.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EntryResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub wallet_id: Option<Uuid>,
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub category: NamedRef,
    pub wallet: Option<NamedRef>,
}

macro_rules! entry_response_from {
    ($model:ty) => {
        impl From<EntryWithNames<$model>> for EntryResponse {
            fn from(with: EntryWithNames<$model>) -> Self {
                let EntryWithNames {
                    entry,
                    category_name,
                    wallet_name,
                } = with;

                let wallet = match (entry.wallet_id, wallet_name) {
                    (Some(id), Some(name)) => Some(NamedRef { id, name }),
                    _ => None,
                };

                Self {
                    id: entry.id,
                    user_id: entry.user_id,
                    category_id: entry.category_id,
                    wallet_id: entry.wallet_id,
                    amount: entry.amount,
                    description: entry.description,
                    date: entry.date,
                    created_at: entry.created_at,
                    updated_at: entry.updated_at,
                    category: NamedRef {
                        id: entry.category_id,
                        name: category_name,
                    },
                    wallet,
                }
            }
        }
    };
}

entry_response_from!(incomes::Model);
entry_response_from!(expenses::Model);

/// Aggregate entry statistics for the current filter.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AnalyticsResponse {
    pub total: Decimal,
    pub count: i64,
    pub category_breakdown: Vec<CategoryBreakdownResponse>,
    pub wallet_breakdown: Vec<WalletBreakdownResponse>,
    pub daily_stats: Vec<DailyStatResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CategoryBreakdownResponse {
    pub category_id: Uuid,
    pub category_name: String,
    pub total_amount: Decimal,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WalletBreakdownResponse {
    pub wallet_id: Option<Uuid>,
    /// Wallet name, or `"No wallet"` for entries without one.
    pub wallet_name: String,
    pub total_amount: Decimal,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct DailyStatResponse {
    pub date: NaiveDate,
    pub total: Decimal,
}

impl From<EntryAnalytics> for AnalyticsResponse {
    fn from(analytics: EntryAnalytics) -> Self {
        Self {
            total: analytics.total,
            count: analytics.count,
            category_breakdown: analytics
                .category_breakdown
                .into_iter()
                .map(|row| CategoryBreakdownResponse {
                    category_id: row.category_id,
                    category_name: row.category_name,
                    total_amount: row.total_amount,
                    count: row.count,
                })
                .collect(),
            wallet_breakdown: analytics
                .wallet_breakdown
                .into_iter()
                .map(|row| WalletBreakdownResponse {
                    wallet_id: row.wallet_id,
                    wallet_name: row
                        .wallet_name
                        .unwrap_or_else(|| "No wallet".to_string()),
                    total_amount: row.total_amount,
                    count: row.count,
                })
                .collect(),
            daily_stats: analytics
                .daily_stats
                .into_iter()
                .map(|row| DailyStatResponse {
                    date: row.date,
                    total: row.total,
                })
                .collect(),
        }
    }
}

/// Resolves the wire wallet reference: `None` or an empty string mean no
/// wallet, anything else must be a wallet id.
pub(super) fn parse_wallet_ref(raw: Option<String>) -> Result<Option<Uuid>, Response> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    Uuid::parse_str(trimmed).map(Some).map_err(|_| {
        (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "wallet_not_found",
                "message": "Wallet not found"
            })),
        )
            .into_response()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use centime_db::repositories::WalletBreakdown;
    use rstest::rstest;

    #[rstest]
    #[case(None, Ok(None))]
    #[case(Some(""), Ok(None))]
    #[case(Some("   "), Ok(None))]
    #[case(
        Some("7f2c1c1e-55a9-4ba9-9df0-2d2b3d0cfa01"),
        Ok(Some("7f2c1c1e-55a9-4ba9-9df0-2d2b3d0cfa01"))
    )]
    fn test_wallet_ref_resolution(
        #[case] raw: Option<&str>,
        #[case] expected: Result<Option<&str>, ()>,
    ) {
        let result = parse_wallet_ref(raw.map(str::to_string));
        let expected = expected.map(|inner| inner.map(|s| Uuid::parse_str(s).unwrap()));
        assert_eq!(result.map_err(|_| ()), expected);
    }

    #[test]
    fn test_garbage_wallet_ref_is_not_found() {
        assert!(parse_wallet_ref(Some("not-a-uuid".to_string())).is_err());
    }

    #[test]
    fn test_entry_query_reads_camel_case() {
        let query: EntryQuery = serde_json::from_str(
            r#"{"startDate":"2026-01-01","endDate":"2026-01-31","categoryId":"7f2c1c1e-55a9-4ba9-9df0-2d2b3d0cfa01"}"#,
        )
        .expect("deserialize");

        let filter = query.into_filter();
        assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2026, 1, 1));
        assert_eq!(filter.end_date, NaiveDate::from_ymd_opt(2026, 1, 31));
        assert!(filter.category_id.is_some());
        assert!(filter.wallet_id.is_none());
    }

    #[test]
    fn test_missing_wallet_names_get_a_label() {
        let analytics = EntryAnalytics {
            total: Decimal::new(100, 0),
            count: 1,
            category_breakdown: Vec::new(),
            wallet_breakdown: vec![WalletBreakdown {
                wallet_id: None,
                wallet_name: None,
                total_amount: Decimal::new(100, 0),
                count: 1,
            }],
            daily_stats: Vec::new(),
        };

        let response = AnalyticsResponse::from(analytics);
        assert_eq!(response.wallet_breakdown[0].wallet_name, "No wallet");
    }

    #[test]
    fn test_entry_response_nests_category_and_wallet() {
        let now = chrono::Utc::now().fixed_offset();
        let entry = incomes::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            wallet_id: None,
            amount: Decimal::new(4250, 2),
            description: Some("Invoice".to_string()),
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            created_at: now,
            updated_at: now,
        };
        let category_id = entry.category_id;

        let response = EntryResponse::from(EntryWithNames {
            entry,
            category_name: "Salary".to_string(),
            wallet_name: None,
        });

        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(value["category"]["id"], json!(category_id));
        assert_eq!(value["category"]["name"], "Salary");
        assert!(value["wallet"].is_null());
        assert_eq!(value["amount"], "42.50");
    }
}
