//! Shared shapes for income and expense listings and analytics.
//!
//! Incomes and expenses carry the same columns and answer the same
//! reporting questions, so both repositories speak these types. Only the
//! balance side effects differ between the two.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Filters applied to entry listings and analytics.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryFilter {
    /// Earliest date to include.
    pub start_date: Option<NaiveDate>,
    /// Latest date to include.
    pub end_date: Option<NaiveDate>,
    /// Restrict to one category.
    pub category_id: Option<Uuid>,
    /// Restrict to one wallet.
    pub wallet_id: Option<Uuid>,
}

impl EntryFilter {
    /// A filter covering exactly the given date window.
    #[must_use]
    pub const fn for_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(end),
            category_id: None,
            wallet_id: None,
        }
    }
}

/// An entry row together with its category and wallet names.
#[derive(Debug, Clone)]
pub struct EntryWithNames<M> {
    /// The entry row.
    pub entry: M,
    /// Name of the entry's category.
    pub category_name: String,
    /// Name of the linked wallet, if any.
    pub wallet_name: Option<String>,
}

/// Aggregates for one category within an analytics window.
#[derive(Debug, Clone)]
pub struct CategoryBreakdown {
    /// Category the entries belong to.
    pub category_id: Uuid,
    /// Category name.
    pub category_name: String,
    /// Sum of entry amounts.
    pub total_amount: Decimal,
    /// Number of entries.
    pub count: i64,
}

/// Aggregates for one wallet within an analytics window.
#[derive(Debug, Clone)]
pub struct WalletBreakdown {
    /// Wallet the entries are booked against, `None` for unlinked entries.
    pub wallet_id: Option<Uuid>,
    /// Wallet name, `None` for the unlinked bucket.
    pub wallet_name: Option<String>,
    /// Sum of entry amounts.
    pub total_amount: Decimal,
    /// Number of entries.
    pub count: i64,
}

/// Total for one calendar day.
#[derive(Debug, Clone, Copy)]
pub struct DailyTotal {
    /// The day.
    pub date: NaiveDate,
    /// Sum of entry amounts on that day.
    pub total: Decimal,
}

/// Analytics over a filtered entry set.
#[derive(Debug, Clone)]
pub struct EntryAnalytics {
    /// Sum of all matching amounts.
    pub total: Decimal,
    /// Number of matching entries.
    pub count: i64,
    /// Per-category aggregates.
    pub category_breakdown: Vec<CategoryBreakdown>,
    /// Per-wallet aggregates.
    pub wallet_breakdown: Vec<WalletBreakdown>,
    /// Per-day totals, most recent day first, capped at 30 days.
    pub daily_stats: Vec<DailyTotal>,
}
