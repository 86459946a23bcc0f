//! Expense repository for database operations.
//!
//! Expenses mirror incomes structurally but are recorded for reporting
//! only. No operation in this module reads or writes a wallet balance;
//! spending money does not move the stored balance, only income changes
//! and transfers do.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
};
use uuid::Uuid;

use centime_core::period::DateWindow;

use crate::entities::{categories, expenses, sea_orm_active_enums::CategoryType, wallets};
use crate::repositories::entry::{
    CategoryBreakdown, DailyTotal, EntryAnalytics, EntryFilter, EntryWithNames, WalletBreakdown,
};

/// Error types for expense operations.
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    /// Expense not found or not owned by the caller.
    #[error("Expense not found: {0}")]
    NotFound(Uuid),

    /// Category missing, not owned by the caller, or not an expense category.
    #[error("Expense category not found: {0}")]
    CategoryNotFound(Uuid),

    /// Wallet missing or not owned by the caller.
    #[error("Wallet not found: {0}")]
    WalletNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseInput {
    /// Owning user.
    pub user_id: Uuid,
    /// Expense category the entry belongs to.
    pub category_id: Uuid,
    /// Wallet the money notionally left, if any.
    pub wallet_id: Option<Uuid>,
    /// Amount spent (always positive).
    pub amount: Decimal,
    /// Free-form note.
    pub description: Option<String>,
    /// Day the expense occurred.
    pub date: NaiveDate,
}

/// Input for updating an expense.
///
/// `wallet_id` and `description` are double-optional: the outer `None`
/// keeps the current value, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateExpenseInput {
    /// New category.
    pub category_id: Option<Uuid>,
    /// New wallet link.
    pub wallet_id: Option<Option<Uuid>>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New note.
    pub description: Option<Option<String>>,
    /// New date.
    pub date: Option<NaiveDate>,
}

/// A joined expense row with category and wallet names.
#[derive(FromQueryResult)]
struct ExpenseRow {
    id: Uuid,
    user_id: Uuid,
    category_id: Uuid,
    wallet_id: Option<Uuid>,
    amount: Decimal,
    description: Option<String>,
    date: NaiveDate,
    created_at: chrono::DateTime<chrono::FixedOffset>,
    updated_at: chrono::DateTime<chrono::FixedOffset>,
    category_name: String,
    wallet_name: Option<String>,
}

impl From<ExpenseRow> for EntryWithNames<expenses::Model> {
    fn from(row: ExpenseRow) -> Self {
        Self {
            entry: expenses::Model {
                id: row.id,
                user_id: row.user_id,
                category_id: row.category_id,
                wallet_id: row.wallet_id,
                amount: row.amount,
                description: row.description,
                date: row.date,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            category_name: row.category_name,
            wallet_name: row.wallet_name,
        }
    }
}

/// Expense repository for CRUD operations and analytics.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records an expense. The linked wallet's balance is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is not the caller's expense
    /// category, the wallet is not the caller's, or the database
    /// operation fails.
    pub async fn create_expense(
        &self,
        input: CreateExpenseInput,
    ) -> Result<EntryWithNames<expenses::Model>, ExpenseError> {
        let category = self
            .owned_expense_category(input.user_id, input.category_id)
            .await?;

        let wallet = match input.wallet_id {
            Some(wallet_id) => Some(self.owned_wallet(input.user_id, wallet_id).await?),
            None => None,
        };

        let now = chrono::Utc::now().into();
        let expense = expenses::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            category_id: Set(input.category_id),
            wallet_id: Set(input.wallet_id),
            amount: Set(input.amount),
            description: Set(input.description),
            date: Set(input.date),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let expense = expense.insert(&self.db).await?;

        Ok(EntryWithNames {
            entry: expense,
            category_name: category.name,
            wallet_name: wallet.map(|w| w.name),
        })
    }

    /// Lists the user's expenses, newest date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_expenses(
        &self,
        user_id: Uuid,
        filter: EntryFilter,
    ) -> Result<Vec<EntryWithNames<expenses::Model>>, ExpenseError> {
        let rows = with_names_query(user_id, filter)
            .order_by_desc(expenses::Column::Date)
            .into_model::<ExpenseRow>()
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(EntryWithNames::from).collect())
    }

    /// Finds one expense owned by the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the expense does not exist, belongs to another
    /// user, or the database query fails.
    pub async fn find_expense(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
    ) -> Result<EntryWithNames<expenses::Model>, ExpenseError> {
        with_names_query(user_id, EntryFilter::default())
            .filter(expenses::Column::Id.eq(expense_id))
            .into_model::<ExpenseRow>()
            .one(&self.db)
            .await?
            .map(EntryWithNames::from)
            .ok_or(ExpenseError::NotFound(expense_id))
    }

    /// Updates an expense. No wallet balance moves, whatever changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the expense is not the caller's, a new category
    /// is not the caller's expense category, a new wallet is not the
    /// caller's, or the database operation fails.
    pub async fn update_expense(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
        input: UpdateExpenseInput,
    ) -> Result<EntryWithNames<expenses::Model>, ExpenseError> {
        let existing = self.owned_expense(user_id, expense_id).await?;

        if let Some(category_id) = input.category_id
            && category_id != existing.category_id
        {
            self.owned_expense_category(user_id, category_id).await?;
        }

        let new_wallet_id = match input.wallet_id {
            None => existing.wallet_id,
            Some(None) => None,
            Some(Some(wallet_id)) => {
                self.owned_wallet(user_id, wallet_id).await?;
                Some(wallet_id)
            }
        };

        let mut active: expenses::ActiveModel = existing.into();
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if input.wallet_id.is_some() {
            active.wallet_id = Set(new_wallet_id);
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(date) = input.date {
            active.date = Set(date);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        let updated = active.update(&self.db).await?;

        self.find_expense(user_id, updated.id).await
    }

    /// Deletes an expense. The linked wallet's balance is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the expense is not the caller's or the database
    /// operation fails.
    pub async fn delete_expense(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
    ) -> Result<(), ExpenseError> {
        let existing = self.owned_expense(user_id, expense_id).await?;

        expenses::Entity::delete_by_id(existing.id)
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Computes totals, per-category and per-wallet breakdowns, and daily
    /// totals for the filtered expenses.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn analytics(
        &self,
        user_id: Uuid,
        filter: EntryFilter,
    ) -> Result<EntryAnalytics, ExpenseError> {
        #[derive(FromQueryResult)]
        struct TotalsRow {
            total: Option<Decimal>,
            count: i64,
        }

        #[derive(FromQueryResult)]
        struct CategoryRow {
            category_id: Uuid,
            category_name: String,
            total: Option<Decimal>,
            count: i64,
        }

        #[derive(FromQueryResult)]
        struct WalletRow {
            wallet_id: Option<Uuid>,
            wallet_name: Option<String>,
            total: Option<Decimal>,
            count: i64,
        }

        #[derive(FromQueryResult)]
        struct DailyRow {
            date: NaiveDate,
            total: Option<Decimal>,
        }

        let totals = filtered_expenses(user_id, filter)
            .select_only()
            .column_as(expenses::Column::Amount.sum(), "total")
            .column_as(expenses::Column::Id.count(), "count")
            .into_model::<TotalsRow>()
            .one(&self.db)
            .await?;

        let category_rows = filtered_expenses(user_id, filter)
            .join(JoinType::InnerJoin, expenses::Relation::Categories.def())
            .select_only()
            .column(expenses::Column::CategoryId)
            .column_as(categories::Column::Name, "category_name")
            .column_as(expenses::Column::Amount.sum(), "total")
            .column_as(expenses::Column::Id.count(), "count")
            .group_by(expenses::Column::CategoryId)
            .group_by(categories::Column::Name)
            .into_model::<CategoryRow>()
            .all(&self.db)
            .await?;

        let wallet_rows = filtered_expenses(user_id, filter)
            .join(JoinType::LeftJoin, expenses::Relation::Wallets.def())
            .select_only()
            .column(expenses::Column::WalletId)
            .column_as(wallets::Column::Name, "wallet_name")
            .column_as(expenses::Column::Amount.sum(), "total")
            .column_as(expenses::Column::Id.count(), "count")
            .group_by(expenses::Column::WalletId)
            .group_by(wallets::Column::Name)
            .into_model::<WalletRow>()
            .all(&self.db)
            .await?;

        let daily_rows = filtered_expenses(user_id, filter)
            .select_only()
            .column(expenses::Column::Date)
            .column_as(expenses::Column::Amount.sum(), "total")
            .group_by(expenses::Column::Date)
            .order_by_desc(expenses::Column::Date)
            .limit(30)
            .into_model::<DailyRow>()
            .all(&self.db)
            .await?;

        let (total, count) = totals.map_or((Decimal::ZERO, 0), |row| {
            (row.total.unwrap_or(Decimal::ZERO), row.count)
        });

        Ok(EntryAnalytics {
            total,
            count,
            category_breakdown: category_rows
                .into_iter()
                .map(|row| CategoryBreakdown {
                    category_id: row.category_id,
                    category_name: row.category_name,
                    total_amount: row.total.unwrap_or(Decimal::ZERO),
                    count: row.count,
                })
                .collect(),
            wallet_breakdown: wallet_rows
                .into_iter()
                .map(|row| WalletBreakdown {
                    wallet_id: row.wallet_id,
                    wallet_name: row.wallet_name,
                    total_amount: row.total.unwrap_or(Decimal::ZERO),
                    count: row.count,
                })
                .collect(),
            daily_stats: daily_rows
                .into_iter()
                .map(|row| DailyTotal {
                    date: row.date,
                    total: row.total.unwrap_or(Decimal::ZERO),
                })
                .collect(),
        })
    }

    /// Sums expense amounts inside an inclusive date window.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn total_between(
        &self,
        user_id: Uuid,
        window: DateWindow,
    ) -> Result<Decimal, ExpenseError> {
        #[derive(FromQueryResult)]
        struct SumRow {
            total: Option<Decimal>,
        }

        let row = filtered_expenses(user_id, EntryFilter::for_dates(window.start, window.end))
            .select_only()
            .column_as(expenses::Column::Amount.sum(), "total")
            .into_model::<SumRow>()
            .one(&self.db)
            .await?;

        Ok(row.and_then(|r| r.total).unwrap_or(Decimal::ZERO))
    }

    async fn owned_expense(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
    ) -> Result<expenses::Model, ExpenseError> {
        expenses::Entity::find_by_id(expense_id)
            .filter(expenses::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(ExpenseError::NotFound(expense_id))
    }

    async fn owned_expense_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<categories::Model, ExpenseError> {
        categories::Entity::find_by_id(category_id)
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::CategoryType.eq(CategoryType::Expense))
            .one(&self.db)
            .await?
            .ok_or(ExpenseError::CategoryNotFound(category_id))
    }

    async fn owned_wallet(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
    ) -> Result<wallets::Model, ExpenseError> {
        wallets::Entity::find_by_id(wallet_id)
            .filter(wallets::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(ExpenseError::WalletNotFound(wallet_id))
    }
}

/// Base query for the user's expenses with the listing filters applied.
fn filtered_expenses(user_id: Uuid, filter: EntryFilter) -> Select<expenses::Entity> {
    let mut query = expenses::Entity::find().filter(expenses::Column::UserId.eq(user_id));

    if let Some(start) = filter.start_date {
        query = query.filter(expenses::Column::Date.gte(start));
    }
    if let Some(end) = filter.end_date {
        query = query.filter(expenses::Column::Date.lte(end));
    }
    if let Some(category_id) = filter.category_id {
        query = query.filter(expenses::Column::CategoryId.eq(category_id));
    }
    if let Some(wallet_id) = filter.wallet_id {
        query = query.filter(expenses::Column::WalletId.eq(wallet_id));
    }

    query
}

/// Filtered expenses joined to category and wallet names.
fn with_names_query(user_id: Uuid, filter: EntryFilter) -> Select<expenses::Entity> {
    filtered_expenses(user_id, filter)
        .join(JoinType::InnerJoin, expenses::Relation::Categories.def())
        .join(JoinType::LeftJoin, expenses::Relation::Wallets.def())
        .column_as(categories::Column::Name, "category_name")
        .column_as(wallets::Column::Name, "wallet_name")
}
