//! Income repository for database operations.
//!
//! Incomes are the money entering the books, and the linked wallet's
//! stored balance is kept equal to the sum of its linked income amounts
//! plus transfers. Every mutation here runs in one transaction with the
//! balance deltas it causes, so the books and the balances never drift.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set, TransactionTrait,
};
use uuid::Uuid;

use centime_core::balance::{
    EntryKind, WalletLink, creation_deltas, deletion_deltas, reconciliation_deltas,
};
use centime_core::period::DateWindow;

use crate::entities::{categories, incomes, sea_orm_active_enums::CategoryType, wallets};
use crate::repositories::entry::{
    CategoryBreakdown, DailyTotal, EntryAnalytics, EntryFilter, EntryWithNames, WalletBreakdown,
};
use crate::repositories::wallet::apply_wallet_deltas;

/// Error types for income operations.
#[derive(Debug, thiserror::Error)]
pub enum IncomeError {
    /// Income not found or not owned by the caller.
    #[error("Income not found: {0}")]
    NotFound(Uuid),

    /// Category missing, not owned by the caller, or not an income category.
    #[error("Income category not found: {0}")]
    CategoryNotFound(Uuid),

    /// Wallet missing or not owned by the caller.
    #[error("Wallet not found: {0}")]
    WalletNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating an income.
#[derive(Debug, Clone)]
pub struct CreateIncomeInput {
    /// Owning user.
    pub user_id: Uuid,
    /// Income category the entry belongs to.
    pub category_id: Uuid,
    /// Wallet the money lands in, if any.
    pub wallet_id: Option<Uuid>,
    /// Amount received (always positive).
    pub amount: Decimal,
    /// Free-form note.
    pub description: Option<String>,
    /// Day the income was received.
    pub date: NaiveDate,
}

/// Input for updating an income.
///
/// `wallet_id` and `description` are double-optional: the outer `None`
/// keeps the current value, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateIncomeInput {
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

/// A joined income row with category and wallet names.
#[derive(FromQueryResult)]
struct IncomeRow {
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

impl From<IncomeRow> for EntryWithNames<incomes::Model> {
    fn from(row: IncomeRow) -> Self {
        Self {
            entry: incomes::Model {
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

/// Income repository for CRUD operations and analytics.
#[derive(Debug, Clone)]
pub struct IncomeRepository {
    db: DatabaseConnection,
}

impl IncomeRepository {
    /// Creates a new income repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records an income and credits the linked wallet.
    ///
    /// The row insert and the balance credit run in one transaction. An
    /// income without a wallet changes no balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is not the caller's income
    /// category, the wallet is not the caller's, or the database
    /// operation fails.
    pub async fn create_income(
        &self,
        input: CreateIncomeInput,
    ) -> Result<EntryWithNames<incomes::Model>, IncomeError> {
        let category = self
            .owned_income_category(input.user_id, input.category_id)
            .await?;

        let wallet = match input.wallet_id {
            Some(wallet_id) => Some(self.owned_wallet(input.user_id, wallet_id).await?),
            None => None,
        };

        let now = chrono::Utc::now().into();
        let income = incomes::ActiveModel {
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

        let txn = self.db.begin().await?;
        let income = income.insert(&txn).await?;
        apply_wallet_deltas(
            &txn,
            &creation_deltas(
                EntryKind::Income,
                WalletLink::new(income.wallet_id, income.amount),
            ),
        )
        .await?;
        txn.commit().await?;

        Ok(EntryWithNames {
            entry: income,
            category_name: category.name,
            wallet_name: wallet.map(|w| w.name),
        })
    }

    /// Lists the user's incomes, newest date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_incomes(
        &self,
        user_id: Uuid,
        filter: EntryFilter,
    ) -> Result<Vec<EntryWithNames<incomes::Model>>, IncomeError> {
        let rows = with_names_query(user_id, filter)
            .order_by_desc(incomes::Column::Date)
            .into_model::<IncomeRow>()
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(EntryWithNames::from).collect())
    }

    /// Finds one income owned by the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the income does not exist, belongs to another
    /// user, or the database query fails.
    pub async fn find_income(
        &self,
        user_id: Uuid,
        income_id: Uuid,
    ) -> Result<EntryWithNames<incomes::Model>, IncomeError> {
        with_names_query(user_id, EntryFilter::default())
            .filter(incomes::Column::Id.eq(income_id))
            .into_model::<IncomeRow>()
            .one(&self.db)
            .await?
            .map(EntryWithNames::from)
            .ok_or(IncomeError::NotFound(income_id))
    }

    /// Updates an income and reconciles the affected wallet balances.
    ///
    /// Staying on the same wallet moves it by the amount difference only.
    /// Changing wallets (including to or from none) gives the old amount
    /// back to the old wallet and credits the new amount to the new one.
    /// Row change and balance deltas share one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the income is not the caller's, a new category
    /// is not the caller's income category, a new wallet is not the
    /// caller's, or the database operation fails.
    pub async fn update_income(
        &self,
        user_id: Uuid,
        income_id: Uuid,
        input: UpdateIncomeInput,
    ) -> Result<EntryWithNames<incomes::Model>, IncomeError> {
        let existing = self.owned_income(user_id, income_id).await?;

        if let Some(category_id) = input.category_id
            && category_id != existing.category_id
        {
            self.owned_income_category(user_id, category_id).await?;
        }

        let new_wallet_id = match input.wallet_id {
            None => existing.wallet_id,
            Some(None) => None,
            Some(Some(wallet_id)) => {
                self.owned_wallet(user_id, wallet_id).await?;
                Some(wallet_id)
            }
        };

        let old_link = WalletLink::new(existing.wallet_id, existing.amount);
        let new_link = WalletLink::new(new_wallet_id, input.amount.unwrap_or(existing.amount));
        let deltas = reconciliation_deltas(EntryKind::Income, old_link, new_link);

        let txn = self.db.begin().await?;
        apply_wallet_deltas(&txn, &deltas).await?;

        let mut active: incomes::ActiveModel = existing.into();
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

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        self.find_income(user_id, updated.id).await
    }

    /// Deletes an income and takes its amount back out of the wallet.
    ///
    /// The wallet may go negative if its money was already spent or
    /// transferred away; negative balances are legal and never clamped.
    ///
    /// # Errors
    ///
    /// Returns an error if the income is not the caller's or the database
    /// operation fails.
    pub async fn delete_income(&self, user_id: Uuid, income_id: Uuid) -> Result<(), IncomeError> {
        let existing = self.owned_income(user_id, income_id).await?;
        let deltas = deletion_deltas(
            EntryKind::Income,
            WalletLink::new(existing.wallet_id, existing.amount),
        );

        let txn = self.db.begin().await?;
        apply_wallet_deltas(&txn, &deltas).await?;
        incomes::Entity::delete_by_id(existing.id).exec(&txn).await?;
        txn.commit().await?;

        Ok(())
    }

    /// Computes totals, per-category and per-wallet breakdowns, and daily
    /// totals for the filtered incomes.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn analytics(
        &self,
        user_id: Uuid,
        filter: EntryFilter,
    ) -> Result<EntryAnalytics, IncomeError> {
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

        let totals = filtered_incomes(user_id, filter)
            .select_only()
            .column_as(incomes::Column::Amount.sum(), "total")
            .column_as(incomes::Column::Id.count(), "count")
            .into_model::<TotalsRow>()
            .one(&self.db)
            .await?;

        let category_rows = filtered_incomes(user_id, filter)
            .join(JoinType::InnerJoin, incomes::Relation::Categories.def())
            .select_only()
            .column(incomes::Column::CategoryId)
            .column_as(categories::Column::Name, "category_name")
            .column_as(incomes::Column::Amount.sum(), "total")
            .column_as(incomes::Column::Id.count(), "count")
            .group_by(incomes::Column::CategoryId)
            .group_by(categories::Column::Name)
            .into_model::<CategoryRow>()
            .all(&self.db)
            .await?;

        let wallet_rows = filtered_incomes(user_id, filter)
            .join(JoinType::LeftJoin, incomes::Relation::Wallets.def())
            .select_only()
            .column(incomes::Column::WalletId)
            .column_as(wallets::Column::Name, "wallet_name")
            .column_as(incomes::Column::Amount.sum(), "total")
            .column_as(incomes::Column::Id.count(), "count")
            .group_by(incomes::Column::WalletId)
            .group_by(wallets::Column::Name)
            .into_model::<WalletRow>()
            .all(&self.db)
            .await?;

        let daily_rows = filtered_incomes(user_id, filter)
            .select_only()
            .column(incomes::Column::Date)
            .column_as(incomes::Column::Amount.sum(), "total")
            .group_by(incomes::Column::Date)
            .order_by_desc(incomes::Column::Date)
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

    /// Sums income amounts inside an inclusive date window.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn total_between(
        &self,
        user_id: Uuid,
        window: DateWindow,
    ) -> Result<Decimal, IncomeError> {
        #[derive(FromQueryResult)]
        struct SumRow {
            total: Option<Decimal>,
        }

        let row = filtered_incomes(user_id, EntryFilter::for_dates(window.start, window.end))
            .select_only()
            .column_as(incomes::Column::Amount.sum(), "total")
            .into_model::<SumRow>()
            .one(&self.db)
            .await?;

        Ok(row.and_then(|r| r.total).unwrap_or(Decimal::ZERO))
    }

    async fn owned_income(
        &self,
        user_id: Uuid,
        income_id: Uuid,
    ) -> Result<incomes::Model, IncomeError> {
        incomes::Entity::find_by_id(income_id)
            .filter(incomes::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(IncomeError::NotFound(income_id))
    }

    async fn owned_income_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<categories::Model, IncomeError> {
        categories::Entity::find_by_id(category_id)
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::CategoryType.eq(CategoryType::Income))
            .one(&self.db)
            .await?
            .ok_or(IncomeError::CategoryNotFound(category_id))
    }

    async fn owned_wallet(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
    ) -> Result<wallets::Model, IncomeError> {
        wallets::Entity::find_by_id(wallet_id)
            .filter(wallets::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(IncomeError::WalletNotFound(wallet_id))
    }
}

/// Base query for the user's incomes with the listing filters applied.
fn filtered_incomes(user_id: Uuid, filter: EntryFilter) -> Select<incomes::Entity> {
    let mut query = incomes::Entity::find().filter(incomes::Column::UserId.eq(user_id));

    if let Some(start) = filter.start_date {
        query = query.filter(incomes::Column::Date.gte(start));
    }
    if let Some(end) = filter.end_date {
        query = query.filter(incomes::Column::Date.lte(end));
    }
    if let Some(category_id) = filter.category_id {
        query = query.filter(incomes::Column::CategoryId.eq(category_id));
    }
    if let Some(wallet_id) = filter.wallet_id {
        query = query.filter(incomes::Column::WalletId.eq(wallet_id));
    }

    query
}

/// Filtered incomes joined to category and wallet names.
fn with_names_query(user_id: Uuid, filter: EntryFilter) -> Select<incomes::Entity> {
    filtered_incomes(user_id, filter)
        .join(JoinType::InnerJoin, incomes::Relation::Categories.def())
        .join(JoinType::LeftJoin, incomes::Relation::Wallets.def())
        .column_as(categories::Column::Name, "category_name")
        .column_as(wallets::Column::Name, "wallet_name")
}
