//! Wallet repository for database operations.
//!
//! A wallet's balance is never written directly. It moves through income
//! reconciliation deltas and wallet-to-wallet transfers, applied here as
//! atomic in-place increments so concurrent writers cannot lose updates.

use futures::future::join_all;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use centime_core::balance::{WalletDelta, has_sufficient_balance, transfer_deltas};

use crate::entities::{expenses, wallets};

/// Icon assigned when a create request omits one.
const DEFAULT_ICON: &str = "💼";

/// Color assigned when a create request omits one.
const DEFAULT_COLOR: &str = "#3b82f6";

/// Error types for wallet operations.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// Wallet not found or not owned by the caller.
    #[error("Wallet not found: {0}")]
    NotFound(Uuid),

    /// Wallet name already exists for this user.
    #[error("Wallet '{0}' already exists")]
    DuplicateName(String),

    /// Transfer source and destination are the same wallet.
    #[error("Cannot transfer to the same wallet")]
    SameWallet,

    /// Transfer amount exceeds the source wallet balance.
    #[error("Insufficient balance: {available} available, {requested} requested")]
    InsufficientBalance {
        /// Balance currently in the source wallet.
        available: Decimal,
        /// Amount the transfer asked for.
        requested: Decimal,
    },

    /// Cannot delete a wallet that expenses still reference.
    #[error("Cannot delete wallet: {0} expenses reference it")]
    HasExpenses(u64),

    /// Reorder request referenced wallets the caller does not own.
    #[error("Some wallets were not found")]
    MissingWallets,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a wallet.
#[derive(Debug, Clone)]
pub struct CreateWalletInput {
    /// Owning user.
    pub user_id: Uuid,
    /// Wallet name, unique per user.
    pub name: String,
    /// Display icon.
    pub icon: Option<String>,
    /// Display color.
    pub color: Option<String>,
    /// Whether the wallet counts toward the total balance.
    pub included_in_total: Option<bool>,
}

/// Input for updating a wallet.
///
/// Balance and position are never patched here: balance moves through
/// incomes and transfers, position through [`WalletRepository::reorder_wallets`].
#[derive(Debug, Clone, Default)]
pub struct UpdateWalletInput {
    /// New name.
    pub name: Option<String>,
    /// New icon.
    pub icon: Option<String>,
    /// New color.
    pub color: Option<String>,
    /// New inclusion flag for the total balance.
    pub included_in_total: Option<bool>,
}

/// One wallet position in a reorder request.
#[derive(Debug, Clone, Copy)]
pub struct WalletPosition {
    /// Wallet to move.
    pub id: Uuid,
    /// New position in the user's wallet list.
    pub sort_order: i32,
}

/// Wallet repository for CRUD operations, transfers, and ordering.
#[derive(Debug, Clone)]
pub struct WalletRepository {
    db: DatabaseConnection,
}

impl WalletRepository {
    /// Creates a new wallet repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a wallet with a zero balance at the end of the user's list.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already taken or the database
    /// operation fails.
    pub async fn create_wallet(
        &self,
        input: CreateWalletInput,
    ) -> Result<wallets::Model, WalletError> {
        if self.name_taken(input.user_id, &input.name, None).await? {
            return Err(WalletError::DuplicateName(input.name));
        }

        let highest = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(input.user_id))
            .order_by_desc(wallets::Column::SortOrder)
            .one(&self.db)
            .await?;
        let sort_order = next_sort_order(highest.map(|w| w.sort_order));

        let now = chrono::Utc::now().into();
        let wallet = wallets::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            name: Set(input.name),
            balance: Set(Decimal::ZERO),
            icon: Set(input.icon.unwrap_or_else(|| DEFAULT_ICON.to_owned())),
            color: Set(input.color.unwrap_or_else(|| DEFAULT_COLOR.to_owned())),
            included_in_total: Set(input.included_in_total.unwrap_or(true)),
            sort_order: Set(sort_order),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(wallet.insert(&self.db).await?)
    }

    /// Lists the user's wallets ordered by position.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_wallets(&self, user_id: Uuid) -> Result<Vec<wallets::Model>, WalletError> {
        Ok(wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .order_by_asc(wallets::Column::SortOrder)
            .all(&self.db)
            .await?)
    }

    /// Finds a wallet owned by the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the wallet does not exist, belongs to another
    /// user, or the database query fails.
    pub async fn find_wallet(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
    ) -> Result<wallets::Model, WalletError> {
        self.owned_wallet(user_id, wallet_id).await
    }

    /// Updates a wallet's display fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the wallet is not owned by the user, the new
    /// name is already taken, or the database operation fails.
    pub async fn update_wallet(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
        input: UpdateWalletInput,
    ) -> Result<wallets::Model, WalletError> {
        let wallet = self.owned_wallet(user_id, wallet_id).await?;

        if let Some(name) = &input.name
            && *name != wallet.name
            && self.name_taken(user_id, name, Some(wallet_id)).await?
        {
            return Err(WalletError::DuplicateName(name.clone()));
        }

        let mut active: wallets::ActiveModel = wallet.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(icon) = input.icon {
            active.icon = Set(icon);
        }
        if let Some(color) = input.color {
            active.color = Set(color);
        }
        if let Some(included) = input.included_in_total {
            active.included_in_total = Set(included);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a wallet after checking no expenses reference it.
    ///
    /// Incomes linked to the wallet survive with their wallet link cleared;
    /// the money they contributed leaves the books together with the wallet.
    ///
    /// # Errors
    ///
    /// Returns an error if the wallet is not owned by the user, expenses
    /// still reference it, or the database operation fails.
    pub async fn delete_wallet(&self, user_id: Uuid, wallet_id: Uuid) -> Result<(), WalletError> {
        let wallet = self.owned_wallet(user_id, wallet_id).await?;

        let expense_count = expenses::Entity::find()
            .filter(expenses::Column::WalletId.eq(wallet_id))
            .count(&self.db)
            .await?;
        if expense_count > 0 {
            return Err(WalletError::HasExpenses(expense_count));
        }

        wallets::Entity::delete_by_id(wallet.id).exec(&self.db).await?;
        Ok(())
    }

    /// Moves money between two wallets owned by the same user.
    ///
    /// Both legs run in one transaction. No transfer history row is kept;
    /// the two balance changes are the whole record.
    ///
    /// # Errors
    ///
    /// Returns an error if source and destination are the same wallet,
    /// either wallet is not owned by the user, the source balance is
    /// smaller than the amount, or the database operation fails.
    pub async fn transfer(
        &self,
        user_id: Uuid,
        from_wallet_id: Uuid,
        to_wallet_id: Uuid,
        amount: Decimal,
    ) -> Result<(), WalletError> {
        if from_wallet_id == to_wallet_id {
            return Err(WalletError::SameWallet);
        }

        let from = self.owned_wallet(user_id, from_wallet_id).await?;
        let to = self.owned_wallet(user_id, to_wallet_id).await?;

        if !has_sufficient_balance(from.balance, amount) {
            return Err(WalletError::InsufficientBalance {
                available: from.balance,
                requested: amount,
            });
        }

        let txn = self.db.begin().await?;
        apply_wallet_deltas(&txn, &transfer_deltas(from.id, to.id, amount)).await?;
        txn.commit().await?;

        Ok(())
    }

    /// Sums the balances of wallets included in the total.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn total_balance(&self, user_id: Uuid) -> Result<Decimal, WalletError> {
        #[derive(FromQueryResult)]
        struct BalanceSum {
            total: Option<Decimal>,
        }

        let row = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .filter(wallets::Column::IncludedInTotal.eq(true))
            .select_only()
            .column_as(wallets::Column::Balance.sum(), "total")
            .into_model::<BalanceSum>()
            .one(&self.db)
            .await?;

        Ok(row.and_then(|r| r.total).unwrap_or(Decimal::ZERO))
    }

    /// Applies new positions to the user's wallets.
    ///
    /// Ownership of every wallet is checked up front, then each position is
    /// written independently. The writes do not share a transaction, so a
    /// failure can leave earlier positions applied; positions are display
    /// state and the next successful reorder repairs them.
    ///
    /// # Errors
    ///
    /// Returns an error if any wallet is missing or not owned by the user,
    /// or a database operation fails.
    pub async fn reorder_wallets(
        &self,
        user_id: Uuid,
        positions: &[WalletPosition],
    ) -> Result<(), WalletError> {
        let ids: Vec<Uuid> = positions.iter().map(|p| p.id).collect();
        let owned = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .filter(wallets::Column::Id.is_in(ids))
            .count(&self.db)
            .await?;
        if owned != positions.len() as u64 {
            return Err(WalletError::MissingWallets);
        }

        let now = chrono::Utc::now();
        let updates = positions.iter().map(|position| {
            wallets::Entity::update_many()
                .col_expr(
                    wallets::Column::SortOrder,
                    sea_orm::sea_query::Expr::value(position.sort_order),
                )
                .col_expr(
                    wallets::Column::UpdatedAt,
                    sea_orm::sea_query::Expr::value(now),
                )
                .filter(wallets::Column::Id.eq(position.id))
                .exec(&self.db)
        });

        for result in join_all(updates).await {
            result?;
        }

        Ok(())
    }

    async fn owned_wallet(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
    ) -> Result<wallets::Model, WalletError> {
        wallets::Entity::find_by_id(wallet_id)
            .filter(wallets::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(WalletError::NotFound(wallet_id))
    }

    async fn name_taken(
        &self,
        user_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, WalletError> {
        let mut query = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .filter(wallets::Column::Name.eq(name));
        if let Some(id) = exclude {
            query = query.filter(wallets::Column::Id.ne(id));
        }

        Ok(query.count(&self.db).await? > 0)
    }
}

/// Applies balance deltas as atomic in-place increments.
///
/// Generic over the connection so income reconciliation can run the deltas
/// inside the same transaction as the row change that caused them. Zero
/// deltas are skipped so unchanged balances do not dirty the wallet row.
pub(crate) async fn apply_wallet_deltas<C: ConnectionTrait>(
    conn: &C,
    deltas: &[WalletDelta],
) -> Result<(), DbErr> {
    let now = chrono::Utc::now();

    for delta in deltas {
        if delta.delta.is_zero() {
            continue;
        }

        wallets::Entity::update_many()
            .col_expr(
                wallets::Column::Balance,
                sea_orm::sea_query::Expr::col(wallets::Column::Balance).add(delta.delta),
            )
            .col_expr(
                wallets::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(now),
            )
            .filter(wallets::Column::Id.eq(delta.wallet_id))
            .exec(conn)
            .await?;
    }

    Ok(())
}

/// Position assigned to a newly created wallet.
const fn next_sort_order(current_highest: Option<i32>) -> i32 {
    match current_highest {
        Some(order) => order.saturating_add(1),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::next_sort_order;

    #[test]
    fn first_wallet_starts_at_zero() {
        assert_eq!(next_sort_order(None), 0);
    }

    #[test]
    fn new_wallets_append_after_the_highest() {
        assert_eq!(next_sort_order(Some(0)), 1);
        assert_eq!(next_sort_order(Some(7)), 8);
    }

    #[test]
    fn position_saturates_at_the_integer_ceiling() {
        assert_eq!(next_sort_order(Some(i32::MAX)), i32::MAX);
    }
}
