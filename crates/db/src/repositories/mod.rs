//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod category;
pub mod entry;
pub mod expense;
pub mod income;
pub mod user;
pub mod wallet;

pub use category::{
    CategoryError, CategoryRepository, CategoryWithRelations, CreateCategoryInput,
    UpdateCategoryInput,
};
pub use entry::{
    CategoryBreakdown, DailyTotal, EntryAnalytics, EntryFilter, EntryWithNames, WalletBreakdown,
};
pub use expense::{CreateExpenseInput, ExpenseError, ExpenseRepository, UpdateExpenseInput};
pub use income::{CreateIncomeInput, IncomeError, IncomeRepository, UpdateIncomeInput};
pub use user::UserRepository;
pub use wallet::{
    CreateWalletInput, UpdateWalletInput, WalletError, WalletPosition, WalletRepository,
};
