//! `SeaORM` entity definitions.

pub mod categories;
pub mod expenses;
pub mod incomes;
pub mod sea_orm_active_enums;
pub mod users;
pub mod wallets;
