//! Core business logic for Centime.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `auth` - Password hashing
//! - `balance` - Wallet balance reconciliation arithmetic
//! - `category` - Default category tree (embedded data asset)
//! - `period` - Calendar windows for daily/weekly/monthly totals

pub mod auth;
pub mod balance;
pub mod category;
pub mod period;
