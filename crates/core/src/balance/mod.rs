//! Wallet balance reconciliation arithmetic.
//!
//! A wallet's stored `balance` is an eagerly-materialized aggregate: at all
//! times it must equal the sum of income amounts currently linked to the
//! wallet, plus transfers in, minus transfers out. This module computes the
//! per-wallet adjustments each mutation must apply; the persistence layer
//! applies them inside a single store transaction.
//!
//! Expenses are recorded for reporting only and never move a balance, so
//! every expense mutation reconciles to zero adjustments.

pub mod reconcile;

#[cfg(test)]
mod props;

pub use reconcile::{
    EntryKind, WalletDelta, WalletLink, creation_deltas, deletion_deltas, has_sufficient_balance,
    reconciliation_deltas, transfer_deltas,
};
