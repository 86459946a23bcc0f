//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod auth;
pub mod categories;
mod entries;
pub mod expenses;
pub mod health;
pub mod incomes;
pub mod users;
pub mod wallets;

/// Creates the API router: public health and auth routes, plus the
/// resource routes behind the authentication middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(users::routes())
        .merge(wallets::routes())
        .merge(categories::routes())
        .merge(incomes::routes())
        .merge(expenses::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}

/// Deserializes a PATCH field that distinguishes "absent" from "null".
///
/// Tag `Option<Option<T>>` fields with
/// `#[serde(default, deserialize_with = "double_option")]`: a missing key
/// stays `None`, an explicit `null` becomes `Some(None)`, and a value
/// becomes `Some(Some(value))`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}
