//! User profile routes.

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get,
};
use serde_json::json;
use tracing::error;

use centime_db::UserRepository;
use centime_shared::auth::UserInfo;

use crate::AppState;
use crate::middleware::AuthUser;

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/users/me", get(me))
}

/// GET /users/me - Return the authenticated user's profile.
async fn me(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    match user_repo.find_by_id(auth.user_id()).await {
        Ok(Some(user)) => {
            let profile = UserInfo {
                id: user.id,
                email: user.email,
                name: user.name,
                created_at: Some(user.created_at),
            };

            (
                StatusCode::OK,
                Json(json!({
                    "message": "Profile retrieved successfully",
                    "data": profile,
                })),
            )
                .into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "user_not_found",
                "message": "User not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Database error loading profile");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response()
        }
    }
}
