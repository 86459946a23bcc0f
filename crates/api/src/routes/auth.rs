//! Authentication routes for register, login, token refresh, and password
//! reset requests.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use centime_core::auth::{hash_password, verify_password};
use centime_db::{CategoryRepository, UserRepository};
use centime_shared::auth::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, RefreshRequest, RegisterRequest, TokenPair,
    UserInfo,
};

use crate::AppState;

/// Password length bounds enforced at registration.
const PASSWORD_MIN: usize = 6;
const PASSWORD_MAX: usize = 50;

/// Display name length bounds enforced at registration.
const NAME_MIN: usize = 2;
const NAME_MAX: usize = 100;

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/forgot-password", post(forgot_password))
}

/// POST /auth/register - Create an account, seed its default categories,
/// and return tokens.
#[allow(clippy::too_many_lines)]
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    if let Err(response) = validate_register(&payload) {
        return response;
    }

    let user_repo = UserRepository::new((*state.db).clone());

    match user_repo.email_exists(&payload.email).await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "email_exists",
                    "message": "An account with this email already exists"
                })),
            )
                .into_response();
        }
        Ok(false) => {}
        Err(e) => {
            error!(error = %e, "Database error checking email");
            return internal_error("An error occurred during registration");
        }
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return internal_error("An error occurred during registration");
        }
    };

    let user = match user_repo
        .create(&payload.email, &password_hash, &payload.name)
        .await
    {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "Failed to create user");
            return internal_error("An error occurred during registration");
        }
    };

    // Every account starts with the default category tree.
    let category_repo = CategoryRepository::new((*state.db).clone());
    if let Err(e) = category_repo.seed_defaults(user.id).await {
        error!(error = %e, user_id = %user.id, "Failed to seed default categories");
        return internal_error("An error occurred during registration");
    }

    let tokens = match issue_tokens(&state, user.id, &user.email) {
        Ok(t) => t,
        Err(response) => return response,
    };

    info!(user_id = %user.id, email = %user.email, "New user registered");

    let response = AuthResponse {
        user: UserInfo {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: Some(user.created_at),
        },
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
    };

    (
        StatusCode::CREATED,
        Json(json!({
            "message": "Registration successful",
            "data": response,
        })),
    )
        .into_response()
}

/// POST /auth/login - Authenticate a user and return tokens.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    let user = match user_repo.find_by_email(&payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            info!(email = %payload.email, "Login attempt for unknown email");
            return invalid_credentials();
        }
        Err(e) => {
            error!(error = %e, "Database error during login");
            return internal_error("An error occurred during login");
        }
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            info!(user_id = %user.id, "Failed login attempt");
            return invalid_credentials();
        }
        Err(e) => {
            error!(error = %e, "Password verification error");
            return internal_error("An error occurred during login");
        }
    }

    let tokens = match issue_tokens(&state, user.id, &user.email) {
        Ok(t) => t,
        Err(response) => return response,
    };

    info!(user_id = %user.id, "User logged in");

    let response = AuthResponse {
        user: UserInfo {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: None,
        },
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
    };

    (
        StatusCode::OK,
        Json(json!({
            "message": "Login successful",
            "data": response,
        })),
    )
        .into_response()
}

/// POST /auth/refresh - Exchange a refresh token for a fresh pair.
async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> impl IntoResponse {
    let claims = match state
        .jwt_service
        .validate_refresh_token(&payload.refresh_token)
    {
        Ok(c) => c,
        Err(e) => {
            let (error, message) = match e {
                centime_shared::JwtError::Expired => {
                    ("token_expired", "Refresh token has expired")
                }
                _ => ("invalid_token", "Invalid refresh token"),
            };
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": error, "message": message })),
            )
                .into_response();
        }
    };

    // The account may have been deleted since the token was issued.
    let user_repo = UserRepository::new((*state.db).clone());
    let user = match user_repo.find_by_id(claims.user_id()).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "user_not_found",
                    "message": "User not found"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error during token refresh");
            return internal_error("An error occurred during token refresh");
        }
    };

    let tokens = match issue_tokens(&state, user.id, &user.email) {
        Ok(t) => t,
        Err(response) => return response,
    };

    info!(user_id = %user.id, "Tokens refreshed");

    (
        StatusCode::OK,
        Json(json!({
            "message": "Token refreshed successfully",
            "data": tokens,
        })),
    )
        .into_response()
}

/// POST /auth/forgot-password - Accept a password reset request.
///
/// The response is identical whether or not the email exists.
async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    match user_repo.find_by_email(&payload.email).await {
        Ok(Some(user)) => {
            info!(user_id = %user.id, "Password reset requested");
        }
        Ok(None) => {
            info!("Password reset requested for unknown email");
        }
        Err(e) => {
            error!(error = %e, "Database error during password reset request");
            return internal_error("An error occurred");
        }
    }

    (
        StatusCode::OK,
        Json(json!({
            "message": "If the email exists, password reset instructions have been sent"
        })),
    )
        .into_response()
}

/// Generates an access and refresh token pair for a user.
fn issue_tokens(state: &AppState, user_id: Uuid, email: &str) -> Result<TokenPair, Response> {
    let access_token = state
        .jwt_service
        .generate_access_token(user_id, email)
        .map_err(|e| {
            error!(error = %e, "Failed to generate access token");
            internal_error("An error occurred while issuing tokens")
        })?;

    let refresh_token = state
        .jwt_service
        .generate_refresh_token(user_id, email)
        .map_err(|e| {
            error!(error = %e, "Failed to generate refresh token");
            internal_error("An error occurred while issuing tokens")
        })?;

    Ok(TokenPair::new(
        access_token,
        refresh_token,
        state.jwt_service.access_token_expires_in(),
    ))
}

/// Checks registration fields against the limits the web client mirrors.
fn validate_register(payload: &RegisterRequest) -> Result<(), Response> {
    if !is_plausible_email(&payload.email) {
        return Err(validation_error("A valid email address is required"));
    }

    let password_len = payload.password.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&password_len) {
        return Err(validation_error(
            "Password must be between 6 and 50 characters",
        ));
    }

    let name_len = payload.name.chars().count();
    if !(NAME_MIN..=NAME_MAX).contains(&name_len) {
        return Err(validation_error("Name must be between 2 and 100 characters"));
    }

    Ok(())
}

/// Loose structural email check: one `@` with a dotted domain after it.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@')
}

/// Identical response for unknown email and wrong password, so the two
/// cases cannot be told apart from the outside.
fn invalid_credentials() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "invalid_credentials",
            "message": "Invalid email or password"
        })),
    )
        .into_response()
}

/// Shared 400 response for request validation failures.
fn validation_error(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "validation_error", "message": message })),
    )
        .into_response()
}

/// Shared 500 response for unexpected failures.
fn internal_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal_error", "message": message })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("user@example.com", true)]
    #[case("a@b.co", true)]
    #[case("no-at-sign.example.com", false)]
    #[case("@example.com", false)]
    #[case("user@nodot", false)]
    #[case("user@.example.com", false)]
    #[case("user@example.com.", false)]
    #[case("user@ex@ample.com", false)]
    fn test_email_plausibility(#[case] email: &str, #[case] expected: bool) {
        assert_eq!(is_plausible_email(email), expected);
    }

    #[rstest]
    #[case("12345", false)]
    #[case("123456", true)]
    #[case("a-perfectly-ordinary-password", true)]
    fn test_password_bounds(#[case] password: &str, #[case] ok: bool) {
        let payload = RegisterRequest {
            email: "user@example.com".to_string(),
            password: password.to_string(),
            name: "User".to_string(),
        };
        assert_eq!(validate_register(&payload).is_ok(), ok);
    }

    #[test]
    fn test_single_character_name_rejected() {
        let payload = RegisterRequest {
            email: "user@example.com".to_string(),
            password: "123456".to_string(),
            name: "U".to_string(),
        };
        assert!(validate_register(&payload).is_err());
    }
}
