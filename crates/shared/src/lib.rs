//! Shared types and configuration for Centime.
//!
//! This crate provides common types used across all other crates:
//! - Configuration management
//! - JWT claims and token handling
//! - Auth endpoint payloads

pub mod auth;
pub mod config;
pub mod jwt;

pub use auth::{
    AuthResponse, Claims, ForgotPasswordRequest, LoginRequest, RefreshRequest, RegisterRequest,
    TokenKind, TokenPair, UserInfo,
};
pub use config::AppConfig;
pub use jwt::{JwtConfig, JwtError, JwtService};
