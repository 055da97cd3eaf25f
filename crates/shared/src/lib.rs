//! Shared types, errors, configuration, and request authentication for Sana.
//!
//! This crate provides common types used across all other crates:
//! - Currency codes and two-digit money rounding
//! - User ids and pagination parameters
//! - Application-wide error types
//! - Configuration management
//! - Telegram Mini App init-data verification

pub mod auth;
pub mod config;
pub mod error;
pub mod types;

pub use auth::{InitDataError, InitDataVerifier, TelegramUser};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
