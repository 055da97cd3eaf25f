//! Request middleware.

pub mod auth;

pub use auth::{AuthUser, INIT_DATA_HEADER, telegram_auth_middleware};
