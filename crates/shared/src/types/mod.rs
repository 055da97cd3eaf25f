//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::UserId;
pub use money::{CurrencyCode, InvalidCurrencyCode, MONEY_SCALE, round_money};
pub use pagination::PageRequest;
