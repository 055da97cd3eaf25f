//! Balance, category summary, and calendar rollups.
//!
//! All amounts here are already expressed in the user's base currency.
//! Time windows are computed in the user's local time (from the browser's
//! `getTimezoneOffset`) and shifted back to UTC for querying.

pub mod period;
pub mod service;
pub mod types;

pub use period::{Period, TimezoneOffset, month_bounds_utc, resolve_transaction_date};
pub use service::AnalyticsService;
pub use types::{
    CalendarReport, CategoryKind, CategoryTotal, DayTotals, InvalidCategoryKind, KindTotals,
};
