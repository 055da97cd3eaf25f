//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod analytics;
pub mod category;
pub mod recalculation;
pub mod transaction;
pub mod user;

pub use analytics::{AnalyticsRepository, TOP_EXPENSES_LIMIT};
pub use category::{CategoryError, CategoryRepository};
pub use recalculation::SeaRecalculationStore;
pub use transaction::{
    NewTransaction, TransactionError, TransactionPatch, TransactionRepository, TransactionView,
};
pub use user::{ResetSummary, UserRepository};
