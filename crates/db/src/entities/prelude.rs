//! Entity re-exports.

pub use super::categories::Entity as Categories;
pub use super::transactions::Entity as Transactions;
pub use super::users::Entity as Users;
