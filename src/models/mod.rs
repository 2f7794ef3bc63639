pub mod summary;
pub mod transaction;

pub use summary::Summary;
pub use transaction::{DerivedRow, TransactionRow};
