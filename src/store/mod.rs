//! Persistent dedup store for forwarded post ids.

pub mod libsql_store;
pub mod traits;

pub use libsql_store::LibSqlStore;
pub use traits::DedupStore;
