//! Persistence layer: libSQL-backed storage for lead records.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{LeadRecord, LeadStore, NewLead};
