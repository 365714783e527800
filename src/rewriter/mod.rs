//! Token-level statement rewriting: schema definitions, data insertions,
//! the keyword de-collision table, and the anomaly recovery policy.

pub mod data;
pub mod keywords;
pub mod recover;
pub mod schema;

pub use data::{DataRewrite, TableCatalog};
pub use recover::{Anomaly, AnomalyCounts, RecoveryGuard};
pub use schema::{SchemaRewrite, TableDefinition};
