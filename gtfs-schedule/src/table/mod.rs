//! Table parser: CSV bytes to typed rows, checked against a per-table schema.

mod reader;
mod row;
pub mod schema;

pub use reader::TableReader;
pub use row::{FieldValue, Row};
pub use schema::{FieldSpec, FieldType, KNOWN_TABLES, TableSchema};
