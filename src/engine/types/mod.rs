//! Column, value and row types shared by the cursor and engine bindings.

mod blob;
mod column;
mod metadata;
mod row;
mod sql_type;
mod value;

pub use blob::BlobHandle;
pub use column::{Column, ColumnInfo};
pub use metadata::ColumnMetadata;
pub use row::Row;
pub use sql_type::SqlType;
pub use value::Value;
