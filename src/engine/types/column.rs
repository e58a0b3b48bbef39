//! Column descriptors and the per-statement descriptor registry.
//!
//! Descriptors are derived once from engine `ColumnMetadata` when a
//! statement is opened. Name folding is applied here and nowhere else, so
//! descriptor names, name lookups and row map keys all agree.

use std::collections::HashMap;

use crate::error::Result;

use super::metadata::ColumnMetadata;
use super::sql_type::SqlType;

/// A column in a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Display name: alias or column name, lowercased if folding is on.
    pub name: String,
    /// Alias or column name exactly as reported by the engine.
    pub original_name: String,
    /// Owning relation, empty for expressions.
    pub relation: String,
    /// Raw type code.
    pub type_code: u16,
    /// BLOB subtype.
    pub subtype: i16,
    /// Fractional digits for fixed-point columns.
    pub scale: i16,
    /// Declared length in bytes.
    pub length: u32,
    /// Whether NULL values are allowed.
    pub nullable: bool,
    /// Column data type.
    pub sql_type: SqlType,
}

impl Column {
    /// Create a column from metadata.
    ///
    /// Returns error if the type code is not supported.
    pub fn from_metadata(meta: &ColumnMetadata, lowercase_names: bool) -> Result<Self> {
        let original_name = meta.display_name().to_string();
        let name = if lowercase_names {
            original_name.to_lowercase()
        } else {
            original_name.clone()
        };
        Ok(Self {
            name,
            original_name,
            relation: meta.relation.clone(),
            type_code: meta.type_code,
            subtype: meta.subtype,
            scale: meta.scale,
            length: meta.length,
            nullable: meta.nullable,
            sql_type: SqlType::from_raw(meta.type_code, meta.subtype, meta.scale, meta.length)?,
        })
    }
}

/// Shared column information for all rows in a result set.
#[derive(Debug, Clone, Default)]
pub struct ColumnInfo {
    /// Column definitions, in SELECT-list order.
    pub columns: Vec<Column>,
    /// Display name to position; the last column wins on duplicates.
    by_name: HashMap<String, usize>,
    /// Whether names were folded to lowercase.
    lowercase_names: bool,
}

impl ColumnInfo {
    /// Create new column info from descriptors.
    pub fn new(columns: Vec<Column>, lowercase_names: bool) -> Self {
        let by_name = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Self {
            columns,
            by_name,
            lowercase_names,
        }
    }

    /// Create column info from engine metadata.
    ///
    /// Returns error if any column has an unsupported type.
    pub fn from_metadata(metadata: &[ColumnMetadata], lowercase_names: bool) -> Result<Self> {
        let columns = metadata
            .iter()
            .map(|m| Column::from_metadata(m, lowercase_names))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(columns, lowercase_names))
    }

    /// Get column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Get column by index.
    pub fn get(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Find column index by name.
    ///
    /// Case-sensitive unless names are folded, in which case the probe is
    /// folded too. Returns the last column with that name.
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        if self.lowercase_names {
            self.by_name.get(&name.to_lowercase()).copied()
        } else {
            self.by_name.get(name).copied()
        }
    }

    /// Get column by name.
    pub fn get_by_name(&self, name: &str) -> Option<&Column> {
        self.find_by_name(name).and_then(|i| self.columns.get(i))
    }

    /// Name to descriptor mapping (one entry per distinct name).
    pub fn by_name(&self) -> HashMap<&str, &Column> {
        self.by_name
            .iter()
            .map(|(name, &i)| (name.as_str(), &self.columns[i]))
            .collect()
    }

    /// Whether names were folded to lowercase.
    pub fn lowercase_names(&self) -> bool {
        self.lowercase_names
    }
}
