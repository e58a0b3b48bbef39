//! Raw column metadata as reported by an engine.
//!
//! This struct preserves what the engine reports for a result column.
//! The cursor derives a `Column` from it, applying name folding.

use crate::engine::constants::SQL_NULLABLE_FLAG;

/// Raw column metadata reported by an engine.
///
/// Use `Column` for the user-facing descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    /// Column name as reported by the engine.
    pub name: String,
    /// Alias from the SELECT list (`SELECT col AS alias`), empty if none.
    pub alias: String,
    /// Owning relation, empty for expressions.
    pub relation: String,
    /// Type code, nullable bit cleared.
    pub type_code: u16,
    /// BLOB subtype (0 binary, 1 text); 0 for other types.
    pub subtype: i16,
    /// Number of fractional digits for fixed-point columns.
    pub scale: i16,
    /// Declared length in bytes.
    pub length: u32,
    /// Whether NULL values are allowed.
    pub nullable: bool,
}

impl ColumnMetadata {
    /// Create new column metadata with minimal info.
    pub fn new(name: impl Into<String>, type_code: u16) -> Self {
        Self {
            name: name.into(),
            alias: String::new(),
            relation: String::new(),
            type_code,
            subtype: 0,
            scale: 0,
            length: 0,
            nullable: true,
        }
    }

    /// Create metadata from a raw `sqltype`, splitting off the nullable bit.
    pub fn from_sqltype(name: impl Into<String>, sqltype: u16) -> Self {
        let mut meta = Self::new(name, sqltype & !SQL_NULLABLE_FLAG);
        meta.nullable = sqltype & SQL_NULLABLE_FLAG != 0;
        meta
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = relation.into();
        self
    }

    pub fn with_subtype(mut self, subtype: i16) -> Self {
        self.subtype = subtype;
        self
    }

    pub fn with_scale(mut self, scale: i16) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// The name shown to callers: the alias if present, else the column name.
    pub fn display_name(&self) -> &str {
        if self.alias.is_empty() {
            &self.name
        } else {
            &self.alias
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::constants::SQL_LONG;

    #[test]
    fn test_from_sqltype_splits_nullable_bit() {
        let meta = ColumnMetadata::from_sqltype("I", SQL_LONG + 1);
        assert_eq!(meta.type_code, SQL_LONG);
        assert!(meta.nullable);

        let meta = ColumnMetadata::from_sqltype("ID", SQL_LONG);
        assert_eq!(meta.type_code, SQL_LONG);
        assert!(!meta.nullable);
    }

    #[test]
    fn test_display_name_prefers_alias() {
        let meta = ColumnMetadata::new("RDB$DESCRIPTION", SQL_LONG);
        assert_eq!(meta.display_name(), "RDB$DESCRIPTION");
        assert_eq!(meta.with_alias("DES").display_name(), "DES");
    }
}
