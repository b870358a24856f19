// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Row types returned by a metadata source.
//!
//! Each struct mirrors one record of the corresponding bulk metadata query.
//! Fields are kept loosely typed (strings, optional numerics) on purpose:
//! the catalog model, not the adapter, decides what to drop, group or
//! resolve. Builder-style `with_*` methods exist mostly for fixtures and
//! adapter code; plain struct literals are fine too.

use serde::{Deserialize, Serialize};

use crate::kinds::{
    CascadeRule, Deferability, IndexKind, ProcedureColumnRole, ProcedureKind, SortDirection,
};

/// General capability information reported once per connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Product name as reported by the backend (e.g. "PostgreSQL").
    pub product_name: String,
    /// Product version string.
    pub product_version: String,
    /// Name of the driver the adapter wraps.
    pub driver_name: String,
}

impl SourceInfo {
    pub fn new(product_name: impl Into<String>, product_version: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            product_version: product_version.into(),
            driver_name: String::new(),
        }
    }

    pub fn with_driver_name(mut self, driver_name: impl Into<String>) -> Self {
        self.driver_name = driver_name.into();
        self
    }
}

/// One row of a schema enumeration.
///
/// The catalog field is advisory; several backends return schemas with no
/// catalog, or with a catalog that differs from the one queried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRow {
    pub catalog: Option<String>,
    pub schema: String,
}

impl SchemaRow {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            catalog: None,
            schema: schema.into(),
        }
    }

    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }
}

/// One row of a table enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub name: String,
    /// Backend-specific kind label ("TABLE", "VIEW", "SYSTEM TABLE", ...).
    pub kind: Option<String>,
    pub remarks: Option<String>,
    pub type_name: Option<String>,
    pub type_catalog: Option<String>,
    pub type_schema: Option<String>,
}

impl TableRow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            remarks: None,
            type_name: None,
            type_catalog: None,
            type_schema: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }
}

/// One row of a column enumeration. Carries the owning table name so bulk
/// scans over a whole container can be grouped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRow {
    pub table: String,
    pub name: String,
    pub type_name: String,
    /// Numeric type code as reported by the backend.
    pub value_type: i32,
    /// 1-based position within the table, as reported (never re-sequenced).
    pub ordinal: u32,
    pub size: Option<u64>,
    pub char_length: Option<u64>,
    pub scale: Option<i32>,
    pub precision: Option<i32>,
    pub radix: Option<i32>,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub remarks: Option<String>,
    pub auto_increment: bool,
}

impl ColumnRow {
    pub fn new(
        table: impl Into<String>,
        name: impl Into<String>,
        type_name: impl Into<String>,
        ordinal: u32,
    ) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            type_name: type_name.into(),
            value_type: 0,
            ordinal,
            size: None,
            char_length: None,
            scale: None,
            precision: None,
            radix: None,
            nullable: true,
            default_value: None,
            remarks: None,
            auto_increment: false,
        }
    }

    pub fn with_value_type(mut self, value_type: i32) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }
}

/// One row of an index enumeration: one record per index *column*, several
/// rows sharing an index name describe one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRow {
    pub table: String,
    pub index: String,
    pub unique: bool,
    pub qualifier: Option<String>,
    pub kind: IndexKind,
    /// 1-based position of the column within the index.
    pub ordinal: u32,
    pub column: String,
    pub direction: SortDirection,
}

impl IndexRow {
    pub fn new(table: impl Into<String>, index: impl Into<String>, ordinal: u32, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            index: index.into(),
            unique: false,
            qualifier: None,
            kind: IndexKind::Other,
            ordinal,
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_kind(mut self, kind: IndexKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn descending(mut self) -> Self {
        self.direction = SortDirection::Descending;
        self
    }
}

/// One row of a primary-key enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyRow {
    pub column: String,
    /// 1-based position of the column within the key.
    pub key_seq: u32,
    /// Key name; backends may omit it.
    pub pk_name: Option<String>,
}

impl PrimaryKeyRow {
    pub fn new(column: impl Into<String>, key_seq: u32) -> Self {
        Self {
            column: column.into(),
            key_seq,
            pk_name: None,
        }
    }

    pub fn with_name(mut self, pk_name: impl Into<String>) -> Self {
        self.pk_name = Some(pk_name.into());
        self
    }
}

/// One row of an imported/exported key enumeration. The referenced
/// ("primary") side may live in a different catalog or schema than the
/// referencing ("foreign") side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRow {
    pub pk_table_catalog: Option<String>,
    pub pk_table_schema: Option<String>,
    pub pk_table: String,
    pub pk_column: String,
    pub fk_table_catalog: Option<String>,
    pub fk_table_schema: Option<String>,
    pub fk_table: String,
    pub fk_column: String,
    /// 1-based position of the column pair within the key.
    pub key_seq: u32,
    pub update_rule: CascadeRule,
    pub delete_rule: CascadeRule,
    pub fk_name: Option<String>,
    pub pk_name: Option<String>,
    pub deferability: Deferability,
}

impl ForeignKeyRow {
    pub fn new(
        pk_table: impl Into<String>,
        pk_column: impl Into<String>,
        fk_table: impl Into<String>,
        fk_column: impl Into<String>,
        key_seq: u32,
    ) -> Self {
        Self {
            pk_table_catalog: None,
            pk_table_schema: None,
            pk_table: pk_table.into(),
            pk_column: pk_column.into(),
            fk_table_catalog: None,
            fk_table_schema: None,
            fk_table: fk_table.into(),
            fk_column: fk_column.into(),
            key_seq,
            update_rule: CascadeRule::NoAction,
            delete_rule: CascadeRule::NoAction,
            fk_name: None,
            pk_name: None,
            deferability: Deferability::NotDeferrable,
        }
    }

    pub fn with_fk_name(mut self, fk_name: impl Into<String>) -> Self {
        self.fk_name = Some(fk_name.into());
        self
    }

    pub fn with_pk_name(mut self, pk_name: impl Into<String>) -> Self {
        self.pk_name = Some(pk_name.into());
        self
    }

    pub fn with_pk_scope(
        mut self,
        catalog: Option<impl Into<String>>,
        schema: Option<impl Into<String>>,
    ) -> Self {
        self.pk_table_catalog = catalog.map(Into::into);
        self.pk_table_schema = schema.map(Into::into);
        self
    }

    pub fn with_delete_rule(mut self, rule: CascadeRule) -> Self {
        self.delete_rule = rule;
        self
    }

    pub fn with_update_rule(mut self, rule: CascadeRule) -> Self {
        self.update_rule = rule;
        self
    }
}

/// One row of a procedure enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureRow {
    pub name: String,
    pub kind: ProcedureKind,
    pub remarks: Option<String>,
}

impl ProcedureRow {
    pub fn new(name: impl Into<String>, kind: ProcedureKind) -> Self {
        Self {
            name: name.into(),
            kind,
            remarks: None,
        }
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }
}

/// One row of a procedure-column enumeration, carrying the owning procedure
/// name for grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureColumnRow {
    pub procedure: String,
    pub name: String,
    pub role: ProcedureColumnRole,
    pub type_name: String,
    pub value_type: i32,
    pub ordinal: u32,
    pub size: Option<u64>,
    pub scale: Option<i32>,
    pub precision: Option<i32>,
    pub radix: Option<i32>,
    pub nullable: bool,
    pub remarks: Option<String>,
}

impl ProcedureColumnRow {
    pub fn new(
        procedure: impl Into<String>,
        name: impl Into<String>,
        role: ProcedureColumnRole,
        ordinal: u32,
    ) -> Self {
        Self {
            procedure: procedure.into(),
            name: name.into(),
            role,
            type_name: String::new(),
            value_type: 0,
            ordinal,
            size: None,
            scale: None,
            precision: None,
            radix: None,
            nullable: true,
            remarks: None,
        }
    }

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_row_builder() {
        let row = TableRow::new("users")
            .with_kind("TABLE")
            .with_remarks("accounts");
        assert_eq!(row.name, "users");
        assert_eq!(row.kind.as_deref(), Some("TABLE"));
        assert_eq!(row.remarks.as_deref(), Some("accounts"));
    }

    #[test]
    fn test_column_row_defaults() {
        let row = ColumnRow::new("users", "id", "BIGINT", 1).not_null().auto_increment();
        assert!(!row.nullable);
        assert!(row.auto_increment);
        assert_eq!(row.ordinal, 1);
        assert!(row.size.is_none());
    }

    #[test]
    fn test_foreign_key_row_scope() {
        let row = ForeignKeyRow::new("users", "id", "orders", "user_id", 1)
            .with_pk_scope(Some("db1"), None::<String>)
            .with_fk_name("fk_orders_user");
        assert_eq!(row.pk_table_catalog.as_deref(), Some("db1"));
        assert!(row.pk_table_schema.is_none());
        assert_eq!(row.fk_name.as_deref(), Some("fk_orders_user"));
    }

    #[test]
    fn test_row_serialization_roundtrip() {
        let row = IndexRow::new("t", "idx", 1, "a").unique().descending();
        let json = serde_json::to_string(&row).unwrap();
        let back: IndexRow = serde_json::from_str(&json).unwrap();
        assert_eq!(row, back);
    }
}
