// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Immutable entity value types.
//!
//! These are the objects the catalog model publishes once a scan completes.
//! They are frozen at publication: an [`Index`] or [`ForeignKey`] is fully
//! assembled (columns resolved, references linked) before anyone can see it.
//! Shared references use [`Arc`] so a column object linked from an index or
//! key is the same object the owning table exposes.

use std::sync::Arc;

use crate::Named;
use crate::kinds::{
    CascadeRule, ConstraintType, Deferability, IndexKind, ProcedureColumnRole, SortDirection,
};
use crate::rows::{ColumnRow, ProcedureColumnRow};

/// A table column. Immutable once attached to its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub type_name: String,
    pub value_type: i32,
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

impl From<ColumnRow> for Column {
    fn from(row: ColumnRow) -> Self {
        Self {
            name: row.name,
            type_name: row.type_name,
            value_type: row.value_type,
            ordinal: row.ordinal,
            size: row.size,
            char_length: row.char_length,
            scale: row.scale,
            precision: row.precision,
            radix: row.radix,
            nullable: row.nullable,
            default_value: row.default_value,
            remarks: row.remarks,
            auto_increment: row.auto_increment,
        }
    }
}

impl Named for Column {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A column of an index, linking back to the owning table's column object.
#[derive(Debug, Clone)]
pub struct IndexColumn {
    pub column: Arc<Column>,
    /// 1-based position within the index, as reported.
    pub ordinal: u32,
    pub direction: SortDirection,
}

/// An index over one table.
#[derive(Debug, Clone)]
pub struct Index {
    /// Name of the owning table.
    pub table: String,
    pub name: String,
    pub unique: bool,
    pub qualifier: Option<String>,
    pub kind: IndexKind,
    /// Ordered as reported by the backend.
    pub columns: Vec<IndexColumn>,
}

impl Named for Index {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A column participating in a unique or primary key.
#[derive(Debug, Clone)]
pub struct KeyColumn {
    pub column: Arc<Column>,
    /// 1-based position within the key.
    pub seq: u32,
}

/// A primary or unique key constraint of one table.
#[derive(Debug, Clone)]
pub struct PrimaryKey {
    /// Name of the owning table.
    pub table: String,
    /// Constraint name; backends may omit it.
    pub name: Option<String>,
    pub constraint_type: ConstraintType,
    pub columns: Vec<KeyColumn>,
}

impl PrimaryKey {
    /// Look up a participating column by name.
    pub fn column(&self, name: &str) -> Option<&KeyColumn> {
        self.columns.iter().find(|kc| kc.column.name == name)
    }
}

impl Named for PrimaryKey {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// One local/referenced column pair of a foreign key.
#[derive(Debug, Clone)]
pub struct ForeignKeyColumn {
    /// Column on the referencing (foreign) side.
    pub column: Arc<Column>,
    /// Column on the referenced (primary) side.
    pub referenced: Arc<Column>,
    /// 1-based position within the key.
    pub seq: u32,
}

/// A foreign key constraint. The referenced key may belong to a table in a
/// different catalog or schema.
#[derive(Debug, Clone)]
pub struct ForeignKey {
    /// Name of the owning (referencing) table.
    pub table: String,
    pub name: Option<String>,
    /// Name of the referenced table.
    pub referenced_table: String,
    /// The unique key this foreign key points at.
    pub referenced_key: Arc<PrimaryKey>,
    pub update_rule: CascadeRule,
    pub delete_rule: CascadeRule,
    pub deferability: Deferability,
    pub columns: Vec<ForeignKeyColumn>,
}

impl Named for ForeignKey {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// A parameter or result column of a procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureColumn {
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

impl From<ProcedureColumnRow> for ProcedureColumn {
    fn from(row: ProcedureColumnRow) -> Self {
        Self {
            name: row.name,
            role: row.role,
            type_name: row.type_name,
            value_type: row.value_type,
            ordinal: row.ordinal,
            size: row.size,
            scale: row.scale,
            precision: row.precision,
            radix: row.radix,
            nullable: row.nullable,
            remarks: row.remarks,
        }
    }
}

impl Named for ProcedureColumn {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::ColumnRow;

    fn column(name: &str, ordinal: u32) -> Arc<Column> {
        Arc::new(Column::from(ColumnRow::new("t", name, "INTEGER", ordinal)))
    }

    #[test]
    fn test_column_from_row_keeps_ordinal() {
        let row = ColumnRow::new("users", "id", "BIGINT", 3).not_null();
        let col = Column::from(row);
        assert_eq!(col.ordinal, 3);
        assert!(!col.nullable);
        assert_eq!(col.type_name, "BIGINT");
    }

    #[test]
    fn test_primary_key_column_lookup() {
        let pk = PrimaryKey {
            table: "t".into(),
            name: Some("pk_t".into()),
            constraint_type: ConstraintType::PrimaryKey,
            columns: vec![
                KeyColumn { column: column("a", 1), seq: 1 },
                KeyColumn { column: column("b", 2), seq: 2 },
            ],
        };
        assert!(pk.column("b").is_some());
        assert!(pk.column("c").is_none());
    }

    #[test]
    fn test_unnamed_key_has_empty_name() {
        let pk = PrimaryKey {
            table: "t".into(),
            name: None,
            constraint_type: ConstraintType::PrimaryKey,
            columns: vec![],
        };
        assert_eq!(pk.name(), "");
    }
}
