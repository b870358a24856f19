// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # dbmeta - Model Layer
//!
//! Pure data types shared by the dbmeta catalog model:
//!
//! - **Row types** ([`rows`]): loosely-typed records as returned by a
//!   [`MetadataSource`] adapter (one struct per metadata query).
//! - **Kind enums** ([`kinds`]): classifications reported by backends
//!   (index kind, procedure kind, cascade rules and so on).
//! - **Entity types** ([`entity`]): the immutable value objects the catalog
//!   model materializes from rows (columns, indexes, keys).
//!
//! Nothing in this crate talks to a database; it is the vocabulary the
//! `dbmeta-core` crate speaks.
//!
//! [`MetadataSource`]: https://docs.rs/dbmeta-core

pub mod entity;
pub mod kinds;
pub mod rows;

pub use entity::{
    Column, ForeignKey, ForeignKeyColumn, Index, IndexColumn, KeyColumn, PrimaryKey,
    ProcedureColumn,
};
pub use kinds::{
    CascadeRule, ConstraintType, Deferability, IndexKind, ProcedureColumnRole, ProcedureKind,
    SortDirection,
};
pub use rows::{
    ColumnRow, ForeignKeyRow, IndexRow, PrimaryKeyRow, ProcedureColumnRow, ProcedureRow,
    SchemaRow, SourceInfo, TableRow,
};

/// Anything addressable by its backend-reported name.
///
/// Lookup is exact-match on the name as the backend returned it; the model
/// never normalizes case.
pub trait Named {
    fn name(&self) -> &str;
}

impl<T: Named> Named for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Find an object by exact name in an enumeration-ordered slice.
pub fn find_named<'a, T: Named>(items: &'a [T], name: &str) -> Option<&'a T> {
    items.iter().find(|item| item.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_find_named_is_case_sensitive() {
        let columns = vec![
            Arc::new(Column::from(rows::ColumnRow::new("t", "Id", "INTEGER", 1))),
            Arc::new(Column::from(rows::ColumnRow::new("t", "id", "INTEGER", 2))),
        ];
        assert_eq!(find_named(&columns, "id").unwrap().ordinal, 2);
        assert_eq!(find_named(&columns, "Id").unwrap().ordinal, 1);
        assert!(find_named(&columns, "ID").is_none());
    }
}
