// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Tables and their lazily loaded children
//!
//! A [`Table`] is created from one row of a table enumeration and fills its
//! child collections (columns, indexes, key constraints, foreign keys) on
//! first access, each with a single addressed backend call. Assembled child
//! objects are frozen before publication: a half-built index or key is
//! never observable.
//!
//! Foreign keys resolve their referenced table through the owning data
//! source, so a key may point across catalogs and schemas. Rows whose
//! referenced table or columns cannot be resolved are dropped with a
//! warning rather than failing the whole scan; backends routinely report
//! keys against objects that are filtered out or no longer exist.

use std::sync::{Arc, Weak};

use crate::cache::{ChildSlot, group_rows};
use crate::container::ContainerPath;
use crate::datasource::{DataSourceInner, upgrade};
use crate::error::{MetaError, MetaResult, optional};
use crate::progress::{ProgressMonitor, check_canceled};
use dbmeta_model::entity::{
    Column, ForeignKey, ForeignKeyColumn, Index, IndexColumn, KeyColumn, PrimaryKey,
};
use dbmeta_model::kinds::{ConstraintType, IndexKind};
use dbmeta_model::rows::{ColumnRow, ForeignKeyRow, IndexRow, TableRow};
use dbmeta_model::{Named, find_named};

/// A table or view, with lazily loaded children.
#[derive(Debug)]
pub struct Table {
    datasource: Weak<DataSourceInner>,
    path: ContainerPath,
    name: String,
    kind: Option<String>,
    remarks: Option<String>,
    is_view: bool,
    is_system: bool,
    columns: ChildSlot<Arc<Column>>,
    indexes: ChildSlot<Arc<Index>>,
    constraints: ChildSlot<Arc<PrimaryKey>>,
    foreign_keys: ChildSlot<Arc<ForeignKey>>,
}

impl Table {
    pub(crate) fn from_row(
        datasource: Weak<DataSourceInner>,
        path: ContainerPath,
        row: TableRow,
    ) -> Self {
        let upper = row.kind.as_deref().unwrap_or("").to_ascii_uppercase();
        Self {
            datasource,
            path,
            name: row.name,
            is_view: upper.contains("VIEW"),
            is_system: upper.contains("SYSTEM"),
            kind: row.kind,
            remarks: row.remarks,
            columns: ChildSlot::new(),
            indexes: ChildSlot::new(),
            constraints: ChildSlot::new(),
            foreign_keys: ChildSlot::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backend-specific kind label ("TABLE", "VIEW", "SYSTEM TABLE", ...).
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }

    pub fn is_view(&self) -> bool {
        self.is_view
    }

    pub fn is_system(&self) -> bool {
        self.is_system
    }

    pub fn path(&self) -> &ContainerPath {
        &self.path
    }

    /// Fully qualified dotted name, as far as the container path goes.
    pub fn full_name(&self) -> String {
        let scope = self.path.display();
        if scope.is_empty() {
            self.name.clone()
        } else {
            format!("{scope}.{}", self.name)
        }
    }

    /// Columns in the order the backend reports them.
    pub async fn columns(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Arc<Column>>> {
        if let Some(columns) = self.columns.get() {
            return Ok(columns);
        }
        check_canceled(monitor)?;
        let ds = upgrade(&self.datasource)?;
        let rows = ds
            .source
            .list_columns(
                self.path.catalog.as_deref(),
                self.path.schema.as_deref(),
                Some(&self.name),
            )
            .await
            .map_err(|e| MetaError::fetch(self.full_name(), "load columns", e))?;
        let columns = Self::build_columns(rows);
        self.columns.set(columns.clone());
        Ok(columns)
    }

    /// Look up one column by exact name, loading columns if necessary.
    pub async fn column(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Column>>> {
        let columns = self.columns(monitor).await?;
        Ok(find_named(&columns, name).cloned())
    }

    pub(crate) fn build_columns(rows: Vec<ColumnRow>) -> Vec<Arc<Column>> {
        rows.into_iter().map(|r| Arc::new(Column::from(r))).collect()
    }

    pub(crate) fn set_columns(&self, columns: Vec<Arc<Column>>) {
        self.columns.set(columns);
    }

    pub(crate) fn columns_loaded(&self) -> bool {
        self.columns.is_loaded()
    }

    /// Indexes of this table. Backends that cannot enumerate indexes yield
    /// an empty collection.
    pub async fn indexes(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Arc<Index>>> {
        if let Some(indexes) = self.indexes.get() {
            return Ok(indexes);
        }
        check_canceled(monitor)?;
        let ds = upgrade(&self.datasource)?;
        let rows = optional(
            "list indexes",
            ds.source
                .list_indexes(
                    self.path.catalog.as_deref(),
                    self.path.schema.as_deref(),
                    Some(&self.name),
                )
                .await,
        )?;
        let indexes = self.build_indexes(monitor, rows).await?;
        self.indexes.set(indexes.clone());
        Ok(indexes)
    }

    /// Assemble index objects from their per-column rows. Statistic rows
    /// carry no index and are dropped; rows naming a column the table does
    /// not have are dropped with a warning.
    pub(crate) async fn build_indexes(
        &self,
        monitor: &dyn ProgressMonitor,
        rows: Vec<IndexRow>,
    ) -> MetaResult<Vec<Arc<Index>>> {
        let columns = self.columns(monitor).await?;
        let rows: Vec<IndexRow> = rows
            .into_iter()
            .filter(|r| r.kind != IndexKind::Statistic && !r.index.is_empty())
            .collect();
        let mut indexes = Vec::new();
        for (index_name, index_rows) in group_rows("index", rows, |r| Some(r.index.as_str())) {
            check_canceled(monitor)?;
            let first = &index_rows[0];
            let unique = first.unique;
            let qualifier = first.qualifier.clone();
            let kind = first.kind;
            let mut index_columns = Vec::new();
            for row in &index_rows {
                let Some(column) = find_named(&columns, &row.column) else {
                    tracing::warn!(
                        table = %self.full_name(),
                        index = %index_name,
                        column = %row.column,
                        "index references an unknown column"
                    );
                    continue;
                };
                index_columns.push(IndexColumn {
                    column: column.clone(),
                    ordinal: row.ordinal,
                    direction: row.direction,
                });
            }
            indexes.push(Arc::new(Index {
                table: self.name.clone(),
                name: index_name,
                unique,
                qualifier,
                kind,
                columns: index_columns,
            }));
        }
        Ok(indexes)
    }

    pub(crate) fn set_indexes(&self, indexes: Vec<Arc<Index>>) {
        self.indexes.set(indexes);
    }

    pub(crate) fn indexes_loaded(&self) -> bool {
        self.indexes.is_loaded()
    }

    /// Key constraints of this table: the primary key plus any unique keys
    /// synthesized while resolving foreign keys that point at this table.
    pub async fn constraints(
        &self,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Vec<Arc<PrimaryKey>>> {
        if let Some(constraints) = self.constraints.get() {
            return Ok(constraints);
        }
        check_canceled(monitor)?;
        let ds = upgrade(&self.datasource)?;
        let columns = self.columns(monitor).await?;
        let rows = ds
            .source
            .list_primary_keys(
                self.path.catalog.as_deref(),
                self.path.schema.as_deref(),
                &self.name,
            )
            .await
            .map_err(|e| MetaError::fetch(self.full_name(), "load primary keys", e))?;
        let mut constraints = Vec::new();
        for (_, mut key_rows) in
            group_rows("primary key", rows, |r| Some(r.pk_name.as_deref().unwrap_or("")))
        {
            key_rows.sort_by_key(|r| r.key_seq);
            let name = key_rows[0].pk_name.clone();
            let mut key_columns = Vec::new();
            for row in &key_rows {
                let Some(column) = find_named(&columns, &row.column) else {
                    tracing::warn!(
                        table = %self.full_name(),
                        column = %row.column,
                        "primary key references an unknown column"
                    );
                    continue;
                };
                key_columns.push(KeyColumn {
                    column: column.clone(),
                    seq: row.key_seq,
                });
            }
            constraints.push(Arc::new(PrimaryKey {
                table: self.name.clone(),
                name,
                constraint_type: ConstraintType::PrimaryKey,
                columns: key_columns,
            }));
        }
        self.constraints.set(constraints.clone());
        Ok(constraints)
    }

    /// The primary key, if the backend reports one.
    pub async fn primary_key(
        &self,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Option<Arc<PrimaryKey>>> {
        let constraints = self.constraints(monitor).await?;
        Ok(constraints
            .iter()
            .find(|c| c.constraint_type == ConstraintType::PrimaryKey)
            .cloned())
    }

    /// Foreign keys owned by this table (the imported direction).
    pub async fn foreign_keys(
        &self,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Vec<Arc<ForeignKey>>> {
        if let Some(keys) = self.foreign_keys.get() {
            return Ok(keys);
        }
        check_canceled(monitor)?;
        let ds = upgrade(&self.datasource)?;
        let rows = ds
            .source
            .list_imported_keys(
                self.path.catalog.as_deref(),
                self.path.schema.as_deref(),
                &self.name,
            )
            .await
            .map_err(|e| MetaError::fetch(self.full_name(), "load foreign keys", e))?;
        let keys = self.build_foreign_keys(monitor, &ds, rows).await?;
        self.foreign_keys.set(keys.clone());
        Ok(keys)
    }

    async fn build_foreign_keys(
        &self,
        monitor: &dyn ProgressMonitor,
        ds: &Arc<DataSourceInner>,
        rows: Vec<ForeignKeyRow>,
    ) -> MetaResult<Vec<Arc<ForeignKey>>> {
        let columns = self.columns(monitor).await?;
        let mut keys = Vec::new();
        for (_, mut key_rows) in
            group_rows("foreign key", rows, |r| Some(r.fk_name.as_deref().unwrap_or("")))
        {
            check_canceled(monitor)?;
            key_rows.sort_by_key(|r| r.key_seq);
            let first = &key_rows[0];
            let Some(referenced) = ds
                .find_table(
                    monitor,
                    first.pk_table_catalog.as_deref(),
                    first.pk_table_schema.as_deref(),
                    &first.pk_table,
                )
                .await?
            else {
                tracing::warn!(
                    table = %self.full_name(),
                    referenced = %first.pk_table,
                    key = first.fk_name.as_deref().unwrap_or("<unnamed>"),
                    "foreign key references an unknown table, skipping"
                );
                continue;
            };
            let referenced_key = self
                .resolve_referenced_key(monitor, &referenced, &key_rows)
                .await?;
            let referenced_columns = referenced.columns(monitor).await?;
            let mut fk_columns = Vec::new();
            for row in &key_rows {
                let local = find_named(&columns, &row.fk_column);
                let remote = find_named(&referenced_columns, &row.pk_column);
                match (local, remote) {
                    (Some(local), Some(remote)) => fk_columns.push(ForeignKeyColumn {
                        column: local.clone(),
                        referenced: remote.clone(),
                        seq: row.key_seq,
                    }),
                    _ => {
                        tracing::warn!(
                            table = %self.full_name(),
                            fk_column = %row.fk_column,
                            pk_column = %row.pk_column,
                            "foreign key column pair could not be resolved"
                        );
                    }
                }
            }
            keys.push(Arc::new(ForeignKey {
                table: self.name.clone(),
                name: first.fk_name.clone(),
                referenced_table: referenced.name().to_string(),
                referenced_key,
                update_rule: first.update_rule,
                delete_rule: first.delete_rule,
                deferability: first.deferability,
                columns: fk_columns,
            }));
        }
        Ok(keys)
    }

    /// Find the unique key a foreign key points at, by name first, then by
    /// the first referenced column. When the referenced table does not
    /// report a matching key, synthesize one from the referenced columns so
    /// the foreign key still links to a complete object.
    async fn resolve_referenced_key(
        &self,
        monitor: &dyn ProgressMonitor,
        referenced: &Arc<Table>,
        key_rows: &[ForeignKeyRow],
    ) -> MetaResult<Arc<PrimaryKey>> {
        let first = &key_rows[0];
        let existing = referenced.constraints(monitor).await?;
        let found = existing.iter().find(|c| match first.pk_name.as_deref() {
            Some(name) => c.name() == name,
            None => c.column(&first.pk_column).is_some(),
        });
        if let Some(key) = found {
            return Ok(key.clone());
        }
        tracing::warn!(
            table = %referenced.full_name(),
            key = first.pk_name.as_deref().unwrap_or("<unnamed>"),
            "referenced key not reported by backend, synthesizing"
        );
        let referenced_columns = referenced.columns(monitor).await?;
        let mut key_columns = Vec::new();
        for row in key_rows {
            if let Some(column) = find_named(&referenced_columns, &row.pk_column) {
                key_columns.push(KeyColumn {
                    column: column.clone(),
                    seq: row.key_seq,
                });
            }
        }
        let synthesized = Arc::new(PrimaryKey {
            table: referenced.name().to_string(),
            name: first.pk_name.clone(),
            constraint_type: ConstraintType::UniqueKey,
            columns: key_columns,
        });
        // Make the synthesized key visible through the referenced table's
        // own constraint collection when that is already published.
        referenced.constraints.push_if_loaded(synthesized.clone());
        Ok(synthesized)
    }

    /// Foreign keys in other tables that reference this table (the exported
    /// direction). Resolved through the owning tables' own key collections,
    /// so both directions observe the same objects. Not cached.
    pub async fn references(
        &self,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Vec<Arc<ForeignKey>>> {
        check_canceled(monitor)?;
        let ds = upgrade(&self.datasource)?;
        let rows = ds
            .source
            .list_exported_keys(
                self.path.catalog.as_deref(),
                self.path.schema.as_deref(),
                &self.name,
            )
            .await
            .map_err(|e| MetaError::fetch(self.full_name(), "load references", e))?;
        let mut references = Vec::new();
        for (key_name, key_rows) in
            group_rows("reference", rows, |r| Some(r.fk_name.as_deref().unwrap_or("")))
        {
            check_canceled(monitor)?;
            let first = &key_rows[0];
            let Some(owner) = ds
                .find_table(
                    monitor,
                    first.fk_table_catalog.as_deref(),
                    first.fk_table_schema.as_deref(),
                    &first.fk_table,
                )
                .await?
            else {
                tracing::warn!(
                    table = %self.full_name(),
                    owner = %first.fk_table,
                    "reference from an unknown table, skipping"
                );
                continue;
            };
            let owner_keys = owner.foreign_keys(monitor).await?;
            let found = owner_keys.iter().find(|k| {
                if key_name.is_empty() {
                    k.referenced_table == self.name
                } else {
                    k.name() == key_name
                }
            });
            match found {
                Some(key) => references.push(key.clone()),
                None => tracing::warn!(
                    table = %self.full_name(),
                    owner = %owner.full_name(),
                    key = %key_name,
                    "exported key not present in the owning table"
                ),
            }
        }
        Ok(references)
    }

    /// Drop every cached child collection of this table.
    pub fn refresh(&self) {
        self.columns.clear();
        self.indexes.clear();
        self.constraints.clear();
        self.foreign_keys.clear();
    }
}

impl Named for Table {
    fn name(&self) -> &str {
        &self.name
    }
}
