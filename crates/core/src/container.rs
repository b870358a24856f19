// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Structure containers
//!
//! A structure container is anything that directly owns tables and
//! procedures: a schema, a catalog without schemas, or the data source
//! itself when the backend has neither catalogs nor schemas. All three
//! share [`ContainerCore`], which carries the addressing path and the
//! lazy caches, and expose the same surface through the
//! [`StructureContainer`] trait.

use std::sync::{Arc, Weak};

use async_trait::async_trait;

use crate::cache::{EntityCache, group_rows};
use crate::datasource::{DataSourceInner, upgrade};
use crate::error::{MetaResult, optional, required};
use crate::progress::{ProgressMonitor, ScanGuard, check_canceled};
use crate::table::Table;
use crate::procedure::Procedure;
use crate::catalog::Catalog;
use crate::schema::Schema;
use dbmeta_model::entity::Index;

/// Table-kind labels that are not tables at all. Some backends report
/// sequences and index segments through the table enumeration; those rows
/// are dropped during the table scan.
pub(crate) const INVALID_TABLE_TYPES: &[&str] =
    &["INDEX", "SEQUENCE", "SYSTEM INDEX", "SYSTEM SEQUENCE"];

/// How deep a bulk structure scan should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureScope {
    /// Enumerate tables only.
    Entities,
    /// Enumerate tables and bulk-load every table's columns.
    Full,
}

/// Addressing scope of a container, passed through to every metadata call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerPath {
    pub catalog: Option<String>,
    pub schema: Option<String>,
}

impl ContainerPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn catalog(name: impl Into<String>) -> Self {
        Self {
            catalog: Some(name.into()),
            schema: None,
        }
    }

    pub fn schema(catalog: Option<String>, name: impl Into<String>) -> Self {
        Self {
            catalog,
            schema: Some(name.into()),
        }
    }

    /// Dotted display form used in log events and error messages.
    pub fn display(&self) -> String {
        match (&self.catalog, &self.schema) {
            (Some(c), Some(s)) => format!("{c}.{s}"),
            (Some(c), None) => c.clone(),
            (None, Some(s)) => s.clone(),
            (None, None) => String::new(),
        }
    }
}

/// A directly navigable child of a data source.
#[derive(Clone)]
pub enum StructureChild {
    Catalog(Arc<Catalog>),
    Schema(Arc<Schema>),
    Table(Arc<Table>),
}

impl StructureChild {
    pub fn name(&self) -> &str {
        match self {
            StructureChild::Catalog(c) => c.name(),
            StructureChild::Schema(s) => s.name(),
            StructureChild::Table(t) => t.name(),
        }
    }
}

pub(crate) struct StructureCaches {
    pub(crate) tables: EntityCache<Arc<Table>>,
    pub(crate) indexes: EntityCache<Arc<Index>>,
    pub(crate) procedures: EntityCache<Arc<Procedure>>,
}

impl StructureCaches {
    fn new() -> Self {
        Self {
            tables: EntityCache::new("tables"),
            indexes: EntityCache::new("indexes"),
            procedures: EntityCache::new("procedures"),
        }
    }
}

/// Shared state of every structure container: back-pointer to the data
/// source, addressing path, and the lazy caches.
pub struct ContainerCore {
    pub(crate) datasource: Weak<DataSourceInner>,
    pub(crate) path: ContainerPath,
    pub(crate) caches: StructureCaches,
}

impl ContainerCore {
    pub(crate) fn new(datasource: Weak<DataSourceInner>, path: ContainerPath) -> Self {
        Self {
            datasource,
            path,
            caches: StructureCaches::new(),
        }
    }

    pub fn path(&self) -> &ContainerPath {
        &self.path
    }

    pub(crate) async fn tables(
        &self,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Vec<Arc<Table>>> {
        self.caches
            .tables
            .get_or_load(|| self.load_tables(monitor))
            .await
    }

    pub(crate) async fn table(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Table>>> {
        self.caches
            .tables
            .get_named(|| self.load_tables(monitor), name)
            .await
    }

    async fn load_tables(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Arc<Table>>> {
        let ds = upgrade(&self.datasource)?;
        let _guard = ScanGuard::begin(monitor, "Load tables", 1);
        monitor.sub_task(&format!("Extract tables - {}", self.path.display()));
        let rows = required(
            &self.path.display(),
            "load tables",
            ds.source
                .list_tables(self.path.catalog.as_deref(), self.path.schema.as_deref(), None)
                .await,
        )?;
        let show_system = ds.options.show_system_objects;
        let mut tables = Vec::new();
        for row in rows {
            check_canceled(monitor)?;
            if row.name.is_empty() {
                tracing::debug!(container = %self.path.display(), "skipping unnamed table row");
                continue;
            }
            if let Some(kind) = row.kind.as_deref()
                && INVALID_TABLE_TYPES.iter().any(|t| t.eq_ignore_ascii_case(kind))
            {
                continue;
            }
            let table = Table::from_row(self.datasource.clone(), self.path.clone(), row);
            if table.is_system() && !show_system {
                continue;
            }
            monitor.worked(1);
            tables.push(Arc::new(table));
        }
        Ok(tables)
    }

    /// All indexes of the container, copied from the per-table index
    /// collections. Tables whose backend cannot enumerate indexes simply
    /// contribute nothing.
    pub(crate) async fn indexes(
        &self,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Vec<Arc<Index>>> {
        if let Some(cached) = self.caches.indexes.get_cached().await {
            return Ok(cached);
        }
        let tables = self.tables(monitor).await?;
        let mut all = Vec::new();
        for table in &tables {
            check_canceled(monitor)?;
            // The container view holds its own copies, detached from the
            // per-table collections.
            for index in table.indexes(monitor).await? {
                all.push(Arc::new(Index::clone(&index)));
            }
        }
        self.caches.indexes.set(all.clone()).await;
        Ok(all)
    }

    /// Bulk-load indexes for every table of the container with a single
    /// backend call, pre-warming each table's index collection. Falls back
    /// silently when the backend cannot enumerate container-wide.
    pub(crate) async fn cache_indexes(&self, monitor: &dyn ProgressMonitor) -> MetaResult<()> {
        let ds = upgrade(&self.datasource)?;
        let tables = self.tables(monitor).await?;
        let _guard = ScanGuard::begin(monitor, "Cache indexes", tables.len());
        let rows = optional(
            "list indexes",
            ds.source
                .list_indexes(self.path.catalog.as_deref(), self.path.schema.as_deref(), None)
                .await,
        )?;
        if rows.is_empty() {
            return Ok(());
        }
        let by_table = group_rows("index", rows, |r| Some(r.table.as_str()));
        for (table_name, table_rows) in by_table {
            check_canceled(monitor)?;
            let Some(table) = tables.iter().find(|t| t.name() == table_name) else {
                tracing::warn!(
                    container = %self.path.display(),
                    table = %table_name,
                    "index rows reference an unknown table"
                );
                continue;
            };
            let indexes = table.build_indexes(monitor, table_rows).await?;
            table.set_indexes(indexes);
            monitor.worked(1);
        }
        // Tables absent from the row stream have no indexes.
        for table in &tables {
            if !table.indexes_loaded() {
                table.set_indexes(Vec::new());
            }
        }
        Ok(())
    }

    pub(crate) async fn procedures(
        &self,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Vec<Arc<Procedure>>> {
        self.caches
            .procedures
            .get_or_load(|| self.load_procedures(monitor))
            .await
    }

    pub(crate) async fn procedure(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Procedure>>> {
        self.caches
            .procedures
            .get_named(|| self.load_procedures(monitor), name)
            .await
    }

    async fn load_procedures(
        &self,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Vec<Arc<Procedure>>> {
        let ds = upgrade(&self.datasource)?;
        monitor.sub_task(&format!("Extract procedures - {}", self.path.display()));
        let rows = required(
            &self.path.display(),
            "load procedures",
            ds.source
                .list_procedures(self.path.catalog.as_deref(), self.path.schema.as_deref())
                .await,
        )?;
        let mut procedures = Vec::new();
        for row in rows {
            check_canceled(monitor)?;
            procedures.push(Arc::new(Procedure::from_row(
                self.datasource.clone(),
                self.path.clone(),
                row,
            )));
        }
        Ok(procedures)
    }

    /// Bulk-load parameter columns for every procedure of the container
    /// with a single backend call.
    pub(crate) async fn cache_procedure_columns(
        &self,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<()> {
        let ds = upgrade(&self.datasource)?;
        let procedures = self.procedures(monitor).await?;
        let rows = optional(
            "list procedure columns",
            ds.source
                .list_procedure_columns(
                    self.path.catalog.as_deref(),
                    self.path.schema.as_deref(),
                    None,
                )
                .await,
        )?;
        let by_procedure = group_rows("procedure column", rows, |r| Some(r.procedure.as_str()));
        for (procedure_name, procedure_rows) in by_procedure {
            check_canceled(monitor)?;
            let Some(procedure) = procedures.iter().find(|p| p.name() == procedure_name) else {
                tracing::warn!(
                    container = %self.path.display(),
                    procedure = %procedure_name,
                    "procedure column rows reference an unknown procedure"
                );
                continue;
            };
            procedure.set_columns(Procedure::build_columns(procedure_rows));
        }
        for procedure in &procedures {
            if !procedure.columns_loaded() {
                procedure.set_columns(Vec::new());
            }
        }
        Ok(())
    }

    /// Pre-load the container's structure: tables, and with
    /// [`StructureScope::Full`] also every table's columns via one bulk
    /// column enumeration.
    pub(crate) async fn cache_structure(
        &self,
        monitor: &dyn ProgressMonitor,
        scope: StructureScope,
    ) -> MetaResult<()> {
        let tables = self.tables(monitor).await?;
        if scope == StructureScope::Entities {
            return Ok(());
        }
        let ds = upgrade(&self.datasource)?;
        let _guard = ScanGuard::begin(monitor, "Cache table columns", tables.len());
        let rows = ds
            .source
            .list_columns(self.path.catalog.as_deref(), self.path.schema.as_deref(), None)
            .await
            .map_err(|e| {
                crate::error::MetaError::fetch(self.path.display(), "load columns", e)
            })?;
        let by_table = group_rows("column", rows, |r| Some(r.table.as_str()));
        for (table_name, table_rows) in by_table {
            check_canceled(monitor)?;
            let Some(table) = tables.iter().find(|t| t.name() == table_name) else {
                tracing::warn!(
                    container = %self.path.display(),
                    table = %table_name,
                    "column rows reference an unknown table"
                );
                continue;
            };
            table.set_columns(Table::build_columns(table_rows));
            monitor.worked(1);
        }
        for table in &tables {
            if !table.columns_loaded() {
                table.set_columns(Vec::new());
            }
        }
        Ok(())
    }

    /// Drop every cached collection; entities are re-read on next access.
    pub(crate) async fn refresh(&self) {
        self.caches.tables.invalidate().await;
        self.caches.indexes.invalidate().await;
        self.caches.procedures.invalidate().await;
    }
}

/// Common surface of everything that owns tables and procedures.
#[async_trait]
pub trait StructureContainer: Send + Sync {
    /// Addressing scope of this container.
    fn container_path(&self) -> &ContainerPath;

    /// Tables of this container, loaded on first access.
    async fn tables(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Arc<Table>>>;

    /// Look up one table by exact name.
    async fn table(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Table>>>;

    /// All indexes of the container, aggregated across its tables.
    async fn indexes(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Arc<Index>>>;

    /// Procedures of this container, loaded on first access.
    async fn procedures(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Arc<Procedure>>>;

    /// Look up one procedure by exact name.
    async fn procedure(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Procedure>>>;

    /// Pre-load tables (and optionally their columns) in bulk.
    async fn cache_structure(
        &self,
        monitor: &dyn ProgressMonitor,
        scope: StructureScope,
    ) -> MetaResult<()>;

    /// Pre-load every table's indexes with one container-wide call.
    async fn cache_indexes(&self, monitor: &dyn ProgressMonitor) -> MetaResult<()>;

    /// Pre-load every procedure's columns with one container-wide call.
    async fn cache_procedure_columns(&self, monitor: &dyn ProgressMonitor) -> MetaResult<()>;

    /// Drop the container's cached collections.
    async fn refresh(&self) -> MetaResult<()>;
}
