// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Mock metadata source for testing
//!
//! Provides an in-memory [`MetadataSource`] with builder-style setup,
//! per-operation call counters, switchable unsupported/failing operations
//! and a simulated active database.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use dbmeta_core::{MetaError, MetaResult, MetadataSource};
use dbmeta_model::rows::{
    ColumnRow, ForeignKeyRow, IndexRow, PrimaryKeyRow, ProcedureColumnRow, ProcedureRow,
    SchemaRow, SourceInfo, TableRow,
};

/// Operation labels accepted by [`MockMetadataSource::unsupported`] and
/// [`MockMetadataSource::failing`].
pub mod ops {
    pub const TABLE_TYPES: &str = "table_types";
    pub const CATALOGS: &str = "catalogs";
    pub const SCHEMAS: &str = "schemas";
    pub const TABLES: &str = "tables";
    pub const COLUMNS: &str = "columns";
    pub const INDEXES: &str = "indexes";
    pub const PRIMARY_KEYS: &str = "primary_keys";
    pub const IMPORTED_KEYS: &str = "imported_keys";
    pub const EXPORTED_KEYS: &str = "exported_keys";
    pub const PROCEDURES: &str = "procedures";
    pub const PROCEDURE_COLUMNS: &str = "procedure_columns";
}

/// Addressing scope a row was registered under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Scope {
    catalog: Option<String>,
    schema: Option<String>,
}

impl Scope {
    fn new(catalog: Option<&str>, schema: Option<&str>) -> Self {
        Self {
            catalog: catalog.map(str::to_owned),
            schema: schema.map(str::to_owned),
        }
    }

    /// `None` in the request means "not constrained at this level".
    fn matches(&self, catalog: Option<&str>, schema: Option<&str>) -> bool {
        let catalog_ok = match catalog {
            Some(c) => self.catalog.as_deref() == Some(c),
            None => true,
        };
        let schema_ok = match schema {
            Some(s) => self.schema.as_deref() == Some(s),
            None => true,
        };
        catalog_ok && schema_ok
    }
}

/// Number of calls issued per metadata operation.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub general_info: AtomicUsize,
    pub table_types: AtomicUsize,
    pub catalogs: AtomicUsize,
    pub schemas: AtomicUsize,
    pub tables: AtomicUsize,
    pub columns: AtomicUsize,
    pub indexes: AtomicUsize,
    pub primary_keys: AtomicUsize,
    pub imported_keys: AtomicUsize,
    pub exported_keys: AtomicUsize,
    pub procedures: AtomicUsize,
    pub procedure_columns: AtomicUsize,
    pub scalar_queries: AtomicUsize,
    pub executes: AtomicUsize,
}

/// Point-in-time copy of [`CallCounts`], for assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSnapshot {
    pub general_info: usize,
    pub table_types: usize,
    pub catalogs: usize,
    pub schemas: usize,
    pub tables: usize,
    pub columns: usize,
    pub indexes: usize,
    pub primary_keys: usize,
    pub imported_keys: usize,
    pub exported_keys: usize,
    pub procedures: usize,
    pub procedure_columns: usize,
    pub scalar_queries: usize,
    pub executes: usize,
}

impl CallCounts {
    pub fn snapshot(&self) -> CallSnapshot {
        CallSnapshot {
            general_info: self.general_info.load(Ordering::SeqCst),
            table_types: self.table_types.load(Ordering::SeqCst),
            catalogs: self.catalogs.load(Ordering::SeqCst),
            schemas: self.schemas.load(Ordering::SeqCst),
            tables: self.tables.load(Ordering::SeqCst),
            columns: self.columns.load(Ordering::SeqCst),
            indexes: self.indexes.load(Ordering::SeqCst),
            primary_keys: self.primary_keys.load(Ordering::SeqCst),
            imported_keys: self.imported_keys.load(Ordering::SeqCst),
            exported_keys: self.exported_keys.load(Ordering::SeqCst),
            procedures: self.procedures.load(Ordering::SeqCst),
            procedure_columns: self.procedure_columns.load(Ordering::SeqCst),
            scalar_queries: self.scalar_queries.load(Ordering::SeqCst),
            executes: self.executes.load(Ordering::SeqCst),
        }
    }
}

/// In-memory metadata source for testing.
pub struct MockMetadataSource {
    info: SourceInfo,
    table_types: Vec<String>,
    catalogs: Vec<String>,
    /// Schema rows keyed by the catalog scope they are served under; lets a
    /// test plant rows claiming a different catalog than the one queried.
    schemas: Vec<(Option<String>, SchemaRow)>,
    tables: Vec<(Scope, TableRow)>,
    columns: Vec<(Scope, ColumnRow)>,
    indexes: Vec<(Scope, IndexRow)>,
    primary_keys: Vec<(Scope, String, PrimaryKeyRow)>,
    foreign_keys: Vec<(Scope, ForeignKeyRow)>,
    procedures: Vec<(Scope, ProcedureRow)>,
    procedure_columns: Vec<(Scope, ProcedureColumnRow)>,
    unsupported: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
    active: Mutex<Option<String>>,
    executed: Mutex<Vec<String>>,
    pub calls: CallCounts,
}

impl Default for MockMetadataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMetadataSource {
    pub fn new() -> Self {
        Self {
            info: SourceInfo::new("MockDB", "1.0").with_driver_name("mock"),
            table_types: vec!["TABLE".to_string(), "VIEW".to_string()],
            catalogs: Vec::new(),
            schemas: Vec::new(),
            tables: Vec::new(),
            columns: Vec::new(),
            indexes: Vec::new(),
            primary_keys: Vec::new(),
            foreign_keys: Vec::new(),
            procedures: Vec::new(),
            procedure_columns: Vec::new(),
            unsupported: Mutex::new(HashSet::new()),
            failing: Mutex::new(HashSet::new()),
            active: Mutex::new(None),
            executed: Mutex::new(Vec::new()),
            calls: CallCounts::default(),
        }
    }

    pub fn with_info(mut self, info: SourceInfo) -> Self {
        self.info = info;
        self
    }

    pub fn with_table_types(mut self, types: Vec<&str>) -> Self {
        self.table_types = types.into_iter().map(str::to_owned).collect();
        self
    }

    pub fn add_catalog(mut self, name: &str) -> Self {
        self.catalogs.push(name.to_owned());
        self
    }

    /// Register a schema row served when `list_schemas` is called with the
    /// given catalog scope.
    pub fn add_schema(mut self, catalog_scope: Option<&str>, row: SchemaRow) -> Self {
        self.schemas.push((catalog_scope.map(str::to_owned), row));
        self
    }

    pub fn add_table(mut self, catalog: Option<&str>, schema: Option<&str>, row: TableRow) -> Self {
        self.tables.push((Scope::new(catalog, schema), row));
        self
    }

    pub fn add_column(
        mut self,
        catalog: Option<&str>,
        schema: Option<&str>,
        row: ColumnRow,
    ) -> Self {
        self.columns.push((Scope::new(catalog, schema), row));
        self
    }

    pub fn add_index(
        mut self,
        catalog: Option<&str>,
        schema: Option<&str>,
        row: IndexRow,
    ) -> Self {
        self.indexes.push((Scope::new(catalog, schema), row));
        self
    }

    pub fn add_primary_key(
        mut self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
        row: PrimaryKeyRow,
    ) -> Self {
        self.primary_keys
            .push((Scope::new(catalog, schema), table.to_owned(), row));
        self
    }

    /// Register a foreign-key row; it is served by `list_imported_keys` of
    /// the referencing table and `list_exported_keys` of the referenced one.
    pub fn add_foreign_key(
        mut self,
        catalog: Option<&str>,
        schema: Option<&str>,
        row: ForeignKeyRow,
    ) -> Self {
        self.foreign_keys.push((Scope::new(catalog, schema), row));
        self
    }

    pub fn add_procedure(
        mut self,
        catalog: Option<&str>,
        schema: Option<&str>,
        row: ProcedureRow,
    ) -> Self {
        self.procedures.push((Scope::new(catalog, schema), row));
        self
    }

    pub fn add_procedure_column(
        mut self,
        catalog: Option<&str>,
        schema: Option<&str>,
        row: ProcedureColumnRow,
    ) -> Self {
        self.procedure_columns
            .push((Scope::new(catalog, schema), row));
        self
    }

    /// Make an operation report [`MetaError::Unsupported`] (see [`ops`]).
    pub fn unsupported(self, op: &str) -> Self {
        self.unsupported.lock().unwrap().insert(op.to_owned());
        self
    }

    /// Make an operation fail with a backend error (see [`ops`]).
    pub fn failing(self, op: &str) -> Self {
        self.failing.lock().unwrap().insert(op.to_owned());
        self
    }

    /// Flip an operation's injected failure at runtime.
    pub fn set_failing(&self, op: &str, on: bool) {
        let mut failing = self.failing.lock().unwrap();
        if on {
            failing.insert(op.to_owned());
        } else {
            failing.remove(op);
        }
    }

    /// Flip an operation's unsupported flag at runtime.
    pub fn set_unsupported(&self, op: &str, on: bool) {
        let mut unsupported = self.unsupported.lock().unwrap();
        if on {
            unsupported.insert(op.to_owned());
        } else {
            unsupported.remove(op);
        }
    }

    pub fn with_active(self, name: &str) -> Self {
        *self.active.lock().unwrap() = Some(name.to_owned());
        self
    }

    /// Statements passed to `execute`, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    fn check(&self, op: &str) -> MetaResult<()> {
        if self.unsupported.lock().unwrap().contains(op) {
            return Err(MetaError::Unsupported(op.to_owned()));
        }
        if self.failing.lock().unwrap().contains(op) {
            return Err(MetaError::Backend(format!("injected failure: {op}")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MetadataSource for MockMetadataSource {
    async fn general_info(&self) -> MetaResult<SourceInfo> {
        self.calls.general_info.fetch_add(1, Ordering::SeqCst);
        Ok(self.info.clone())
    }

    async fn list_table_types(&self) -> MetaResult<Vec<String>> {
        self.calls.table_types.fetch_add(1, Ordering::SeqCst);
        self.check(ops::TABLE_TYPES)?;
        Ok(self.table_types.clone())
    }

    async fn list_catalogs(&self) -> MetaResult<Vec<String>> {
        self.calls.catalogs.fetch_add(1, Ordering::SeqCst);
        self.check(ops::CATALOGS)?;
        Ok(self.catalogs.clone())
    }

    async fn list_schemas(&self, catalog: Option<&str>) -> MetaResult<Vec<SchemaRow>> {
        self.calls.schemas.fetch_add(1, Ordering::SeqCst);
        self.check(ops::SCHEMAS)?;
        Ok(self
            .schemas
            .iter()
            .filter(|(scope, _)| scope.as_deref() == catalog)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn list_tables(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table_pattern: Option<&str>,
    ) -> MetaResult<Vec<TableRow>> {
        self.calls.tables.fetch_add(1, Ordering::SeqCst);
        self.check(ops::TABLES)?;
        Ok(self
            .tables
            .iter()
            .filter(|(scope, row)| {
                scope.matches(catalog, schema)
                    && table_pattern.is_none_or(|p| row.name == p)
            })
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn list_columns(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: Option<&str>,
    ) -> MetaResult<Vec<ColumnRow>> {
        self.calls.columns.fetch_add(1, Ordering::SeqCst);
        self.check(ops::COLUMNS)?;
        Ok(self
            .columns
            .iter()
            .filter(|(scope, row)| {
                scope.matches(catalog, schema) && table.is_none_or(|t| row.table == t)
            })
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn list_indexes(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: Option<&str>,
    ) -> MetaResult<Vec<IndexRow>> {
        self.calls.indexes.fetch_add(1, Ordering::SeqCst);
        self.check(ops::INDEXES)?;
        Ok(self
            .indexes
            .iter()
            .filter(|(scope, row)| {
                scope.matches(catalog, schema) && table.is_none_or(|t| row.table == t)
            })
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn list_primary_keys(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> MetaResult<Vec<PrimaryKeyRow>> {
        self.calls.primary_keys.fetch_add(1, Ordering::SeqCst);
        self.check(ops::PRIMARY_KEYS)?;
        Ok(self
            .primary_keys
            .iter()
            .filter(|(scope, t, _)| scope.matches(catalog, schema) && t == table)
            .map(|(_, _, row)| row.clone())
            .collect())
    }

    async fn list_imported_keys(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> MetaResult<Vec<ForeignKeyRow>> {
        self.calls.imported_keys.fetch_add(1, Ordering::SeqCst);
        self.check(ops::IMPORTED_KEYS)?;
        Ok(self
            .foreign_keys
            .iter()
            .filter(|(scope, row)| scope.matches(catalog, schema) && row.fk_table == table)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn list_exported_keys(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> MetaResult<Vec<ForeignKeyRow>> {
        self.calls.exported_keys.fetch_add(1, Ordering::SeqCst);
        self.check(ops::EXPORTED_KEYS)?;
        Ok(self
            .foreign_keys
            .iter()
            .filter(|(scope, row)| scope.matches(catalog, schema) && row.pk_table == table)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn list_procedures(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
    ) -> MetaResult<Vec<ProcedureRow>> {
        self.calls.procedures.fetch_add(1, Ordering::SeqCst);
        self.check(ops::PROCEDURES)?;
        Ok(self
            .procedures
            .iter()
            .filter(|(scope, _)| scope.matches(catalog, schema))
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn list_procedure_columns(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        procedure: Option<&str>,
    ) -> MetaResult<Vec<ProcedureColumnRow>> {
        self.calls.procedure_columns.fetch_add(1, Ordering::SeqCst);
        self.check(ops::PROCEDURE_COLUMNS)?;
        Ok(self
            .procedure_columns
            .iter()
            .filter(|(scope, row)| {
                scope.matches(catalog, schema) && procedure.is_none_or(|p| row.procedure == p)
            })
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn run_scalar_query(&self, _sql: &str) -> MetaResult<Option<String>> {
        self.calls.scalar_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.active.lock().unwrap().clone())
    }

    async fn execute(&self, sql: &str) -> MetaResult<()> {
        self.calls.executes.fetch_add(1, Ordering::SeqCst);
        self.executed.lock().unwrap().push(sql.to_owned());
        if let Some(name) = sql.strip_prefix("USE ") {
            *self.active.lock().unwrap() = Some(name.trim().to_owned());
        }
        Ok(())
    }
}
