// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # MetadataSource trait for backend capability queries
//!
//! This is the only interface the catalog model consumes from its
//! environment: a capability-query surface over a live connection, returning
//! loosely-typed rows, plus raw execution of the small driver-specific
//! "active database" query pair.
//!
//! Adapters signal an unimplemented metadata call with
//! [`MetaError::Unsupported`]; the model decides per call site whether that
//! degrades silently (catalogs, schemas, indexes) or surfaces as an error.
//!
//! The connection handle behind an adapter is not assumed safe for
//! concurrent scans; callers are responsible for serializing access.
//!
//! [`MetaError::Unsupported`]: crate::MetaError::Unsupported

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MetaResult;
use dbmeta_model::rows::{
    ColumnRow, ForeignKeyRow, IndexRow, PrimaryKeyRow, ProcedureColumnRow, ProcedureRow,
    SchemaRow, SourceInfo, TableRow,
};

/// Well-known key of the driver query returning the current database name.
pub const QUERY_GET_ACTIVE_DB: &str = "GET_ACTIVE_DB";

/// Well-known key of the driver query changing the current database; the
/// first `?` is replaced with the target child name.
pub const QUERY_SET_ACTIVE_DB: &str = "SET_ACTIVE_DB";

/// Container for driver-specific custom queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverQueries {
    queries: HashMap<String, String>,
}

impl DriverQueries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: register a custom query under a well-known key.
    pub fn with_query(mut self, key: impl Into<String>, sql: impl Into<String>) -> Self {
        self.queries.insert(key.into(), sql.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.queries.get(key).map(String::as_str)
    }
}

/// Capability-query interface over a live connection.
///
/// Scope arguments follow one convention throughout: `None` means "not
/// constrained at this level". A backend without catalogs simply never sees
/// a catalog name.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// General capability information, fetched once per connection.
    async fn general_info(&self) -> MetaResult<SourceInfo>;

    /// Table-kind labels the backend supports ("TABLE", "VIEW", ...).
    async fn list_table_types(&self) -> MetaResult<Vec<String>>;

    /// Top-level catalog names. Optional capability.
    async fn list_catalogs(&self) -> MetaResult<Vec<String>>;

    /// Schemas, either root-level (`catalog` is `None`) or within one
    /// catalog. Optional capability.
    async fn list_schemas(&self, catalog: Option<&str>) -> MetaResult<Vec<SchemaRow>>;

    /// Tables of one container, optionally filtered by a name pattern.
    async fn list_tables(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table_pattern: Option<&str>,
    ) -> MetaResult<Vec<TableRow>>;

    /// Columns of one table, or of every table in the container when
    /// `table` is `None`.
    async fn list_columns(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: Option<&str>,
    ) -> MetaResult<Vec<ColumnRow>>;

    /// Index rows (one per index column) of one table, or of the whole
    /// container when `table` is `None`. Optional capability.
    async fn list_indexes(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: Option<&str>,
    ) -> MetaResult<Vec<IndexRow>>;

    /// Primary-key rows of one table.
    async fn list_primary_keys(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> MetaResult<Vec<PrimaryKeyRow>>;

    /// Foreign keys referencing other tables *from* the given table.
    async fn list_imported_keys(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> MetaResult<Vec<ForeignKeyRow>>;

    /// Foreign keys in other tables referencing the given table.
    async fn list_exported_keys(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> MetaResult<Vec<ForeignKeyRow>>;

    /// Procedures of one container.
    async fn list_procedures(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
    ) -> MetaResult<Vec<ProcedureRow>>;

    /// Procedure-column rows of one procedure, or of every procedure in the
    /// container when `procedure` is `None`.
    async fn list_procedure_columns(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        procedure: Option<&str>,
    ) -> MetaResult<Vec<ProcedureColumnRow>>;

    /// Run a driver-specific query returning a single scalar string, used
    /// for the "get current database" query.
    async fn run_scalar_query(&self, sql: &str) -> MetaResult<Option<String>>;

    /// Execute a driver-specific statement with no result, used for the
    /// "set current database" query.
    async fn execute(&self, sql: &str) -> MetaResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_queries_lookup() {
        let queries = DriverQueries::new()
            .with_query(QUERY_GET_ACTIVE_DB, "SELECT DATABASE()")
            .with_query(QUERY_SET_ACTIVE_DB, "USE ?");
        assert_eq!(queries.get(QUERY_GET_ACTIVE_DB), Some("SELECT DATABASE()"));
        assert_eq!(queries.get(QUERY_SET_ACTIVE_DB), Some("USE ?"));
        assert!(queries.get("EXPLAIN_PLAN").is_none());
    }

    #[test]
    fn test_driver_queries_default_is_empty() {
        let queries = DriverQueries::default();
        assert!(queries.get(QUERY_GET_ACTIVE_DB).is_none());
    }
}
