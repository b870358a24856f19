// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Pre-built metadata fixtures
//!
//! The standard fixture models a small web-shop database: one catalog with
//! `users` and `orders` tables, a view, a system table, keys, indexes and a
//! couple of procedures. Tests that need an unusual topology build their own
//! source on top of these helpers.

use crate::mock_source::{MockMetadataSource, ops};
use dbmeta_model::kinds::{ProcedureColumnRole, ProcedureKind};
use dbmeta_model::rows::{
    ColumnRow, ForeignKeyRow, IndexRow, PrimaryKeyRow, ProcedureColumnRow, ProcedureRow, SchemaRow,
    TableRow,
};

/// Name of the catalog used by [`standard_catalog_source`].
pub const CATALOG: &str = "shop";

/// One catalog holding tables directly (no schema level), with columns,
/// keys, indexes and procedures registered for lazy loading.
pub fn standard_catalog_source() -> MockMetadataSource {
    let c = Some(CATALOG);
    MockMetadataSource::new()
        .add_catalog(CATALOG)
        .add_table(c, None, TableRow::new("users").with_kind("TABLE").with_remarks("accounts"))
        .add_table(c, None, TableRow::new("orders").with_kind("TABLE"))
        .add_table(c, None, TableRow::new("v_user_emails").with_kind("VIEW"))
        .add_table(c, None, TableRow::new("sys_config").with_kind("SYSTEM TABLE"))
        .add_column(c, None, ColumnRow::new("users", "id", "BIGINT", 1).not_null().auto_increment())
        .add_column(c, None, ColumnRow::new("users", "email", "VARCHAR", 2).not_null().with_size(255))
        .add_column(c, None, ColumnRow::new("users", "name", "VARCHAR", 3).with_size(100))
        .add_column(c, None, ColumnRow::new("orders", "id", "BIGINT", 1).not_null())
        .add_column(c, None, ColumnRow::new("orders", "user_id", "BIGINT", 2).not_null())
        .add_column(c, None, ColumnRow::new("orders", "total", "DECIMAL", 3))
        .add_column(c, None, ColumnRow::new("v_user_emails", "email", "VARCHAR", 1))
        .add_column(c, None, ColumnRow::new("sys_config", "key", "VARCHAR", 1))
        .add_primary_key(c, None, "users", PrimaryKeyRow::new("id", 1).with_name("pk_users"))
        .add_primary_key(c, None, "orders", PrimaryKeyRow::new("id", 1).with_name("pk_orders"))
        .add_foreign_key(
            c,
            None,
            ForeignKeyRow::new("users", "id", "orders", "user_id", 1)
                .with_fk_name("fk_orders_user")
                .with_pk_name("pk_users")
                .with_pk_scope(Some(CATALOG), None::<String>),
        )
        .add_index(c, None, IndexRow::new("users", "idx_users_email", 1, "email").unique())
        .add_index(c, None, IndexRow::new("users", "idx_users_name_email", 1, "name"))
        .add_index(c, None, IndexRow::new("users", "idx_users_name_email", 2, "email"))
        .add_procedure(c, None, ProcedureRow::new("get_user", ProcedureKind::Procedure))
        .add_procedure(c, None, ProcedureRow::new("count_users", ProcedureKind::Function))
        .add_procedure_column(
            c,
            None,
            ProcedureColumnRow::new("get_user", "user_id", ProcedureColumnRole::In, 1)
                .with_type_name("BIGINT"),
        )
        .add_procedure_column(
            c,
            None,
            ProcedureColumnRow::new("count_users", "", ProcedureColumnRole::Return, 0)
                .with_type_name("BIGINT"),
        )
}

/// A backend with root-level schemas and no catalogs.
pub fn standard_schema_source() -> MockMetadataSource {
    MockMetadataSource::new()
        .unsupported(ops::CATALOGS)
        .add_schema(None, SchemaRow::new("public"))
        .add_schema(None, SchemaRow::new("analytics"))
        .add_table(None, Some("public"), TableRow::new("users").with_kind("TABLE"))
        .add_column(None, Some("public"), ColumnRow::new("users", "id", "INTEGER", 1).not_null())
        .add_table(None, Some("analytics"), TableRow::new("events").with_kind("TABLE"))
        .add_column(
            None,
            Some("analytics"),
            ColumnRow::new("events", "ts", "TIMESTAMP", 1).not_null(),
        )
}

/// A backend with neither catalogs nor schemas; tables hang directly off
/// the data source.
pub fn flat_source() -> MockMetadataSource {
    MockMetadataSource::new()
        .unsupported(ops::CATALOGS)
        .unsupported(ops::SCHEMAS)
        .add_table(None, None, TableRow::new("notes").with_kind("TABLE"))
        .add_column(None, None, ColumnRow::new("notes", "id", "INTEGER", 1).not_null())
        .add_column(None, None, ColumnRow::new("notes", "body", "TEXT", 2))
}
