// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! End-to-end tests of the catalog model against a mock metadata source.

use std::sync::{Arc, Mutex};

use dbmeta_core::{
    DataSource, DataSourceOptions, LifecycleState, MetaError, NullMonitor, ObjectEvent,
    QUERY_GET_ACTIVE_DB, QUERY_SET_ACTIVE_DB, StructureContainer, StructureScope,
};
use dbmeta_model::kinds::{ConstraintType, ProcedureKind};
use dbmeta_model::rows::{ColumnRow, ForeignKeyRow, SchemaRow, TableRow};
use dbmeta_test_utils::{CancelAfter, MockMetadataSource, fixtures, ops};

async fn catalog_ds() -> (DataSource, Arc<MockMetadataSource>) {
    build_ds(fixtures::standard_catalog_source(), DataSourceOptions::new()).await
}

async fn build_ds(
    source: MockMetadataSource,
    options: DataSourceOptions,
) -> (DataSource, Arc<MockMetadataSource>) {
    let src = Arc::new(source);
    let ds = DataSource::new("test", src.clone(), options);
    ds.initialize(&NullMonitor).await.unwrap();
    (ds, src)
}

#[tokio::test]
async fn test_initialize_reads_capabilities() {
    let (ds, src) = catalog_ds().await;
    assert_eq!(ds.state(), LifecycleState::Ready);
    assert_eq!(ds.info().unwrap().product_name, "MockDB");
    assert_eq!(ds.table_types(), vec!["TABLE", "VIEW"]);
    assert_eq!(src.calls.snapshot().general_info, 1);

    // Idempotent once ready.
    ds.initialize(&NullMonitor).await.unwrap();
    assert_eq!(src.calls.snapshot().general_info, 1);
}

#[tokio::test]
async fn test_table_types_deduplicated_first_seen() {
    let source = fixtures::standard_catalog_source()
        .with_table_types(vec!["TABLE", "VIEW", "table", "VIEW"]);
    let (ds, _) = build_ds(source, DataSourceOptions::new()).await;
    assert_eq!(ds.table_types(), vec!["TABLE", "VIEW"]);
}

#[tokio::test]
async fn test_tables_loaded_once_and_cached() {
    let (ds, src) = catalog_ds().await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, fixtures::CATALOG).await.unwrap().unwrap();

    let first = catalog.tables(&monitor).await.unwrap();
    let second = catalog.tables(&monitor).await.unwrap();
    assert_eq!(first.len(), second.len());
    assert_eq!(src.calls.snapshot().tables, 1);

    let names: Vec<&str> = first.iter().map(|t| t.name()).collect();
    assert_eq!(names, vec!["users", "orders", "v_user_emails"]);
    assert!(first[2].is_view());
    assert!(!first[0].is_view());
    assert_eq!(first[0].remarks(), Some("accounts"));
}

#[tokio::test]
async fn test_system_tables_hidden_unless_requested() {
    let (ds, _) = catalog_ds().await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, fixtures::CATALOG).await.unwrap().unwrap();
    assert!(catalog.table(&monitor, "sys_config").await.unwrap().is_none());

    let (ds, _) = build_ds(
        fixtures::standard_catalog_source(),
        DataSourceOptions::new().show_system_objects(),
    )
    .await;
    let catalog = ds.catalog(&monitor, fixtures::CATALOG).await.unwrap().unwrap();
    let sys = catalog.table(&monitor, "sys_config").await.unwrap().unwrap();
    assert!(sys.is_system());
}

#[tokio::test]
async fn test_non_table_kinds_dropped_from_enumeration() {
    let source = MockMetadataSource::new()
        .add_catalog("db1")
        .add_table(Some("db1"), None, TableRow::new("t1").with_kind("TABLE"))
        .add_table(Some("db1"), None, TableRow::new("seq_t1").with_kind("SEQUENCE"))
        .add_table(Some("db1"), None, TableRow::new("idx_seg").with_kind("index"));
    let (ds, _) = build_ds(source, DataSourceOptions::new()).await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, "db1").await.unwrap().unwrap();
    let tables = catalog.tables(&monitor).await.unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].name(), "t1");
}

#[tokio::test]
async fn test_catalog_backend_never_lists_root_schemas() {
    let (ds, src) = catalog_ds().await;
    assert_eq!(src.calls.snapshot().schemas, 0);
    assert!(ds.schemas(&NullMonitor).await.unwrap().is_empty());
    assert_eq!(src.calls.snapshot().schemas, 0);
}

#[tokio::test]
async fn test_schema_level_backend() {
    let (ds, _) = build_ds(fixtures::standard_schema_source(), DataSourceOptions::new()).await;
    let monitor = NullMonitor;
    assert!(ds.catalogs(&monitor).await.unwrap().is_empty());

    let schemas = ds.schemas(&monitor).await.unwrap();
    let names: Vec<&str> = schemas.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["public", "analytics"]);

    let public = ds.schema(&monitor, "public").await.unwrap().unwrap();
    let tables = public.tables(&monitor).await.unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].full_name(), "public.users");
}

#[tokio::test]
async fn test_flat_backend_serves_tables_directly() {
    let (ds, _) = build_ds(fixtures::flat_source(), DataSourceOptions::new()).await;
    let monitor = NullMonitor;
    let children = ds.children(&monitor).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name(), "notes");

    let notes = ds.table(&monitor, "notes").await.unwrap().unwrap();
    let columns = notes.columns(&monitor).await.unwrap();
    assert_eq!(columns.len(), 2);
    assert_eq!(notes.full_name(), "notes");
}

#[tokio::test]
async fn test_columns_loaded_once_in_reported_order() {
    let (ds, src) = catalog_ds().await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, fixtures::CATALOG).await.unwrap().unwrap();
    let users = catalog.table(&monitor, "users").await.unwrap().unwrap();

    let columns = users.columns(&monitor).await.unwrap();
    users.columns(&monitor).await.unwrap();
    assert_eq!(src.calls.snapshot().columns, 1);

    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "email", "name"]);
    assert!(columns[0].auto_increment);
    assert!(!columns[0].nullable);

    let email = users.column(&monitor, "email").await.unwrap().unwrap();
    assert_eq!(email.size, Some(255));
}

#[tokio::test]
async fn test_primary_key_resolution() {
    let (ds, _) = catalog_ds().await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, fixtures::CATALOG).await.unwrap().unwrap();
    let users = catalog.table(&monitor, "users").await.unwrap().unwrap();

    let pk = users.primary_key(&monitor).await.unwrap().unwrap();
    assert_eq!(pk.name.as_deref(), Some("pk_users"));
    assert_eq!(pk.constraint_type, ConstraintType::PrimaryKey);
    assert_eq!(pk.columns.len(), 1);
    assert_eq!(pk.columns[0].column.name, "id");
}

#[tokio::test]
async fn test_composite_index_grouping() {
    let (ds, _) = catalog_ds().await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, fixtures::CATALOG).await.unwrap().unwrap();
    let users = catalog.table(&monitor, "users").await.unwrap().unwrap();

    let indexes = users.indexes(&monitor).await.unwrap();
    assert_eq!(indexes.len(), 2);

    let email_idx = &indexes[0];
    assert_eq!(email_idx.name, "idx_users_email");
    assert!(email_idx.unique);
    assert_eq!(email_idx.columns.len(), 1);

    let composite = &indexes[1];
    assert_eq!(composite.name, "idx_users_name_email");
    let column_names: Vec<&str> = composite.columns.iter().map(|c| c.column.name.as_str()).collect();
    assert_eq!(column_names, vec!["name", "email"]);
    assert_eq!(composite.columns[0].ordinal, 1);
    assert_eq!(composite.columns[1].ordinal, 2);
    // The index column is the same object the table publishes.
    let email = users.column(&monitor, "email").await.unwrap().unwrap();
    assert!(Arc::ptr_eq(&composite.columns[1].column, &email));
}

#[tokio::test]
async fn test_foreign_key_links_both_directions() {
    let (ds, _) = catalog_ds().await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, fixtures::CATALOG).await.unwrap().unwrap();
    let orders = catalog.table(&monitor, "orders").await.unwrap().unwrap();
    let users = catalog.table(&monitor, "users").await.unwrap().unwrap();

    let fks = orders.foreign_keys(&monitor).await.unwrap();
    assert_eq!(fks.len(), 1);
    let fk = &fks[0];
    assert_eq!(fk.name.as_deref(), Some("fk_orders_user"));
    assert_eq!(fk.referenced_table, "users");
    assert_eq!(fk.referenced_key.name.as_deref(), Some("pk_users"));
    assert_eq!(fk.columns.len(), 1);
    assert_eq!(fk.columns[0].column.name, "user_id");
    assert_eq!(fk.columns[0].referenced.name, "id");

    // The referenced key is the very object the referenced table owns.
    let pk = users.primary_key(&monitor).await.unwrap().unwrap();
    assert!(Arc::ptr_eq(&fk.referenced_key, &pk));

    // Exported direction resolves to the same key object.
    let references = users.references(&monitor).await.unwrap();
    assert_eq!(references.len(), 1);
    assert!(Arc::ptr_eq(&references[0], fk));
}

#[tokio::test]
async fn test_orphan_foreign_key_is_skipped() {
    let source = fixtures::standard_catalog_source().add_foreign_key(
        Some(fixtures::CATALOG),
        None,
        ForeignKeyRow::new("ghosts", "id", "orders", "ghost_id", 1)
            .with_fk_name("fk_orders_ghost")
            .with_pk_scope(Some(fixtures::CATALOG), None::<String>),
    );
    let (ds, _) = build_ds(source, DataSourceOptions::new()).await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, fixtures::CATALOG).await.unwrap().unwrap();
    let orders = catalog.table(&monitor, "orders").await.unwrap().unwrap();

    let fks = orders.foreign_keys(&monitor).await.unwrap();
    assert_eq!(fks.len(), 1);
    assert_eq!(fks[0].name.as_deref(), Some("fk_orders_user"));
}

#[tokio::test]
async fn test_referenced_key_synthesized_when_not_reported() {
    let c = Some("shop");
    let source = MockMetadataSource::new()
        .add_catalog("shop")
        .add_table(c, None, TableRow::new("users").with_kind("TABLE"))
        .add_table(c, None, TableRow::new("orders").with_kind("TABLE"))
        .add_column(c, None, ColumnRow::new("users", "id", "BIGINT", 1).not_null())
        .add_column(c, None, ColumnRow::new("orders", "user_id", "BIGINT", 1))
        .add_foreign_key(
            c,
            None,
            ForeignKeyRow::new("users", "id", "orders", "user_id", 1)
                .with_fk_name("fk_orders_user")
                .with_pk_name("pk_users")
                .with_pk_scope(Some("shop"), None::<String>),
        );
    let (ds, _) = build_ds(source, DataSourceOptions::new()).await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, "shop").await.unwrap().unwrap();
    let users = catalog.table(&monitor, "users").await.unwrap().unwrap();
    let orders = catalog.table(&monitor, "orders").await.unwrap().unwrap();

    // The backend reports no keys for users.
    assert!(users.constraints(&monitor).await.unwrap().is_empty());

    let fks = orders.foreign_keys(&monitor).await.unwrap();
    assert_eq!(fks.len(), 1);
    let key = &fks[0].referenced_key;
    assert_eq!(key.constraint_type, ConstraintType::UniqueKey);
    assert_eq!(key.name.as_deref(), Some("pk_users"));
    assert_eq!(key.columns[0].column.name, "id");

    // The synthesized key became visible on the referenced table.
    let constraints = users.constraints(&monitor).await.unwrap();
    assert_eq!(constraints.len(), 1);
    assert!(Arc::ptr_eq(&constraints[0], key));
}

#[tokio::test]
async fn test_unsupported_index_enumeration_degrades_to_empty() {
    let source = fixtures::standard_catalog_source().unsupported(ops::INDEXES);
    let (ds, _) = build_ds(source, DataSourceOptions::new()).await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, fixtures::CATALOG).await.unwrap().unwrap();
    let users = catalog.table(&monitor, "users").await.unwrap().unwrap();
    assert!(users.indexes(&monitor).await.unwrap().is_empty());
    assert!(catalog.indexes(&monitor).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_column_load_leaves_cache_retryable() {
    let (ds, src) = catalog_ds().await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, fixtures::CATALOG).await.unwrap().unwrap();
    let users = catalog.table(&monitor, "users").await.unwrap().unwrap();

    src.set_failing(ops::COLUMNS, true);
    let err = users.columns(&monitor).await.unwrap_err();
    assert!(matches!(err, MetaError::Fetch { .. }));

    src.set_failing(ops::COLUMNS, false);
    let columns = users.columns(&monitor).await.unwrap();
    assert_eq!(columns.len(), 3);
    assert_eq!(src.calls.snapshot().columns, 2);
}

#[tokio::test]
async fn test_failed_table_scan_leaves_cache_retryable() {
    let (ds, src) = catalog_ds().await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, fixtures::CATALOG).await.unwrap().unwrap();

    src.set_failing(ops::TABLES, true);
    let err = catalog.tables(&monitor).await.unwrap_err();
    assert!(matches!(err, MetaError::Fetch { .. }));

    src.set_failing(ops::TABLES, false);
    let tables = catalog.tables(&monitor).await.unwrap();
    assert_eq!(tables.len(), 3);
    assert_eq!(src.calls.snapshot().tables, 2);
}

#[tokio::test]
async fn test_failed_procedure_scan_leaves_cache_retryable() {
    let (ds, src) = catalog_ds().await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, fixtures::CATALOG).await.unwrap().unwrap();

    src.set_failing(ops::PROCEDURES, true);
    let err = catalog.procedures(&monitor).await.unwrap_err();
    assert!(matches!(err, MetaError::Fetch { .. }));

    src.set_failing(ops::PROCEDURES, false);
    assert_eq!(catalog.procedures(&monitor).await.unwrap().len(), 2);
    assert_eq!(src.calls.snapshot().procedures, 2);
}

#[tokio::test]
async fn test_unsupported_table_enumeration_degrades_to_empty() {
    let source = MockMetadataSource::new()
        .add_catalog("db1")
        .unsupported(ops::TABLES);
    let (ds, _) = build_ds(source, DataSourceOptions::new()).await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, "db1").await.unwrap().unwrap();
    assert!(catalog.tables(&monitor).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_canceled_table_scan_reissues_enumeration() {
    let (ds, src) = catalog_ds().await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, fixtures::CATALOG).await.unwrap().unwrap();

    let canceling = CancelAfter::new(2);
    let err = catalog.tables(&canceling).await.unwrap_err();
    assert!(matches!(err, MetaError::Canceled));
    assert_eq!(src.calls.snapshot().tables, 1);

    // Interrupted fill published nothing; the next access enumerates again.
    let tables = catalog.tables(&monitor).await.unwrap();
    assert_eq!(tables.len(), 3);
    assert_eq!(src.calls.snapshot().tables, 2);
}

#[tokio::test]
async fn test_container_refresh_is_targeted() {
    let (ds, src) = catalog_ds().await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, fixtures::CATALOG).await.unwrap().unwrap();

    catalog.tables(&monitor).await.unwrap();
    catalog.refresh().await.unwrap();
    catalog.tables(&monitor).await.unwrap();
    assert_eq!(src.calls.snapshot().tables, 2);
    // The refresh touched nothing above the container.
    assert_eq!(src.calls.snapshot().catalogs, 1);
}

#[tokio::test]
async fn test_refresh_leaves_sibling_containers_cached() {
    let (ds, src) = build_ds(fixtures::standard_schema_source(), DataSourceOptions::new()).await;
    let monitor = NullMonitor;
    let public = ds.schema(&monitor, "public").await.unwrap().unwrap();
    let analytics = ds.schema(&monitor, "analytics").await.unwrap().unwrap();

    public.tables(&monitor).await.unwrap();
    analytics.tables(&monitor).await.unwrap();
    assert_eq!(src.calls.snapshot().tables, 2);

    public.refresh().await.unwrap();
    public.tables(&monitor).await.unwrap();
    analytics.tables(&monitor).await.unwrap();
    // Only the refreshed schema re-enumerated.
    assert_eq!(src.calls.snapshot().tables, 3);
}

#[tokio::test]
async fn test_datasource_refresh_rebuilds_topology() {
    let (ds, src) = catalog_ds().await;
    let monitor = NullMonitor;
    ds.catalogs(&monitor).await.unwrap();

    ds.refresh(&monitor).await.unwrap();
    assert_eq!(ds.state(), LifecycleState::Ready);
    assert_eq!(src.calls.snapshot().catalogs, 2);
    assert_eq!(src.calls.snapshot().general_info, 2);
}

#[tokio::test]
async fn test_canceled_refresh_reinitializes_on_next_access() {
    let (ds, src) = catalog_ds().await;
    let monitor = NullMonitor;
    assert_eq!(ds.catalogs(&monitor).await.unwrap().len(), 1);

    let canceling = CancelAfter::new(0);
    let err = ds.refresh(&canceling).await.unwrap_err();
    assert!(matches!(err, MetaError::Canceled));
    assert_ne!(ds.state(), LifecycleState::Ready);

    // The cleared topology is not served; the next access re-enumerates.
    let catalogs = ds.catalogs(&monitor).await.unwrap();
    assert_eq!(catalogs.len(), 1);
    assert_eq!(ds.state(), LifecycleState::Ready);
    assert_eq!(src.calls.snapshot().catalogs, 2);
}

#[tokio::test]
async fn test_table_refresh_drops_children() {
    let (ds, src) = catalog_ds().await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, fixtures::CATALOG).await.unwrap().unwrap();
    let users = catalog.table(&monitor, "users").await.unwrap().unwrap();

    users.columns(&monitor).await.unwrap();
    users.refresh();
    users.columns(&monitor).await.unwrap();
    assert_eq!(src.calls.snapshot().columns, 2);
}

#[tokio::test]
async fn test_bulk_structure_scan_feeds_table_columns() {
    let (ds, src) = catalog_ds().await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, fixtures::CATALOG).await.unwrap().unwrap();

    catalog.cache_structure(&monitor, StructureScope::Full).await.unwrap();
    assert_eq!(src.calls.snapshot().columns, 1);

    let users = catalog.table(&monitor, "users").await.unwrap().unwrap();
    let columns = users.columns(&monitor).await.unwrap();
    assert_eq!(columns.len(), 3);
    // Served from the bulk scan, no per-table call.
    assert_eq!(src.calls.snapshot().columns, 1);
}

#[tokio::test]
async fn test_container_index_view_holds_detached_copies() {
    let (ds, _) = catalog_ds().await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, fixtures::CATALOG).await.unwrap().unwrap();
    let users = catalog.table(&monitor, "users").await.unwrap().unwrap();

    let aggregated = catalog.indexes(&monitor).await.unwrap();
    assert_eq!(aggregated.len(), 2);
    let owned = users.indexes(&monitor).await.unwrap();
    let copy = aggregated.iter().find(|i| i.name == "idx_users_email").unwrap();
    let original = owned.iter().find(|i| i.name == "idx_users_email").unwrap();
    assert!(!Arc::ptr_eq(copy, original));
    assert_eq!(copy.columns.len(), original.columns.len());
    // The copy still shares the table's column objects.
    assert!(Arc::ptr_eq(&copy.columns[0].column, &original.columns[0].column));
}

#[tokio::test]
async fn test_bulk_index_scan_feeds_table_indexes() {
    let (ds, src) = catalog_ds().await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, fixtures::CATALOG).await.unwrap().unwrap();

    catalog.cache_indexes(&monitor).await.unwrap();
    assert_eq!(src.calls.snapshot().indexes, 1);

    let users = catalog.table(&monitor, "users").await.unwrap().unwrap();
    assert_eq!(users.indexes(&monitor).await.unwrap().len(), 2);
    let orders = catalog.table(&monitor, "orders").await.unwrap().unwrap();
    assert!(orders.indexes(&monitor).await.unwrap().is_empty());
    assert_eq!(src.calls.snapshot().indexes, 1);
}

#[tokio::test]
async fn test_bulk_procedure_column_scan() {
    let (ds, src) = catalog_ds().await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, fixtures::CATALOG).await.unwrap().unwrap();

    let procedures = catalog.procedures(&monitor).await.unwrap();
    assert_eq!(procedures.len(), 2);

    catalog.cache_procedure_columns(&monitor).await.unwrap();
    assert_eq!(src.calls.snapshot().procedure_columns, 1);

    let get_user = catalog.procedure(&monitor, "get_user").await.unwrap().unwrap();
    assert_eq!(get_user.kind(), ProcedureKind::Procedure);
    let columns = get_user.columns(&monitor).await.unwrap();
    assert_eq!(columns.len(), 1);
    assert_eq!(columns[0].name, "user_id");

    let count_users = catalog.procedure(&monitor, "count_users").await.unwrap().unwrap();
    let columns = count_users.columns(&monitor).await.unwrap();
    assert_eq!(columns[0].name, "RETURN");
    assert_eq!(src.calls.snapshot().procedure_columns, 1);
}

#[tokio::test]
async fn test_find_table_with_and_without_scope() {
    let (ds, _) = catalog_ds().await;
    let monitor = NullMonitor;

    let scoped = ds
        .find_table(&monitor, Some(fixtures::CATALOG), None, "users")
        .await
        .unwrap();
    assert!(scoped.is_some());

    // A single-catalog source resolves unscoped names through that catalog.
    let unscoped = ds.find_table(&monitor, None, None, "users").await.unwrap();
    assert!(unscoped.is_some());

    assert!(ds.find_table(&monitor, Some("nope"), None, "users").await.unwrap().is_none());
    assert!(ds
        .find_table(&monitor, Some(fixtures::CATALOG), None, "nope")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_find_table_through_schema_scope() {
    let (ds, _) = build_ds(fixtures::standard_schema_source(), DataSourceOptions::new()).await;
    let monitor = NullMonitor;
    let events = ds
        .find_table(&monitor, None, Some("analytics"), "events")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(events.full_name(), "analytics.events");
    assert!(ds
        .find_table(&monitor, None, Some("nope"), "events")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_schema_rows_claiming_other_catalog_are_kept() {
    let source = MockMetadataSource::new()
        .add_catalog("db1")
        .add_schema(Some("db1"), SchemaRow::new("plain"))
        .add_schema(Some("db1"), SchemaRow::new("stray").with_catalog("other"));
    let (ds, _) = build_ds(source, DataSourceOptions::new()).await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, "db1").await.unwrap().unwrap();
    let schemas = catalog.schemas(&monitor).await.unwrap();
    let names: Vec<&str> = schemas.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["plain", "stray"]);
    // The parent catalog wins over what the row claimed.
    assert_eq!(schemas[1].catalog_name(), Some("db1"));
}

#[tokio::test]
async fn test_catalog_with_schemas_owns_no_tables() {
    let source = MockMetadataSource::new()
        .add_catalog("db1")
        .add_schema(Some("db1"), SchemaRow::new("public"))
        .add_table(Some("db1"), Some("public"), TableRow::new("users").with_kind("TABLE"));
    let (ds, src) = build_ds(source, DataSourceOptions::new()).await;
    let monitor = NullMonitor;
    let catalog = ds.catalog(&monitor, "db1").await.unwrap().unwrap();

    assert!(catalog.tables(&monitor).await.unwrap().is_empty());
    assert_eq!(src.calls.snapshot().tables, 0);

    let public = catalog.schema(&monitor, "public").await.unwrap().unwrap();
    assert_eq!(public.tables(&monitor).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_active_child_read_once() {
    let options = DataSourceOptions::new()
        .with_query(QUERY_GET_ACTIVE_DB, "SELECT DATABASE()")
        .with_query(QUERY_SET_ACTIVE_DB, "USE ?");
    let source = fixtures::standard_catalog_source().with_active(fixtures::CATALOG);
    let (ds, src) = build_ds(source, options).await;
    let monitor = NullMonitor;

    let active = ds.active_child(&monitor).await.unwrap().unwrap();
    assert_eq!(active.name(), fixtures::CATALOG);

    ds.active_child(&monitor).await.unwrap();
    assert_eq!(src.calls.snapshot().scalar_queries, 1);
}

#[tokio::test]
async fn test_active_child_without_query_is_none() {
    let (ds, src) = catalog_ds().await;
    assert!(ds.active_child(&NullMonitor).await.unwrap().is_none());
    assert_eq!(src.calls.snapshot().scalar_queries, 0);
}

#[tokio::test]
async fn test_set_active_child_round_trip() {
    let options = DataSourceOptions::new()
        .with_query(QUERY_GET_ACTIVE_DB, "SELECT DATABASE()")
        .with_query(QUERY_SET_ACTIVE_DB, "USE ?");
    let source = fixtures::standard_catalog_source()
        .add_catalog("archive")
        .with_active(fixtures::CATALOG);
    let (ds, src) = build_ds(source, options).await;
    let monitor = NullMonitor;

    let changed: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = changed.clone();
    ds.add_listener(Box::new(move |event| {
        let ObjectEvent::ActiveChildChanged { name } = event;
        sink.lock().unwrap().push(name.clone());
    }));

    ds.active_child(&monitor).await.unwrap();
    let archive = ds.child(&monitor, "archive").await.unwrap().unwrap();

    ds.set_active_child(&monitor, &archive).await.unwrap();
    assert_eq!(src.executed(), vec!["USE archive"]);
    assert_eq!(*changed.lock().unwrap(), vec!["shop", "archive"]);

    // Cached without another round-trip.
    let active = ds.active_child(&monitor).await.unwrap().unwrap();
    assert_eq!(active.name(), "archive");
    assert_eq!(src.calls.snapshot().scalar_queries, 1);
}

#[tokio::test]
async fn test_set_active_child_to_current_is_a_no_op() {
    let options = DataSourceOptions::new()
        .with_query(QUERY_GET_ACTIVE_DB, "SELECT DATABASE()")
        .with_query(QUERY_SET_ACTIVE_DB, "USE ?");
    let source = fixtures::standard_catalog_source().with_active(fixtures::CATALOG);
    let (ds, src) = build_ds(source, options).await;
    let monitor = NullMonitor;

    let changed: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = changed.clone();
    ds.add_listener(Box::new(move |event| {
        let ObjectEvent::ActiveChildChanged { name } = event;
        sink.lock().unwrap().push(name.clone());
    }));

    let current = ds.active_child(&monitor).await.unwrap().unwrap();
    ds.set_active_child(&monitor, &current).await.unwrap();
    assert!(src.executed().is_empty());
    assert!(changed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_set_active_child_rejects_foreign_object() {
    let options = DataSourceOptions::new().with_query(QUERY_SET_ACTIVE_DB, "USE ?");
    let (ds, _) = build_ds(fixtures::standard_catalog_source(), options).await;
    let (other_ds, _) = build_ds(
        MockMetadataSource::new().add_catalog("elsewhere"),
        DataSourceOptions::new(),
    )
    .await;
    let monitor = NullMonitor;

    let stranger = other_ds.children(&monitor).await.unwrap().pop().unwrap();
    let err = ds.set_active_child(&monitor, &stranger).await.unwrap_err();
    assert!(matches!(err, MetaError::NotAChild { .. }));
}

#[tokio::test]
async fn test_set_active_child_without_query_is_an_error() {
    let (ds, _) = catalog_ds().await;
    let monitor = NullMonitor;
    let child = ds.children(&monitor).await.unwrap().pop().unwrap();
    let err = ds.set_active_child(&monitor, &child).await.unwrap_err();
    assert!(matches!(err, MetaError::ActiveChildUnsupported));
}
