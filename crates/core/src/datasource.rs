// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # The data source: root of the catalog model
//!
//! A [`DataSource`] wraps one [`MetadataSource`] adapter and owns the whole
//! object graph populated from it. Initialization fetches the capability
//! information, the table-kind labels and the top-level containers; every
//! deeper level is loaded lazily by the containers themselves.
//!
//! Top-level layout follows what the backend reports, in order of
//! precedence: catalogs if any, otherwise root-level schemas, otherwise the
//! data source itself acts as the single structure container.
//!
//! Entities hold [`Weak`] back-pointers to [`DataSourceInner`]; dropping the
//! data source invalidates the graph instead of leaking it through
//! reference cycles.

use std::collections::HashSet;
use std::sync::{Arc, RwLock, Weak};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::catalog::Catalog;
use crate::container::{
    ContainerCore, ContainerPath, StructureChild, StructureContainer, StructureScope,
};
use crate::error::{MetaError, MetaResult, optional};
use crate::procedure::Procedure;
use crate::progress::{ProgressMonitor, ScanGuard, check_canceled};
use crate::schema::Schema;
use crate::source::{DriverQueries, MetadataSource, QUERY_GET_ACTIVE_DB, QUERY_SET_ACTIVE_DB};
use crate::table::Table;
use dbmeta_model::entity::Index;
use dbmeta_model::find_named;
use dbmeta_model::rows::SourceInfo;

/// Behavior switches for one data source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourceOptions {
    /// Expose system tables and schemas. Off by default.
    pub show_system_objects: bool,
    /// Driver-specific queries (active database get/set).
    pub queries: DriverQueries,
}

impl DataSourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_system_objects(mut self) -> Self {
        self.show_system_objects = true;
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, sql: impl Into<String>) -> Self {
        self.queries = self.queries.with_query(key, sql);
        self
    }
}

/// Connection lifecycle of a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Disconnected,
    Connecting,
    Initializing,
    Ready,
    Refreshing,
    Failed,
}

/// Model change notification delivered to registered listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectEvent {
    /// A top-level child's selected/active status changed.
    ActiveChildChanged { name: String },
}

pub type ObjectListener = Box<dyn Fn(&ObjectEvent) + Send + Sync>;

struct ActiveSlot {
    /// Whether the active-database query has been issued (or found absent).
    read: bool,
    child: Option<StructureChild>,
}

/// Shared state behind a [`DataSource`]. Entities point here through
/// [`Weak`] references.
pub struct DataSourceInner {
    pub(crate) name: String,
    pub(crate) source: Arc<dyn MetadataSource>,
    pub(crate) options: DataSourceOptions,
    state: RwLock<LifecycleState>,
    info: RwLock<Option<SourceInfo>>,
    table_types: RwLock<Vec<String>>,
    catalogs: RwLock<Option<Vec<Arc<Catalog>>>>,
    schemas: RwLock<Option<Vec<Arc<Schema>>>>,
    pub(crate) core: ContainerCore,
    active: Mutex<ActiveSlot>,
    listeners: RwLock<Vec<ObjectListener>>,
}

/// Upgrade an entity's back-pointer, failing cleanly when the owning data
/// source has been dropped.
pub(crate) fn upgrade(datasource: &Weak<DataSourceInner>) -> MetaResult<Arc<DataSourceInner>> {
    datasource
        .upgrade()
        .ok_or_else(|| MetaError::Backend("data source has been closed".into()))
}

impl DataSourceInner {
    fn weak(&self) -> Weak<DataSourceInner> {
        self.core.datasource.clone()
    }

    pub(crate) fn state(&self) -> LifecycleState {
        *self.state.read().expect("state lock poisoned")
    }

    fn set_state(&self, state: LifecycleState) {
        *self.state.write().expect("state lock poisoned") = state;
    }

    pub(crate) async fn initialize(&self, monitor: &dyn ProgressMonitor) -> MetaResult<()> {
        let previous = self.state();
        if previous == LifecycleState::Ready {
            return Ok(());
        }
        self.set_state(LifecycleState::Connecting);
        match self.init_inner(monitor).await {
            Ok(()) => {
                self.set_state(LifecycleState::Ready);
                tracing::info!(datasource = %self.name, "data source initialized");
                Ok(())
            }
            Err(MetaError::Canceled) => {
                self.set_state(previous);
                Err(MetaError::Canceled)
            }
            Err(err) => {
                self.set_state(LifecycleState::Failed);
                tracing::error!(datasource = %self.name, error = %err, "initialization failed");
                Err(err)
            }
        }
    }

    async fn init_inner(&self, monitor: &dyn ProgressMonitor) -> MetaResult<()> {
        let _guard = ScanGuard::begin(monitor, "Initialize data source", 3);
        check_canceled(monitor)?;

        monitor.sub_task("Read capability information");
        let info = self.source.general_info().await?;
        tracing::debug!(
            datasource = %self.name,
            product = %info.product_name,
            version = %info.product_version,
            "connected"
        );
        *self.info.write().expect("info lock poisoned") = Some(info);
        if self.state() == LifecycleState::Connecting {
            self.set_state(LifecycleState::Initializing);
        }
        monitor.worked(1);
        check_canceled(monitor)?;

        let mut types = optional("list table types", self.source.list_table_types().await)?;
        let mut seen = HashSet::new();
        types.retain(|t| seen.insert(t.to_ascii_uppercase()));
        *self.table_types.write().expect("table types lock poisoned") = types;
        monitor.worked(1);
        check_canceled(monitor)?;

        // Catalogs first; root-level schemas only when there are none.
        monitor.sub_task("Extract catalogs");
        let catalog_names = optional("list catalogs", self.source.list_catalogs().await)?;
        let catalogs: Vec<Arc<Catalog>> = catalog_names
            .into_iter()
            .filter(|n| !n.is_empty())
            .map(|n| Arc::new(Catalog::new(self.weak(), n)))
            .collect();
        let schemas = if catalogs.is_empty() {
            monitor.sub_task("Extract schemas");
            check_canceled(monitor)?;
            let rows = optional("list schemas", self.source.list_schemas(None).await)?;
            rows.into_iter()
                .map(|r| {
                    if let Some(catalog) = r.catalog.as_deref() {
                        tracing::warn!(
                            datasource = %self.name,
                            catalog = %catalog,
                            schema = %r.schema,
                            "schema row names a catalog but none was requested"
                        );
                    }
                    Arc::new(Schema::new(self.weak(), None, r.schema))
                })
                .collect()
        } else {
            Vec::new()
        };
        *self.catalogs.write().expect("catalogs lock poisoned") = Some(catalogs);
        *self.schemas.write().expect("schemas lock poisoned") = Some(schemas);
        monitor.worked(1);
        Ok(())
    }

    pub(crate) async fn refresh(&self, monitor: &dyn ProgressMonitor) -> MetaResult<()> {
        self.set_state(LifecycleState::Refreshing);
        *self.catalogs.write().expect("catalogs lock poisoned") = None;
        *self.schemas.write().expect("schemas lock poisoned") = None;
        *self.info.write().expect("info lock poisoned") = None;
        self.table_types.write().expect("table types lock poisoned").clear();
        self.core.refresh().await;
        {
            let mut active = self.active.lock().await;
            active.read = false;
            active.child = None;
        }
        match self.init_inner(monitor).await {
            Ok(()) => {
                self.set_state(LifecycleState::Ready);
                tracing::info!(datasource = %self.name, "data source refreshed");
                Ok(())
            }
            Err(MetaError::Canceled) => {
                // The topology was already cleared; the next access must
                // re-initialize instead of serving the empty graph.
                self.set_state(LifecycleState::Disconnected);
                Err(MetaError::Canceled)
            }
            Err(err) => {
                self.set_state(LifecycleState::Failed);
                Err(err)
            }
        }
    }

    async fn ensure_initialized(&self, monitor: &dyn ProgressMonitor) -> MetaResult<()> {
        match self.state() {
            LifecycleState::Ready | LifecycleState::Refreshing => Ok(()),
            _ => self.initialize(monitor).await,
        }
    }

    pub(crate) async fn catalogs(
        &self,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Vec<Arc<Catalog>>> {
        self.ensure_initialized(monitor).await?;
        Ok(self
            .catalogs
            .read()
            .expect("catalogs lock poisoned")
            .clone()
            .unwrap_or_default())
    }

    pub(crate) async fn schemas(
        &self,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Vec<Arc<Schema>>> {
        self.ensure_initialized(monitor).await?;
        Ok(self
            .schemas
            .read()
            .expect("schemas lock poisoned")
            .clone()
            .unwrap_or_default())
    }

    /// The navigable top-level children: catalogs, or root schemas, or the
    /// data source's own tables.
    pub(crate) async fn children(
        &self,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Vec<StructureChild>> {
        let catalogs = self.catalogs(monitor).await?;
        if !catalogs.is_empty() {
            return Ok(catalogs.into_iter().map(StructureChild::Catalog).collect());
        }
        let schemas = self.schemas(monitor).await?;
        if !schemas.is_empty() {
            return Ok(schemas.into_iter().map(StructureChild::Schema).collect());
        }
        let tables = self.core.tables(monitor).await?;
        Ok(tables.into_iter().map(StructureChild::Table).collect())
    }

    /// Resolve one table anywhere in the graph by optional catalog and
    /// schema scope. An unresolvable scope yields `None` with a warning,
    /// never an error; foreign-key resolution leans on this.
    pub(crate) async fn find_table(
        &self,
        monitor: &dyn ProgressMonitor,
        catalog: Option<&str>,
        schema: Option<&str>,
        name: &str,
    ) -> MetaResult<Option<Arc<Table>>> {
        let catalogs = self.catalogs(monitor).await?;
        let scope_catalog = match catalog {
            Some(catalog_name) => match find_named(&catalogs, catalog_name) {
                Some(c) => Some(c.clone()),
                None => {
                    tracing::warn!(datasource = %self.name, catalog = %catalog_name, "catalog not found");
                    return Ok(None);
                }
            },
            // A single-catalog backend addresses everything through that
            // catalog even when rows omit it.
            None if catalogs.len() == 1 => Some(catalogs[0].clone()),
            None => None,
        };
        if let Some(scope_catalog) = scope_catalog {
            if let Some(schema_name) = schema {
                return match scope_catalog.schema(monitor, schema_name).await? {
                    Some(s) => s.table(monitor, name).await,
                    None => {
                        tracing::warn!(
                            catalog = %scope_catalog.name(),
                            schema = %schema_name,
                            "schema not found"
                        );
                        Ok(None)
                    }
                };
            }
            return scope_catalog.table(monitor, name).await;
        }
        if let Some(schema_name) = schema {
            let schemas = self.schemas(monitor).await?;
            return match find_named(&schemas, schema_name) {
                Some(s) => s.table(monitor, name).await,
                None => {
                    tracing::warn!(datasource = %self.name, schema = %schema_name, "schema not found");
                    Ok(None)
                }
            };
        }
        self.core.table(monitor, name).await
    }

    async fn child_by_name(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<StructureChild>> {
        let children = self.children(monitor).await?;
        Ok(children.into_iter().find(|c| c.name() == name))
    }

    /// The backend's currently selected top-level child, read once and
    /// cached until refresh. Drivers without the query report `None`.
    pub(crate) async fn active_child(
        &self,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Option<StructureChild>> {
        let mut slot = self.active.lock().await;
        if slot.read {
            return Ok(slot.child.clone());
        }
        if let Some(sql) = self.options.queries.get(QUERY_GET_ACTIVE_DB) {
            match self.source.run_scalar_query(sql).await {
                Ok(Some(name)) => {
                    slot.child = self.child_by_name(monitor, &name).await?;
                    if slot.child.is_none() {
                        tracing::warn!(
                            datasource = %self.name,
                            active = %name,
                            "active database is not a known child"
                        );
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(datasource = %self.name, error = %err, "active database query failed");
                }
            }
        }
        slot.read = true;
        Ok(slot.child.clone())
    }

    /// Switch the backend's selected child and update the cached value.
    pub(crate) async fn set_active_child(
        &self,
        monitor: &dyn ProgressMonitor,
        child: &StructureChild,
    ) -> MetaResult<()> {
        let children = self.children(monitor).await?;
        if !children.iter().any(|c| c.name() == child.name()) {
            return Err(MetaError::NotAChild {
                child: child.name().to_string(),
                datasource: self.name.clone(),
            });
        }
        {
            // Already the active child; nothing to execute or announce.
            let slot = self.active.lock().await;
            if slot.read
                && let Some(current) = &slot.child
                && current.name() == child.name()
            {
                return Ok(());
            }
        }
        let Some(sql) = self.options.queries.get(QUERY_SET_ACTIVE_DB) else {
            return Err(MetaError::ActiveChildUnsupported);
        };
        let statement = sql.replacen('?', child.name(), 1);
        self.source.execute(&statement).await?;
        let old = {
            let mut slot = self.active.lock().await;
            let old = slot.child.take();
            slot.child = Some(child.clone());
            slot.read = true;
            old
        };
        if let Some(old) = old
            && old.name() != child.name()
        {
            self.notify(&ObjectEvent::ActiveChildChanged {
                name: old.name().to_string(),
            });
        }
        self.notify(&ObjectEvent::ActiveChildChanged {
            name: child.name().to_string(),
        });
        Ok(())
    }

    fn notify(&self, event: &ObjectEvent) {
        for listener in self.listeners.read().expect("listeners lock poisoned").iter() {
            listener(event);
        }
    }
}

/// Root handle of the catalog model.
#[derive(Clone)]
pub struct DataSource {
    inner: Arc<DataSourceInner>,
}

impl DataSource {
    pub fn new(
        name: impl Into<String>,
        source: Arc<dyn MetadataSource>,
        options: DataSourceOptions,
    ) -> Self {
        let name = name.into();
        let inner = Arc::new_cyclic(|weak: &Weak<DataSourceInner>| DataSourceInner {
            name,
            source,
            options,
            state: RwLock::new(LifecycleState::Disconnected),
            info: RwLock::new(None),
            table_types: RwLock::new(Vec::new()),
            catalogs: RwLock::new(None),
            schemas: RwLock::new(None),
            core: ContainerCore::new(weak.clone(), ContainerPath::root()),
            active: Mutex::new(ActiveSlot {
                read: false,
                child: None,
            }),
            listeners: RwLock::new(Vec::new()),
        });
        Self { inner }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.state()
    }

    /// Capability information, available once initialized.
    pub fn info(&self) -> Option<SourceInfo> {
        self.inner.info.read().expect("info lock poisoned").clone()
    }

    /// Table-kind labels the backend supports, deduplicated, first-seen
    /// order preserved.
    pub fn table_types(&self) -> Vec<String> {
        self.inner
            .table_types
            .read()
            .expect("table types lock poisoned")
            .clone()
    }

    /// Connect-time scan: capability information, table types and the
    /// top-level containers. Idempotent once the source is ready.
    pub async fn initialize(&self, monitor: &dyn ProgressMonitor) -> MetaResult<()> {
        self.inner.initialize(monitor).await
    }

    /// Drop the whole cached graph and re-run the connect-time scan.
    /// Handed-out entities stay readable but are detached from the model.
    pub async fn refresh(&self, monitor: &dyn ProgressMonitor) -> MetaResult<()> {
        self.inner.refresh(monitor).await
    }

    /// Disconnect: drop the cached graph and return to the initial state.
    pub async fn close(&self) {
        *self.inner.catalogs.write().expect("catalogs lock poisoned") = None;
        *self.inner.schemas.write().expect("schemas lock poisoned") = None;
        *self.inner.info.write().expect("info lock poisoned") = None;
        self.inner.core.refresh().await;
        self.inner.set_state(LifecycleState::Disconnected);
    }

    pub async fn catalogs(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Arc<Catalog>>> {
        self.inner.catalogs(monitor).await
    }

    pub async fn catalog(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Catalog>>> {
        let catalogs = self.inner.catalogs(monitor).await?;
        Ok(find_named(&catalogs, name).cloned())
    }

    /// Root-level schemas; empty when the backend exposes catalogs.
    pub async fn schemas(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Arc<Schema>>> {
        self.inner.schemas(monitor).await
    }

    pub async fn schema(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Schema>>> {
        let schemas = self.inner.schemas(monitor).await?;
        Ok(find_named(&schemas, name).cloned())
    }

    /// The navigable top-level children, whatever their flavor.
    pub async fn children(
        &self,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Vec<StructureChild>> {
        self.inner.children(monitor).await
    }

    /// Look up one top-level child by exact name.
    pub async fn child(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<StructureChild>> {
        self.inner.child_by_name(monitor, name).await
    }

    /// Resolve one table by optional catalog and schema scope.
    pub async fn find_table(
        &self,
        monitor: &dyn ProgressMonitor,
        catalog: Option<&str>,
        schema: Option<&str>,
        name: &str,
    ) -> MetaResult<Option<Arc<Table>>> {
        self.inner.find_table(monitor, catalog, schema, name).await
    }

    /// The backend's currently selected top-level child, if the driver can
    /// report one.
    pub async fn active_child(
        &self,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Option<StructureChild>> {
        self.inner.active_child(monitor).await
    }

    /// Switch the backend's selected child.
    pub async fn set_active_child(
        &self,
        monitor: &dyn ProgressMonitor,
        child: &StructureChild,
    ) -> MetaResult<()> {
        self.inner.set_active_child(monitor, child).await
    }

    /// Register a model change listener.
    pub fn add_listener(&self, listener: ObjectListener) {
        self.inner
            .listeners
            .write()
            .expect("listeners lock poisoned")
            .push(listener);
    }

    async fn has_containers(&self, monitor: &dyn ProgressMonitor) -> MetaResult<bool> {
        Ok(!self.inner.catalogs(monitor).await?.is_empty()
            || !self.inner.schemas(monitor).await?.is_empty())
    }
}

/// A data source without catalogs and schemas is itself the single
/// structure container; with them, its own container surface stays empty.
#[async_trait]
impl StructureContainer for DataSource {
    fn container_path(&self) -> &ContainerPath {
        self.inner.core.path()
    }

    async fn tables(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Arc<Table>>> {
        if self.has_containers(monitor).await? {
            return Ok(Vec::new());
        }
        self.inner.core.tables(monitor).await
    }

    async fn table(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Table>>> {
        if self.has_containers(monitor).await? {
            return Ok(None);
        }
        self.inner.core.table(monitor, name).await
    }

    async fn indexes(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Arc<Index>>> {
        if self.has_containers(monitor).await? {
            return Ok(Vec::new());
        }
        self.inner.core.indexes(monitor).await
    }

    async fn procedures(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Arc<Procedure>>> {
        if self.has_containers(monitor).await? {
            return Ok(Vec::new());
        }
        self.inner.core.procedures(monitor).await
    }

    async fn procedure(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Procedure>>> {
        if self.has_containers(monitor).await? {
            return Ok(None);
        }
        self.inner.core.procedure(monitor, name).await
    }

    async fn cache_structure(
        &self,
        monitor: &dyn ProgressMonitor,
        scope: StructureScope,
    ) -> MetaResult<()> {
        if self.has_containers(monitor).await? {
            return Ok(());
        }
        self.inner.core.cache_structure(monitor, scope).await
    }

    async fn cache_indexes(&self, monitor: &dyn ProgressMonitor) -> MetaResult<()> {
        if self.has_containers(monitor).await? {
            return Ok(());
        }
        self.inner.core.cache_indexes(monitor).await
    }

    async fn cache_procedure_columns(&self, monitor: &dyn ProgressMonitor) -> MetaResult<()> {
        if self.has_containers(monitor).await? {
            return Ok(());
        }
        self.inner.core.cache_procedure_columns(monitor).await
    }

    async fn refresh(&self) -> MetaResult<()> {
        self.inner.core.refresh().await;
        Ok(())
    }
}
