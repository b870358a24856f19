// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Catalogs and their lazily loaded schemas.
//!
//! A catalog can hold either schemas or tables, never both. The schema
//! enumeration decides: a catalog whose backend reports at least one schema
//! exposes its structure exclusively through those schemas, and its own
//! container surface reports no tables.

use std::sync::{Arc, Weak};

use async_trait::async_trait;

use crate::cache::EntityCache;
use crate::container::{ContainerCore, ContainerPath, StructureContainer, StructureScope};
use crate::datasource::{DataSourceInner, upgrade};
use crate::error::{MetaResult, optional};
use crate::procedure::Procedure;
use crate::progress::{ProgressMonitor, check_canceled};
use crate::schema::Schema;
use crate::table::Table;
use dbmeta_model::Named;
use dbmeta_model::entity::Index;

/// A top-level catalog (a "database" in several backends).
pub struct Catalog {
    core: ContainerCore,
    name: String,
    schemas: EntityCache<Arc<Schema>>,
}

impl Catalog {
    pub(crate) fn new(datasource: Weak<DataSourceInner>, name: String) -> Self {
        Self {
            core: ContainerCore::new(datasource.clone(), ContainerPath::catalog(name.clone())),
            name,
            schemas: EntityCache::new("schemas"),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schemas of this catalog, loaded on first access. Backends without
    /// schema support yield an empty collection.
    pub async fn schemas(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Arc<Schema>>> {
        self.schemas
            .get_or_load(|| self.load_schemas(monitor))
            .await
    }

    /// Look up one schema by exact name.
    pub async fn schema(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Schema>>> {
        self.schemas
            .get_named(|| self.load_schemas(monitor), name)
            .await
    }

    async fn load_schemas(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Arc<Schema>>> {
        let ds = upgrade(&self.core.datasource)?;
        monitor.sub_task(&format!("Extract schemas - {}", self.name));
        let rows = optional(
            "list schemas",
            ds.source.list_schemas(Some(&self.name)).await,
        )?;
        let mut schemas = Vec::new();
        for row in rows {
            check_canceled(monitor)?;
            // Some backends ignore the catalog filter; the row is kept and
            // the parent catalog wins over what it claims.
            if let Some(catalog) = row.catalog.as_deref()
                && catalog != self.name
            {
                tracing::warn!(
                    catalog = %self.name,
                    reported = %catalog,
                    schema = %row.schema,
                    "schema row claims a different catalog"
                );
            }
            schemas.push(Arc::new(Schema::new(
                self.core.datasource.clone(),
                Some(self.name.clone()),
                row.schema,
            )));
        }
        Ok(schemas)
    }

    async fn has_schemas(&self, monitor: &dyn ProgressMonitor) -> MetaResult<bool> {
        Ok(!self.schemas(monitor).await?.is_empty())
    }
}

impl Named for Catalog {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl StructureContainer for Catalog {
    fn container_path(&self) -> &ContainerPath {
        self.core.path()
    }

    async fn tables(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Arc<Table>>> {
        if self.has_schemas(monitor).await? {
            return Ok(Vec::new());
        }
        self.core.tables(monitor).await
    }

    async fn table(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Table>>> {
        if self.has_schemas(monitor).await? {
            return Ok(None);
        }
        self.core.table(monitor, name).await
    }

    async fn indexes(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Arc<Index>>> {
        if self.has_schemas(monitor).await? {
            return Ok(Vec::new());
        }
        self.core.indexes(monitor).await
    }

    async fn procedures(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Arc<Procedure>>> {
        if self.has_schemas(monitor).await? {
            return Ok(Vec::new());
        }
        self.core.procedures(monitor).await
    }

    async fn procedure(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Procedure>>> {
        if self.has_schemas(monitor).await? {
            return Ok(None);
        }
        self.core.procedure(monitor, name).await
    }

    async fn cache_structure(
        &self,
        monitor: &dyn ProgressMonitor,
        scope: StructureScope,
    ) -> MetaResult<()> {
        if self.has_schemas(monitor).await? {
            return Ok(());
        }
        self.core.cache_structure(monitor, scope).await
    }

    async fn cache_indexes(&self, monitor: &dyn ProgressMonitor) -> MetaResult<()> {
        if self.has_schemas(monitor).await? {
            return Ok(());
        }
        self.core.cache_indexes(monitor).await
    }

    async fn cache_procedure_columns(&self, monitor: &dyn ProgressMonitor) -> MetaResult<()> {
        if self.has_schemas(monitor).await? {
            return Ok(());
        }
        self.core.cache_procedure_columns(monitor).await
    }

    async fn refresh(&self) -> MetaResult<()> {
        self.schemas.invalidate().await;
        self.core.refresh().await;
        Ok(())
    }
}
