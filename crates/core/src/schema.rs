// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Schemas: the innermost structure containers.

use std::sync::{Arc, Weak};

use async_trait::async_trait;

use crate::container::{ContainerCore, ContainerPath, StructureContainer, StructureScope};
use crate::datasource::DataSourceInner;
use crate::error::MetaResult;
use crate::procedure::Procedure;
use crate::progress::ProgressMonitor;
use crate::table::Table;
use dbmeta_model::Named;
use dbmeta_model::entity::Index;

/// A schema, either root-level or within a catalog.
pub struct Schema {
    core: ContainerCore,
    name: String,
}

impl Schema {
    pub(crate) fn new(
        datasource: Weak<DataSourceInner>,
        catalog: Option<String>,
        name: String,
    ) -> Self {
        Self {
            core: ContainerCore::new(datasource, ContainerPath::schema(catalog, name.clone())),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning catalog, when the schema lives inside one.
    pub fn catalog_name(&self) -> Option<&str> {
        self.core.path().catalog.as_deref()
    }
}

impl Named for Schema {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl StructureContainer for Schema {
    fn container_path(&self) -> &ContainerPath {
        self.core.path()
    }

    async fn tables(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Arc<Table>>> {
        self.core.tables(monitor).await
    }

    async fn table(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Table>>> {
        self.core.table(monitor, name).await
    }

    async fn indexes(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Arc<Index>>> {
        self.core.indexes(monitor).await
    }

    async fn procedures(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Arc<Procedure>>> {
        self.core.procedures(monitor).await
    }

    async fn procedure(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Procedure>>> {
        self.core.procedure(monitor, name).await
    }

    async fn cache_structure(
        &self,
        monitor: &dyn ProgressMonitor,
        scope: StructureScope,
    ) -> MetaResult<()> {
        self.core.cache_structure(monitor, scope).await
    }

    async fn cache_indexes(&self, monitor: &dyn ProgressMonitor) -> MetaResult<()> {
        self.core.cache_indexes(monitor).await
    }

    async fn cache_procedure_columns(&self, monitor: &dyn ProgressMonitor) -> MetaResult<()> {
        self.core.cache_procedure_columns(monitor).await
    }

    async fn refresh(&self) -> MetaResult<()> {
        self.core.refresh().await;
        Ok(())
    }
}
