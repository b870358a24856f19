// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Stored procedures and functions.

use std::sync::{Arc, Weak};

use crate::cache::ChildSlot;
use crate::container::ContainerPath;
use crate::datasource::{DataSourceInner, upgrade};
use crate::error::{MetaError, MetaResult};
use crate::progress::{ProgressMonitor, check_canceled};
use dbmeta_model::entity::ProcedureColumn;
use dbmeta_model::kinds::{ProcedureColumnRole, ProcedureKind};
use dbmeta_model::rows::{ProcedureColumnRow, ProcedureRow};
use dbmeta_model::{Named, find_named};

/// A stored procedure or function, with lazily loaded parameter columns.
#[derive(Debug)]
pub struct Procedure {
    datasource: Weak<DataSourceInner>,
    path: ContainerPath,
    name: String,
    kind: ProcedureKind,
    remarks: Option<String>,
    columns: ChildSlot<Arc<ProcedureColumn>>,
}

impl Procedure {
    pub(crate) fn from_row(
        datasource: Weak<DataSourceInner>,
        path: ContainerPath,
        row: ProcedureRow,
    ) -> Self {
        Self {
            datasource,
            path,
            name: row.name,
            kind: row.kind,
            remarks: row.remarks,
            columns: ChildSlot::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ProcedureKind {
        self.kind
    }

    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }

    pub fn path(&self) -> &ContainerPath {
        &self.path
    }

    pub fn full_name(&self) -> String {
        let scope = self.path.display();
        if scope.is_empty() {
            self.name.clone()
        } else {
            format!("{scope}.{}", self.name)
        }
    }

    /// Parameter and result columns in the order the backend reports them.
    pub async fn columns(
        &self,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Vec<Arc<ProcedureColumn>>> {
        if let Some(columns) = self.columns.get() {
            return Ok(columns);
        }
        check_canceled(monitor)?;
        let ds = upgrade(&self.datasource)?;
        let rows = ds
            .source
            .list_procedure_columns(
                self.path.catalog.as_deref(),
                self.path.schema.as_deref(),
                Some(&self.name),
            )
            .await
            .map_err(|e| MetaError::fetch(self.full_name(), "load procedure columns", e))?;
        let columns = Self::build_columns(rows);
        self.columns.set(columns.clone());
        Ok(columns)
    }

    /// Look up one parameter column by exact name.
    pub async fn column(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<ProcedureColumn>>> {
        let columns = self.columns(monitor).await?;
        Ok(find_named(&columns, name).cloned())
    }

    /// Some backends report the function result as a nameless column; it
    /// gets the conventional name "RETURN" so it stays addressable.
    pub(crate) fn build_columns(rows: Vec<ProcedureColumnRow>) -> Vec<Arc<ProcedureColumn>> {
        rows.into_iter()
            .map(|mut row| {
                if row.name.is_empty() && row.role == ProcedureColumnRole::Return {
                    row.name = "RETURN".to_string();
                }
                Arc::new(ProcedureColumn::from(row))
            })
            .collect()
    }

    pub(crate) fn set_columns(&self, columns: Vec<Arc<ProcedureColumn>>) {
        self.columns.set(columns);
    }

    pub(crate) fn columns_loaded(&self) -> bool {
        self.columns.is_loaded()
    }

    /// Drop the cached parameter columns.
    pub fn refresh(&self) {
        self.columns.clear();
    }
}

impl Named for Procedure {
    fn name(&self) -> &str {
        &self.name
    }
}
