// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # dbmeta-core
//!
//! Driver-agnostic catalog model over relational database metadata.
//!
//! The model mirrors the containment hierarchy most backends share:
//!
//! ```text
//! DataSource -> Catalog -> Schema -> Table -> Column / Index / Key
//!                                 -> Procedure -> ProcedureColumn
//! ```
//!
//! Levels a backend does not have are skipped transparently; a data source
//! can sit directly on root-level schemas or even own tables itself. The
//! graph is populated lazily from a [`MetadataSource`] adapter, one bulk
//! enumeration per collection, and cached until refreshed. Backends that
//! cannot answer an optional enumeration (catalogs, schemas, indexes)
//! degrade to empty collections instead of failing.
//!
//! All population paths take a [`ProgressMonitor`] and abort cleanly on
//! cooperative cancellation, leaving the interrupted cache unfilled.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use dbmeta_core::{DataSource, DataSourceOptions, MetadataSource, NullMonitor, StructureContainer};
//!
//! async fn dump(adapter: Arc<dyn MetadataSource>) -> dbmeta_core::MetaResult<()> {
//!     let ds = DataSource::new("warehouse", adapter, DataSourceOptions::new());
//!     let monitor = NullMonitor;
//!     ds.initialize(&monitor).await?;
//!     for catalog in ds.catalogs(&monitor).await? {
//!         for table in catalog.tables(&monitor).await? {
//!             println!("{}", table.full_name());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod catalog;
pub mod container;
pub mod datasource;
pub mod error;
pub mod procedure;
pub mod progress;
pub mod schema;
pub mod source;
pub mod table;

pub use cache::EntityCache;
pub use catalog::Catalog;
pub use container::{ContainerPath, StructureChild, StructureContainer, StructureScope};
pub use datasource::{
    DataSource, DataSourceOptions, LifecycleState, ObjectEvent, ObjectListener,
};
pub use error::{MetaError, MetaResult};
pub use procedure::Procedure;
pub use progress::{CancellationMonitor, NullMonitor, ProgressMonitor};
pub use schema::Schema;
pub use source::{DriverQueries, MetadataSource, QUERY_GET_ACTIVE_DB, QUERY_SET_ACTIVE_DB};
pub use table::Table;
