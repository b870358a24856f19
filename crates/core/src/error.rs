// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for catalog-model operations
//!
//! One taxonomy covers everything the model can report:
//!
//! - [`MetaError::Unsupported`]: the backend does not implement a metadata
//!   call. Recovered locally as "empty result" for every enumeration and
//!   never surfaced for those. Optional calls (catalog, schema and index
//!   listing) additionally recover any other non-cancellation failure.
//! - [`MetaError::Fetch`]: a non-optional call failed. Wraps the underlying
//!   cause and names the container and operation; the affected cache stays
//!   not-loaded so the caller can retry.
//! - [`MetaError::Canceled`]: cooperative cancellation observed mid-scan.
//! - [`MetaError::NotAChild`] / [`MetaError::ActiveChildUnsupported`]:
//!   invalid operations, surfaced immediately with no partial effect.

use thiserror::Error;

/// Result type alias for catalog-model operations.
pub type MetaResult<T> = Result<T, MetaError>;

/// Errors that can occur while populating or querying the catalog model.
#[derive(Debug, Error, Clone)]
pub enum MetaError {
    /// The backend does not implement this metadata call.
    #[error("metadata call not supported by backend: {0}")]
    Unsupported(String),

    /// The backend reported an error executing a metadata call.
    #[error("backend error: {0}")]
    Backend(String),

    /// A non-optional metadata fetch failed for a container.
    #[error("failed to {operation} for '{container}'")]
    Fetch {
        container: String,
        operation: String,
        #[source]
        source: Box<MetaError>,
    },

    /// Cooperative cancellation was observed during a scan.
    #[error("operation canceled")]
    Canceled,

    /// The object passed to an operation is not a child of the data source.
    #[error("'{child}' is not a child of data source '{datasource}'")]
    NotAChild { child: String, datasource: String },

    /// The driver provides no query for changing the active database.
    #[error("active database change is not supported by this driver")]
    ActiveChildUnsupported,

    /// Invalid data source configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl MetaError {
    /// Wrap a failed non-optional fetch with the container and operation it
    /// was issued for.
    pub fn fetch(
        container: impl Into<String>,
        operation: impl Into<String>,
        source: MetaError,
    ) -> Self {
        MetaError::Fetch {
            container: container.into(),
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// Whether this is the recoverable "feature not supported" signal.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, MetaError::Unsupported(_))
    }
}

/// Recover an optional metadata call: unsupported means "zero results".
///
/// Cancellation is never swallowed; any other backend failure of an optional
/// call degrades to an empty result with a warning, matching how drivers that
/// cannot enumerate catalogs or schemas are expected to behave.
pub(crate) fn optional<T>(operation: &str, result: MetaResult<Vec<T>>) -> MetaResult<Vec<T>> {
    match result {
        Ok(items) => Ok(items),
        Err(MetaError::Canceled) => Err(MetaError::Canceled),
        Err(MetaError::Unsupported(_)) => Ok(Vec::new()),
        Err(err) => {
            tracing::warn!(operation, error = %err, "optional metadata call failed, treating as empty");
            Ok(Vec::new())
        }
    }
}

/// Recover a required metadata call: unsupported still means "zero results",
/// but any other failure is wrapped with the container and operation and
/// surfaced, leaving the affected cache not-loaded.
pub(crate) fn required<T>(
    container: &str,
    operation: &str,
    result: MetaResult<Vec<T>>,
) -> MetaResult<Vec<T>> {
    match result {
        Ok(items) => Ok(items),
        Err(MetaError::Canceled) => Err(MetaError::Canceled),
        Err(MetaError::Unsupported(_)) => {
            tracing::debug!(operation, "metadata call not supported, treating as empty");
            Ok(Vec::new())
        }
        Err(err) => Err(MetaError::fetch(container, operation, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_names_container_and_operation() {
        let err = MetaError::fetch("db1.public", "list columns", MetaError::Backend("boom".into()));
        let msg = err.to_string();
        assert!(msg.contains("db1.public"));
        assert!(msg.contains("list columns"));
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("boom"));
    }

    #[test]
    fn test_optional_recovers_unsupported() {
        let result: MetaResult<Vec<u8>> =
            optional("list schemas", Err(MetaError::Unsupported("no schemas".into())));
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_optional_keeps_cancellation() {
        let result: MetaResult<Vec<u8>> = optional("list catalogs", Err(MetaError::Canceled));
        assert!(matches!(result, Err(MetaError::Canceled)));
    }

    #[test]
    fn test_required_recovers_only_unsupported() {
        let result: MetaResult<Vec<u8>> =
            required("db1", "load tables", Err(MetaError::Unsupported("no tables".into())));
        assert!(result.unwrap().is_empty());

        let result: MetaResult<Vec<u8>> =
            required("db1", "load tables", Err(MetaError::Backend("boom".into())));
        assert!(matches!(result, Err(MetaError::Fetch { .. })));

        let result: MetaResult<Vec<u8>> = required("db1", "load tables", Err(MetaError::Canceled));
        assert!(matches!(result, Err(MetaError::Canceled)));
    }
}
