// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Cancellable progress reporting
//!
//! Every container-population operation takes a [`ProgressMonitor`]. The
//! monitor is polled between rows during bulk enumerations; when
//! cancellation is observed the scan aborts cleanly and the cache being
//! filled stays not-loaded. Cancellation is cooperative, not preemptive.
//!
//! [`begin_task`](ProgressMonitor::begin_task) / [`done`](ProgressMonitor::done)
//! bracket long scans purely as a responsiveness signal for callers driving
//! a UI; they carry no locking semantics.

use tokio_util::sync::CancellationToken;

use crate::error::{MetaError, MetaResult};

/// Cancellable progress context passed through all metadata scans.
pub trait ProgressMonitor: Send + Sync {
    /// A long-running scan is starting.
    fn begin_task(&self, _task: &str, _total_work: usize) {}

    /// Fine-grained progress label ("Extract catalogs - db1").
    fn sub_task(&self, _name: &str) {}

    /// Some units of work completed.
    fn worked(&self, _units: usize) {}

    /// Whether the caller asked to abort.
    fn is_canceled(&self) -> bool {
        false
    }

    /// The scan started by `begin_task` finished (successfully or not).
    fn done(&self) {}
}

/// Monitor that never cancels and reports nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMonitor;

impl ProgressMonitor for NullMonitor {}

/// Monitor backed by a [`CancellationToken`], for callers that drive
/// cancellation from another task.
#[derive(Debug, Default, Clone)]
pub struct CancellationMonitor {
    token: CancellationToken,
}

impl CancellationMonitor {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// The token this monitor observes; hand clones to whoever may cancel.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl ProgressMonitor for CancellationMonitor {
    fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Bail out of a scan if cancellation was requested.
pub(crate) fn check_canceled(monitor: &dyn ProgressMonitor) -> MetaResult<()> {
    if monitor.is_canceled() {
        Err(MetaError::Canceled)
    } else {
        Ok(())
    }
}

/// RAII bracket for a blocking scan: `begin_task` on creation, `done` on drop.
pub(crate) struct ScanGuard<'a> {
    monitor: &'a dyn ProgressMonitor,
}

impl<'a> ScanGuard<'a> {
    pub(crate) fn begin(monitor: &'a dyn ProgressMonitor, task: &str, total_work: usize) -> Self {
        monitor.begin_task(task, total_work);
        Self { monitor }
    }
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.monitor.done();
    }
}
