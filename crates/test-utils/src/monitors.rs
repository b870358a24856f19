// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Progress monitors with scripted behavior for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use dbmeta_core::ProgressMonitor;

/// Reports cancellation once a given number of work units completed; lets a
/// test interrupt a scan at a deterministic point.
pub struct CancelAfter {
    limit: usize,
    count: AtomicUsize,
}

impl CancelAfter {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            count: AtomicUsize::new(0),
        }
    }

    /// Work units observed so far.
    pub fn worked_units(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ProgressMonitor for CancelAfter {
    fn worked(&self, units: usize) {
        self.count.fetch_add(units, Ordering::SeqCst);
    }

    fn is_canceled(&self) -> bool {
        self.count.load(Ordering::SeqCst) >= self.limit
    }
}

/// Records every task and sub-task label, for asserting on progress
/// reporting itself.
#[derive(Default)]
pub struct RecordingMonitor {
    tasks: Mutex<Vec<String>>,
    sub_tasks: Mutex<Vec<String>>,
    done: AtomicUsize,
}

impl RecordingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> Vec<String> {
        self.tasks.lock().unwrap().clone()
    }

    pub fn sub_tasks(&self) -> Vec<String> {
        self.sub_tasks.lock().unwrap().clone()
    }

    pub fn done_count(&self) -> usize {
        self.done.load(Ordering::SeqCst)
    }
}

impl ProgressMonitor for RecordingMonitor {
    fn begin_task(&self, task: &str, _total_work: usize) {
        self.tasks.lock().unwrap().push(task.to_owned());
    }

    fn sub_task(&self, name: &str) {
        self.sub_tasks.lock().unwrap().push(name.to_owned());
    }

    fn done(&self) {
        self.done.fetch_add(1, Ordering::SeqCst);
    }
}
