// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Testing utilities for dbmeta
//!
//! This crate provides common testing components including:
//! - An in-memory mock metadata source with call counting
//! - Pre-built catalog/schema fixtures
//! - Progress monitors with scripted cancellation

pub mod fixtures;
pub mod mock_source;
pub mod monitors;

// Re-exports for convenience
pub use mock_source::{CallCounts, CallSnapshot, MockMetadataSource, ops};
pub use monitors::{CancelAfter, RecordingMonitor};
