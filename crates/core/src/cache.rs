// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Lazy entity caches
//!
//! Two caching shapes cover the whole model:
//!
//! - [`EntityCache`]: the simple one-level cache holding all children of one
//!   parent container (tables of a schema, procedures of a catalog). Two
//!   states only: not-loaded and loaded. A load either completes fully and
//!   publishes the whole list, or fails and leaves the cache not-loaded so
//!   the caller can retry. A legitimately empty enumeration is published as
//!   loaded-empty, which is distinguishable from "not yet loaded".
//! - [`ChildSlot`]: the per-entity attachment point for lazily loaded child
//!   collections (columns of one table, parameter columns of one procedure).
//!   Same two states, but filled by a container-level loader rather than by
//!   the slot itself.
//!
//! The composite (owner → parent → ordered children) shape used for indexes
//! and procedure columns is assembled from a flat row stream with
//! [`group_rows`], applied once per level: group by owner name, then within
//! each owner group by parent name, first-seen order preserved at both
//! levels.
//!
//! `EntityCache` fills run under an async mutex, so at most one fill per
//! cache is ever in flight; concurrent readers of a loaded cache just clone
//! the published list.

use tokio::sync::Mutex;

use crate::error::MetaResult;
use dbmeta_model::{Named, find_named};

enum CacheSlot<T> {
    NotLoaded,
    Loaded(Vec<T>),
}

/// Generic lazy cache for the children of one parent container.
pub struct EntityCache<T> {
    slot: Mutex<CacheSlot<T>>,
    /// What is being cached, for log events ("tables", "procedures").
    what: &'static str,
}

impl<T: Clone> EntityCache<T> {
    pub fn new(what: &'static str) -> Self {
        Self {
            slot: Mutex::new(CacheSlot::NotLoaded),
            what,
        }
    }

    /// Return the cached list, loading it first if necessary.
    ///
    /// The loader is invoked at most once per not-loaded state; it must
    /// perform exactly one bulk enumeration. On error the cache stays
    /// not-loaded.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> MetaResult<Vec<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MetaResult<Vec<T>>>,
    {
        let mut slot = self.slot.lock().await;
        if let CacheSlot::Loaded(items) = &*slot {
            return Ok(items.clone());
        }
        let items = load().await?;
        tracing::debug!(what = self.what, count = items.len(), "cache filled");
        *slot = CacheSlot::Loaded(items.clone());
        Ok(items)
    }

    /// Load-all-then-look-up. There is deliberately no per-name remote
    /// fetch: backends are queried in bulk to bound round-trips.
    pub async fn get_named<F, Fut>(&self, load: F, name: &str) -> MetaResult<Option<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MetaResult<Vec<T>>>,
        T: Named,
    {
        let items = self.get_or_load(load).await?;
        Ok(find_named(&items, name).cloned())
    }

    /// Publish an externally assembled list (used by the container-wide
    /// index aggregation, which copies per-table indexes).
    pub async fn set(&self, items: Vec<T>) {
        *self.slot.lock().await = CacheSlot::Loaded(items);
    }

    /// The published list, if loaded; never triggers a load.
    pub async fn get_cached(&self) -> Option<Vec<T>> {
        match &*self.slot.lock().await {
            CacheSlot::Loaded(items) => Some(items.clone()),
            CacheSlot::NotLoaded => None,
        }
    }

    pub async fn is_cached(&self) -> bool {
        matches!(&*self.slot.lock().await, CacheSlot::Loaded(_))
    }

    /// Reset to not-loaded. Already-handed-out children stay valid; they
    /// are simply no longer what this cache will return next time.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = CacheSlot::NotLoaded;
    }
}

/// Lazily attached child collection of one entity.
///
/// Reads and writes are short and never overlap an await point. Concurrent
/// fills are not guarded here: at most one metadata scan per connection is
/// supported, per the shared-resource policy.
#[derive(Debug)]
pub struct ChildSlot<T> {
    slot: std::sync::RwLock<Option<Vec<T>>>,
}

impl<T: Clone> ChildSlot<T> {
    pub fn new() -> Self {
        Self {
            slot: std::sync::RwLock::new(None),
        }
    }

    pub fn get(&self) -> Option<Vec<T>> {
        self.slot.read().expect("child slot poisoned").clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.read().expect("child slot poisoned").is_some()
    }

    pub fn set(&self, items: Vec<T>) {
        *self.slot.write().expect("child slot poisoned") = Some(items);
    }

    /// Append to an already-loaded collection; returns false when the slot
    /// is not loaded (the item will be picked up by the eventual load).
    pub fn push_if_loaded(&self, item: T) -> bool {
        let mut slot = self.slot.write().expect("child slot poisoned");
        match slot.as_mut() {
            Some(items) => {
                items.push(item);
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        *self.slot.write().expect("child slot poisoned") = None;
    }
}

impl<T: Clone> Default for ChildSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Group a flat row stream by a string key, preserving first-seen order of
/// keys and arrival order of rows within each group.
///
/// Rows for which the key function yields `None` are dropped with a
/// warning; some backends emit such rows for objects that cannot be
/// addressed (statistic index entries). An empty string is a valid key:
/// unnamed constraints all land in one group.
pub(crate) fn group_rows<R, F>(what: &str, rows: Vec<R>, key: F) -> Vec<(String, Vec<R>)>
where
    F: Fn(&R) -> Option<&str>,
{
    let mut groups: Vec<(String, Vec<R>)> = Vec::new();
    let mut index: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for row in rows {
        let Some(k) = key(&row) else {
            tracing::warn!(what, "dropping row without a usable key");
            continue;
        };
        match index.get(k) {
            Some(&i) => groups[i].1.push(row),
            None => {
                let k = k.to_owned();
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![row]));
            }
        }
    }
    groups
}
