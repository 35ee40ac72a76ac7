// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::access_error::AccessError;

/// Bounded memoization of metadata-derived key columns, keyed by table
/// name, with least-recently-used eviction.
///
/// The lock is held across the probe on a miss: concurrent resolutions of
/// the same table wait instead of each performing its own metadata round
/// trip.
pub(crate) struct KeyCache {
    inner: Mutex<LruCache<String, Vec<String>>>,
}

impl KeyCache {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Return the cached key columns for `table`, probing on a miss. An
    /// empty probe result (no discoverable key) maps to `None` and is not
    /// cached, so a later schema change is picked up.
    pub(crate) fn get_or_probe(
        &self,
        table: &str,
        probe: impl FnOnce() -> Result<Vec<String>, AccessError>,
    ) -> Result<Option<Vec<String>>, AccessError> {
        let mut cache = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(columns) = cache.get(table) {
            return Ok(Some(columns.clone()));
        }

        let columns = probe()?;
        if columns.is_empty() {
            return Ok(None);
        }
        cache.put(table.to_owned(), columns.clone());
        Ok(Some(columns))
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
