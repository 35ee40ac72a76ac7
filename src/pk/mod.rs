// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Primary-key discovery: identifier properties first (no I/O), database
//! metadata as the fallback, with bounded memoization of the metadata path.

mod cache;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::access_error::AccessError;
use crate::exec::connection::{ConnectionKind, ConnectionProvider};
use crate::expr::path::Path;
use crate::expr::record::Record;
use crate::expr::target::Target;

use cache::KeyCache;

pub const DEFAULT_KEY_CACHE_CAPACITY: usize = 5000;

/// How a target's identifying columns are discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyStrategy {
    /// Only the record's declared identifier properties.
    IdentifierProperties,
    /// Only database metadata for the target table.
    TablePrimaryKey,
    /// Identifier properties when declared, metadata otherwise.
    Auto,
}

/// An ordered, non-empty sequence of key paths. Metadata-derived keys are
/// ordered by the database-reported key sequence, not discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryKey {
    columns: Vec<Path>,
}

impl PrimaryKey {
    fn from_paths(columns: Vec<Path>) -> Option<PrimaryKey> {
        if columns.is_empty() {
            None
        } else {
            Some(PrimaryKey { columns })
        }
    }

    pub fn columns(&self) -> &[Path] {
        &self.columns
    }
}

/// Discovers and memoizes primary keys per the configured strategy.
///
/// Identifier-property keys are record-specific and bypass the cache;
/// metadata-derived keys are table-specific and cached. An undiscoverable
/// key is `Ok(None)` — whether that is an error depends on the operation,
/// so the caller decides.
pub struct KeyResolver {
    strategy: KeyStrategy,
    cache: KeyCache,
}

impl KeyResolver {
    pub fn new(strategy: KeyStrategy) -> Self {
        Self::with_capacity(strategy, DEFAULT_KEY_CACHE_CAPACITY)
    }

    pub fn with_capacity(strategy: KeyStrategy, capacity: usize) -> Self {
        Self {
            strategy,
            cache: KeyCache::new(capacity),
        }
    }

    pub fn strategy(&self) -> KeyStrategy {
        self.strategy
    }

    pub fn resolve(
        &self,
        record: Option<&Record>,
        target: &Target,
        provider: &dyn ConnectionProvider,
    ) -> Result<Option<PrimaryKey>, AccessError> {
        match self.strategy {
            KeyStrategy::IdentifierProperties => Ok(identifier_key(record, target)),
            KeyStrategy::TablePrimaryKey => self.table_key(target, provider),
            KeyStrategy::Auto => match identifier_key(record, target) {
                Some(key) => Ok(Some(key)),
                None => self.table_key(target, provider),
            },
        }
    }

    fn table_key(
        &self,
        target: &Target,
        provider: &dyn ConnectionProvider,
    ) -> Result<Option<PrimaryKey>, AccessError> {
        let names = self
            .cache
            .get_or_probe(&target.name, || probe_table_key(&target.name, provider))?;
        Ok(names.and_then(|names| {
            PrimaryKey::from_paths(names.iter().map(|name| target.path(name)).collect())
        }))
    }
}

fn identifier_key(record: Option<&Record>, target: &Target) -> Option<PrimaryKey> {
    let record = record?;
    PrimaryKey::from_paths(
        record
            .identifier_columns()
            .iter()
            .map(|column| target.path(column))
            .collect(),
    )
}

/// One metadata round trip on a schema-probing connection, with the
/// connection released on every path.
fn probe_table_key(
    table: &str,
    provider: &dyn ConnectionProvider,
) -> Result<Vec<String>, AccessError> {
    let mut connection = provider
        .acquire(ConnectionKind::Init)
        .map_err(AccessError::DataAccess)?;
    let probed = connection.primary_key(table);
    let released = provider.release(connection, ConnectionKind::Init);

    let mut columns = probed.map_err(AccessError::DataAccess)?;
    if let Err(e) = released {
        error!("failed to release metadata connection: {e}");
        return Err(AccessError::Transaction(format!(
            "failed to release metadata connection: {e}"
        )));
    }

    columns.sort_by_key(|column| column.key_seq);
    Ok(columns.into_iter().map(|column| column.name).collect())
}
