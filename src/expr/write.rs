// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::filter::{Filter, Operand};
use super::path::Path;
use super::record::Record;
use super::target::Target;

/// An insert descriptor. The column set is fixed once, from an explicit
/// [`Insert::columns`] call or from the first row's value map; every
/// subsequent row must supply values for exactly that set. A single row
/// resolves its values through the registry (so function values render as
/// SQL); multiple rows compile to one placeholder-only statement with
/// per-row parameter sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insert {
    pub target: Target,
    pub columns: Vec<String>,
    pub rows: Vec<IndexMap<String, Operand>>,
    pub returning: Vec<Path>,
}

impl Insert {
    pub fn into_table(target: Target) -> Self {
        Self {
            target,
            columns: Vec::new(),
            rows: Vec::new(),
            returning: Vec::new(),
        }
    }

    pub fn columns<C: Into<String>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Append one row from (column, value) pairs.
    pub fn values<C: Into<String>, V: Into<Operand>>(
        mut self,
        values: impl IntoIterator<Item = (C, V)>,
    ) -> Self {
        self.rows.push(
            values
                .into_iter()
                .map(|(c, v)| (c.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Append one row from a record's entries.
    pub fn record(mut self, record: &Record) -> Self {
        self.rows.push(
            record
                .entries()
                .map(|(c, v)| (c.to_owned(), Operand::Literal(v.clone())))
                .collect(),
        );
        self
    }

    /// Paths whose generated values should be reported back after the
    /// insert, when the dialect supports generated-key retrieval.
    pub fn returning(mut self, paths: impl IntoIterator<Item = Path>) -> Self {
        self.returning = paths.into_iter().collect();
        self
    }
}

/// An update descriptor: ordered SET assignments plus an optional filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub target: Target,
    pub assignments: IndexMap<String, Operand>,
    pub filter: Option<Filter>,
}

impl Update {
    pub fn table(target: Target) -> Self {
        Self {
            target,
            assignments: IndexMap::new(),
            filter: None,
        }
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<Operand>) -> Self {
        self.assignments.insert(column.into(), value.into());
        self
    }

    /// Add a filter; an existing filter is conjoined with the new one.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter {
            Some(existing) => Filter::and(existing, filter),
            None => filter,
        });
        self
    }
}

/// A delete descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delete {
    pub target: Target,
    pub filter: Option<Filter>,
}

impl Delete {
    pub fn from_table(target: Target) -> Self {
        Self {
            target,
            filter: None,
        }
    }

    /// Add a filter; an existing filter is conjoined with the new one.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter {
            Some(existing) => Filter::and(existing, filter),
            None => filter,
        });
        self
    }
}
