// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

use super::filter::Filter;
use super::path::Path;
use super::projection::Projection;
use super::sort::Sort;
use super::target::Target;

/// The declarative configuration of a SELECT. Built incrementally through
/// consuming combinators and compiled in one pass; an instance is never
/// mutated after compilation starts, so a descriptor can be compiled any
/// number of times with identical results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub target: Target,
    pub filter: Option<Filter>,
    pub group_by: Vec<Path>,
    pub having: Option<Filter>,
    pub sort: Option<Sort>,
    pub projections: Vec<Projection>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl QueryDescriptor {
    pub fn from_target(target: Target) -> Self {
        Self {
            target,
            filter: None,
            group_by: Vec::new(),
            having: None,
            sort: None,
            projections: Vec::new(),
            limit: None,
            offset: None,
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

    pub fn project(mut self, projection: impl Into<Projection>) -> Self {
        self.projections.push(projection.into());
        self
    }

    pub fn group_by(mut self, path: Path) -> Self {
        self.group_by.push(path);
        self
    }

    /// Add an aggregation filter; an existing one is conjoined.
    pub fn having(mut self, filter: Filter) -> Self {
        self.having = Some(match self.having {
            Some(existing) => Filter::and(existing, filter),
            None => filter,
        });
        self
    }

    /// Add a sort key; an existing sort keeps precedence, the new key is
    /// appended after it.
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(match self.sort {
            Some(existing) => existing.then(sort),
            None => sort,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// A query configuration nested inside another expression (EXISTS filters,
/// IN right-hand sides, scalar operands). Compiles in a child alias scope of
/// the enclosing pass; its parameters join the enclosing pass's single
/// ordered parameter list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuery {
    pub query: QueryDescriptor,
}

impl SubQuery {
    pub fn new(query: QueryDescriptor) -> Self {
        Self { query }
    }
}

impl From<QueryDescriptor> for SubQuery {
    fn from(query: QueryDescriptor) -> Self {
        SubQuery::new(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::value::Value;

    #[test]
    fn descriptors_survive_serialization() {
        let t = Target::new("T");
        let query = QueryDescriptor::from_target(t.clone())
            .filter(Filter::eq(t.path("keycode"), Value::Int(1)))
            .project(t.path("strv"))
            .sort(Sort::asc(t.path("keycode")))
            .limit(10);

        let json = serde_json::to_string(&query).unwrap();
        let restored: QueryDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(query, restored);
    }

    #[test]
    fn repeated_filters_conjoin() {
        let t = Target::new("T");
        let query = QueryDescriptor::from_target(t.clone())
            .filter(Filter::eq(t.path("a"), Value::Int(1)))
            .filter(Filter::eq(t.path("b"), Value::Int(2)));

        assert!(matches!(query.filter, Some(Filter::And(ref children)) if children.len() == 2));
    }
}
