// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The declarative expression model: values, paths, targets, filters,
//! functions, projections, sorts and the query/write descriptors built from
//! them. Everything here is plain data; resolution into SQL lives in
//! [`crate::resolve`] and [`crate::compile`].

pub mod filter;
pub mod function;
pub mod path;
pub mod projection;
pub mod query;
pub mod record;
pub mod sort;
pub mod target;
pub mod value;
pub mod write;

use filter::Filter;
use function::SqlFunction;
use path::Path;
use projection::Projection;
use query::SubQuery;
use sort::Sort;
use target::Target;
use value::Value;

/// The kind tag of an expression, used by the resolver registry to select
/// applicable entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionKind {
    Path,
    Filter,
    Function,
    Projection,
    Target,
    Sort,
    SubQuery,
    Literal,
}

impl std::fmt::Display for ExpressionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExpressionKind::Path => "Path",
            ExpressionKind::Filter => "Filter",
            ExpressionKind::Function => "Function",
            ExpressionKind::Projection => "Projection",
            ExpressionKind::Target => "Target",
            ExpressionKind::Sort => "Sort",
            ExpressionKind::SubQuery => "SubQuery",
            ExpressionKind::Literal => "Literal",
        };
        f.write_str(name)
    }
}

/// A borrowed view over any node of the expression model — the unit of
/// dispatch for the resolver registry.
#[derive(Debug, Clone, Copy)]
pub enum Expression<'a> {
    Path(&'a Path),
    Filter(&'a Filter),
    Function(&'a SqlFunction),
    Projection(&'a Projection),
    Target(&'a Target),
    Sort(&'a Sort),
    SubQuery(&'a SubQuery),
    Literal(&'a Value),
}

impl Expression<'_> {
    pub fn kind(&self) -> ExpressionKind {
        match self {
            Expression::Path(_) => ExpressionKind::Path,
            Expression::Filter(_) => ExpressionKind::Filter,
            Expression::Function(_) => ExpressionKind::Function,
            Expression::Projection(_) => ExpressionKind::Projection,
            Expression::Target(_) => ExpressionKind::Target,
            Expression::Sort(_) => ExpressionKind::Sort,
            Expression::SubQuery(_) => ExpressionKind::SubQuery,
            Expression::Literal(_) => ExpressionKind::Literal,
        }
    }
}

impl<'a> From<&'a Path> for Expression<'a> {
    fn from(path: &'a Path) -> Self {
        Expression::Path(path)
    }
}

impl<'a> From<&'a Filter> for Expression<'a> {
    fn from(filter: &'a Filter) -> Self {
        Expression::Filter(filter)
    }
}

impl<'a> From<&'a SqlFunction> for Expression<'a> {
    fn from(function: &'a SqlFunction) -> Self {
        Expression::Function(function)
    }
}

impl<'a> From<&'a Projection> for Expression<'a> {
    fn from(projection: &'a Projection) -> Self {
        Expression::Projection(projection)
    }
}

impl<'a> From<&'a Target> for Expression<'a> {
    fn from(target: &'a Target) -> Self {
        Expression::Target(target)
    }
}

impl<'a> From<&'a Sort> for Expression<'a> {
    fn from(sort: &'a Sort) -> Self {
        Expression::Sort(sort)
    }
}

impl<'a> From<&'a SubQuery> for Expression<'a> {
    fn from(query: &'a SubQuery) -> Self {
        Expression::SubQuery(query)
    }
}

impl<'a> From<&'a Value> for Expression<'a> {
    fn from(value: &'a Value) -> Self {
        Expression::Literal(value)
    }
}
