// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

use super::function::SqlFunction;
use super::path::Path;
use super::query::SubQuery;
use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Neq => "<>",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }

    pub fn negated(&self) -> CompareOp {
        match self {
            CompareOp::Eq => CompareOp::Neq,
            CompareOp::Neq => CompareOp::Eq,
            CompareOp::Gt => CompareOp::Lte,
            CompareOp::Gte => CompareOp::Lt,
            CompareOp::Lt => CompareOp::Gte,
            CompareOp::Lte => CompareOp::Gt,
        }
    }
}

/// Wildcard placement for string-match filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    Contains,
    StartsWith,
    EndsWith,
}

/// An operand of a filter or an assignment: a column path, a literal, a
/// function application, or a scalar subquery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Path(Path),
    Literal(Value),
    Function(SqlFunction),
    Query(Box<SubQuery>),
}

impl Operand {
    pub fn literal(value: impl Into<Value>) -> Operand {
        Operand::Literal(value.into())
    }
}

impl From<Path> for Operand {
    fn from(path: Path) -> Self {
        Operand::Path(path)
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Literal(value)
    }
}

impl From<SqlFunction> for Operand {
    fn from(function: SqlFunction) -> Self {
        Operand::Function(function)
    }
}

impl From<SubQuery> for Operand {
    fn from(query: SubQuery) -> Self {
        Operand::Query(Box::new(query))
    }
}

/// The right-hand side of an IN / NOT IN filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InValues {
    List(Vec<Value>),
    Query(Box<SubQuery>),
}

/// A boolean expression over operands. Every comparison-like node must
/// resolve a non-null right operand before SQL emission; a literal `Null`
/// there is a resolution-time error (use [`Filter::Null`]/[`Filter::NotNull`]
/// instead).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    // Prefer Filter::and(), which flattens the clause
    And(Vec<Filter>),
    // Prefer Filter::or(), which flattens the clause
    Or(Vec<Filter>),
    // Prefer the ! operator, which inverts comparisons instead of wrapping
    Not(Box<Filter>),
    Compare {
        op: CompareOp,
        left: Operand,
        right: Operand,
    },
    Between {
        left: Operand,
        low: Operand,
        high: Operand,
    },
    In {
        left: Operand,
        values: InValues,
    },
    NotIn {
        left: Operand,
        values: InValues,
    },
    Null(Operand),
    NotNull(Operand),
    Match {
        mode: MatchMode,
        ignore_case: bool,
        left: Operand,
        pattern: Operand,
    },
    Exists(Box<SubQuery>),
    NotExists(Box<SubQuery>),
}

impl Filter {
    pub fn compare(op: CompareOp, left: impl Into<Operand>, right: impl Into<Operand>) -> Filter {
        Filter::Compare {
            op,
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn eq(left: impl Into<Operand>, right: impl Into<Operand>) -> Filter {
        Filter::compare(CompareOp::Eq, left, right)
    }

    pub fn neq(left: impl Into<Operand>, right: impl Into<Operand>) -> Filter {
        Filter::compare(CompareOp::Neq, left, right)
    }

    pub fn gt(left: impl Into<Operand>, right: impl Into<Operand>) -> Filter {
        Filter::compare(CompareOp::Gt, left, right)
    }

    pub fn gte(left: impl Into<Operand>, right: impl Into<Operand>) -> Filter {
        Filter::compare(CompareOp::Gte, left, right)
    }

    pub fn lt(left: impl Into<Operand>, right: impl Into<Operand>) -> Filter {
        Filter::compare(CompareOp::Lt, left, right)
    }

    pub fn lte(left: impl Into<Operand>, right: impl Into<Operand>) -> Filter {
        Filter::compare(CompareOp::Lte, left, right)
    }

    pub fn between(
        left: impl Into<Operand>,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
    ) -> Filter {
        Filter::Between {
            left: left.into(),
            low: low.into(),
            high: high.into(),
        }
    }

    pub fn in_list(left: impl Into<Operand>, values: impl IntoIterator<Item = Value>) -> Filter {
        Filter::In {
            left: left.into(),
            values: InValues::List(values.into_iter().collect()),
        }
    }

    pub fn not_in_list(left: impl Into<Operand>, values: impl IntoIterator<Item = Value>) -> Filter {
        Filter::NotIn {
            left: left.into(),
            values: InValues::List(values.into_iter().collect()),
        }
    }

    pub fn in_query(left: impl Into<Operand>, query: SubQuery) -> Filter {
        Filter::In {
            left: left.into(),
            values: InValues::Query(Box::new(query)),
        }
    }

    pub fn is_null(operand: impl Into<Operand>) -> Filter {
        Filter::Null(operand.into())
    }

    pub fn not_null(operand: impl Into<Operand>) -> Filter {
        Filter::NotNull(operand.into())
    }

    pub fn matches(
        mode: MatchMode,
        ignore_case: bool,
        left: impl Into<Operand>,
        pattern: impl Into<Operand>,
    ) -> Filter {
        Filter::Match {
            mode,
            ignore_case,
            left: left.into(),
            pattern: pattern.into(),
        }
    }

    pub fn contains(left: impl Into<Operand>, pattern: impl Into<Operand>) -> Filter {
        Filter::matches(MatchMode::Contains, false, left, pattern)
    }

    pub fn starts_with(left: impl Into<Operand>, pattern: impl Into<Operand>) -> Filter {
        Filter::matches(MatchMode::StartsWith, false, left, pattern)
    }

    pub fn ends_with(left: impl Into<Operand>, pattern: impl Into<Operand>) -> Filter {
        Filter::matches(MatchMode::EndsWith, false, left, pattern)
    }

    pub fn exists(query: SubQuery) -> Filter {
        Filter::Exists(Box::new(query))
    }

    pub fn not_exists(query: SubQuery) -> Filter {
        Filter::NotExists(Box::new(query))
    }

    /// Conjunction of two filters, flattening nested And lists so the
    /// rendered clause stays one level deep.
    pub fn and(lhs: Filter, rhs: Filter) -> Filter {
        match (lhs, rhs) {
            (Filter::And(mut lhs), Filter::And(rhs)) => {
                lhs.extend(rhs);
                Filter::And(lhs)
            }
            (Filter::And(mut lhs), rhs) => {
                lhs.push(rhs);
                Filter::And(lhs)
            }
            (lhs, Filter::And(rhs)) => {
                let mut children = vec![lhs];
                children.extend(rhs);
                Filter::And(children)
            }
            (lhs, rhs) => Filter::And(vec![lhs, rhs]),
        }
    }

    /// Disjunction of two filters, flattening nested Or lists.
    pub fn or(lhs: Filter, rhs: Filter) -> Filter {
        match (lhs, rhs) {
            (Filter::Or(mut lhs), Filter::Or(rhs)) => {
                lhs.extend(rhs);
                Filter::Or(lhs)
            }
            (Filter::Or(mut lhs), rhs) => {
                lhs.push(rhs);
                Filter::Or(lhs)
            }
            (lhs, Filter::Or(rhs)) => {
                let mut children = vec![lhs];
                children.extend(rhs);
                Filter::Or(children)
            }
            (lhs, rhs) => Filter::Or(vec![lhs, rhs]),
        }
    }
}

impl std::ops::Not for Filter {
    type Output = Filter;

    /// Negate a filter, inverting to the dual form where one exists instead
    /// of wrapping in `Not`.
    fn not(self) -> Filter {
        match self {
            Filter::Compare { op, left, right } => Filter::Compare {
                op: op.negated(),
                left,
                right,
            },
            Filter::In { left, values } => Filter::NotIn { left, values },
            Filter::NotIn { left, values } => Filter::In { left, values },
            Filter::Null(operand) => Filter::NotNull(operand),
            Filter::NotNull(operand) => Filter::Null(operand),
            Filter::Exists(query) => Filter::NotExists(query),
            Filter::NotExists(query) => Filter::Exists(query),
            Filter::Not(inner) => *inner,
            filter => Filter::Not(Box::new(filter)),
        }
    }
}
