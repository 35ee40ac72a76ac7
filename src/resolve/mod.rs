// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Expression resolution: the dispatch registry, the per-pass context, and
//! the built-in recursive-descent visitors from expression-tree nodes to
//! SQL tokens.

pub mod context;
pub mod registry;

pub(crate) mod filter;
pub(crate) mod function;
pub(crate) mod literal;
pub(crate) mod path;
pub(crate) mod projection;
pub(crate) mod sort;
pub(crate) mod target;

use crate::access_error::AccessError;
use crate::expr::filter::Operand;
use crate::expr::Expression;
use crate::sql::token::SqlToken;

use context::ResolutionContext;

/// Resolve a filter/assignment operand through the registry.
pub(crate) fn resolve_operand(
    operand: &Operand,
    ctx: &mut ResolutionContext<'_>,
) -> Result<SqlToken, AccessError> {
    match operand {
        Operand::Path(p) => ctx.resolve(Expression::Path(p)),
        Operand::Literal(v) => ctx.resolve(Expression::Literal(v)),
        Operand::Function(f) => ctx.resolve(Expression::Function(f)),
        Operand::Query(q) => {
            let inner = ctx.resolve(Expression::SubQuery(q))?;
            SqlToken::new(format!("({inner})"))
        }
    }
}

/// Substitute the operand into a dialect function template (`{}` marks the
/// operand position).
pub(crate) fn apply_template(
    template: &str,
    arg: Option<&str>,
    kind_name: &str,
) -> Result<String, AccessError> {
    match (template.contains("{}"), arg) {
        (true, Some(arg)) => Ok(template.replacen("{}", arg, 1)),
        (true, None) => Err(AccessError::invalid(format!(
            "function {kind_name} requires an operand"
        ))),
        (false, None) => Ok(template.to_owned()),
        (false, Some(_)) => Err(AccessError::invalid(format!(
            "function {kind_name} does not take an operand"
        ))),
    }
}
