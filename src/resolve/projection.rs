// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::access_error::AccessError;
use crate::expr::projection::Projection;
use crate::expr::value::Value;
use crate::expr::Expression;
use crate::sql::token::SqlToken;

use super::context::ResolutionContext;

/// Resolve a projection element to its select-list fragment (without the
/// output alias, which the query compiler assigns per column).
pub(crate) fn resolve_projection(
    projection: &Projection,
    ctx: &mut ResolutionContext<'_>,
) -> Result<SqlToken, AccessError> {
    match projection {
        Projection::Path(path) => ctx.resolve(Expression::Path(path)),
        Projection::PropertySet(paths) => {
            if paths.is_empty() {
                return Err(AccessError::invalid("empty property-set projection"));
            }
            let mut parts = Vec::with_capacity(paths.len());
            for path in paths {
                parts.push(ctx.resolve(Expression::Path(path))?.into_text());
            }
            SqlToken::new(parts.join(", "))
        }
        Projection::Function(function) => ctx.resolve(Expression::Function(function)),
        Projection::Constant(value) => SqlToken::new(render_constant(value)?),
        Projection::CountAll => SqlToken::new("COUNT(*)"),
    }
}

/// Render a constant projection inline. The select list is resolved after
/// the other clauses but emitted first, so it must not bind parameters —
/// inline rendering (with quote doubling for text) keeps the placeholder
/// order aligned with the parameter list.
pub(crate) fn render_constant(value: &Value) -> Result<String, AccessError> {
    match value {
        Value::Null => Ok("NULL".to_owned()),
        Value::Bool(true) => Ok("TRUE".to_owned()),
        Value::Bool(false) => Ok("FALSE".to_owned()),
        Value::Int(n) => Ok(n.to_string()),
        Value::Float(n) => Ok(n.to_string()),
        Value::Text(s) => Ok(format!("'{}'", s.replace('\'', "''"))),
        other => Err(AccessError::invalid(format!(
            "unsupported constant projection of kind {}",
            other.kind_name()
        ))),
    }
}
