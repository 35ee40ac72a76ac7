// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::access_error::AccessError;
use crate::expr::sort::Sort;
use crate::expr::Expression;
use crate::sql::token::SqlToken;

use super::context::ResolutionContext;

/// Resolve a sort to its ORDER BY key list (without the keyword).
/// Composite sorts flatten in declaration order: the first-declared key is
/// the primary sort key.
pub(crate) fn resolve_sort(
    sort: &Sort,
    ctx: &mut ResolutionContext<'_>,
) -> Result<SqlToken, AccessError> {
    let keys = sort.flatten();
    if keys.is_empty() {
        return Err(AccessError::invalid("empty composite sort"));
    }

    let mut parts = Vec::with_capacity(keys.len());
    for (path, direction) in keys {
        let path = ctx.resolve(Expression::Path(path))?;
        parts.push(format!("{path} {}", direction.sql()));
    }
    SqlToken::new(parts.join(", "))
}
