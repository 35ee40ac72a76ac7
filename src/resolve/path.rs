// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::access_error::AccessError;
use crate::expr::path::Path;
use crate::sql::token::SqlToken;

use super::context::{Clause, ResolutionContext};

/// Render a column path. The alias prefix appears only when the path is
/// anchored to a target that has an alias assigned in the current scope
/// chain, and never in a SET clause (INSERT column lists and UPDATE SET
/// assignments address columns of exactly one table). The wildcard `*` is
/// never processed or qualified.
pub(crate) fn resolve_path(
    path: &Path,
    ctx: &mut ResolutionContext<'_>,
) -> Result<SqlToken, AccessError> {
    if path.is_wildcard() {
        return SqlToken::new("*");
    }

    let column = ctx.dialect().process_path_name(&path.name);

    let qualified = if ctx.clause() == Some(Clause::Set) {
        None
    } else {
        path.parent
            .and_then(|parent| ctx.alias_of(parent))
            .map(|alias| format!("{alias}.{column}"))
    };

    SqlToken::new(qualified.unwrap_or(column))
}
