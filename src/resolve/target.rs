// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::access_error::AccessError;
use crate::expr::target::{JoinType, Target};
use crate::expr::Expression;
use crate::sql::token::SqlToken;

use super::context::ResolutionContext;

/// Resolve a target into its FROM fragment, assigning aliases and expanding
/// joins in declaration order. The root target is aliased when it carries an
/// explicit alias, participates in a join, or the dialect asks for root
/// aliases; joined targets are always aliased. Join ON filters resolve after
/// both sides have their aliases, so either side qualifies correctly.
pub(crate) fn resolve_target(
    target: &Target,
    ctx: &mut ResolutionContext<'_>,
) -> Result<SqlToken, AccessError> {
    let mut sql = ctx.dialect().process_path_name(&target.name);

    let alias_root =
        target.alias.is_some() || !target.joins.is_empty() || ctx.dialect().alias_root_targets();
    if alias_root {
        let alias = ctx.assign_alias(target);
        sql.push(' ');
        sql.push_str(&alias);
    }

    append_joins(&mut sql, target, ctx)?;
    SqlToken::new(sql)
}

fn append_joins(
    sql: &mut String,
    parent: &Target,
    ctx: &mut ResolutionContext<'_>,
) -> Result<(), AccessError> {
    for join in &parent.joins {
        let keyword = join_keyword(join.kind, ctx.dialect().explicit_outer_join());
        let name = ctx.dialect().process_path_name(&join.target.name);
        let alias = ctx.assign_alias(&join.target);
        let on = ctx.resolve(Expression::Filter(&join.on))?;
        sql.push_str(&format!(" {keyword} {name} {alias} ON {on}"));

        append_joins(sql, &join.target, ctx)?;
    }
    Ok(())
}

fn join_keyword(kind: JoinType, explicit_outer: bool) -> &'static str {
    match (kind, explicit_outer) {
        (JoinType::Inner, _) => "JOIN",
        (JoinType::Left, false) => "LEFT JOIN",
        (JoinType::Left, true) => "LEFT OUTER JOIN",
        (JoinType::Right, false) => "RIGHT JOIN",
        (JoinType::Right, true) => "RIGHT OUTER JOIN",
    }
}
