// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use maybe_owned::MaybeOwned;

use crate::access_error::AccessError;
use crate::expr::path::WILDCARD;
use crate::expr::projection::Projection;
use crate::expr::query::{QueryDescriptor, SubQuery};
use crate::expr::value::{ParameterValue, ValueKind};
use crate::expr::Expression;
use crate::resolve::context::{Clause, ResolutionContext};
use crate::resolve::registry::ResolverRegistry;
use crate::sql::dialect::Dialect;
use crate::sql::token::SqlToken;

/// One output column of a compiled query: the emitted label (`c0`, `c1`,
/// ...), the source name it was projected from, and the declared value kind
/// if the projection carried one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowColumn {
    pub label: String,
    pub source: String,
    pub kind: Option<ValueKind>,
}

/// The row-conversion contract of a compiled query: the ordered output
/// columns the statement layer should expect. Empty for a wildcard select,
/// where the column set is known only to the database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowLayout {
    pub columns: Vec<RowColumn>,
}

/// The compiled form of a [`QueryDescriptor`]: final SQL, the ordered
/// parameter list, the row layout, and the pagination integers for the
/// statement layer to apply through the dialect.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<ParameterValue>,
    pub layout: RowLayout,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Compile a query descriptor in one deterministic top-down pass.
pub fn compile_query(
    query: &QueryDescriptor,
    registry: &ResolverRegistry,
    dialect: &dyn Dialect,
) -> Result<CompiledQuery, AccessError> {
    let mut ctx = ResolutionContext::new(registry, dialect);
    let body = compile_select_body(query, &mut ctx, false)?;
    Ok(CompiledQuery {
        sql: body.sql,
        params: ctx.into_params(),
        layout: body.layout,
        limit: query.limit,
        offset: query.offset,
    })
}

pub(crate) struct SelectBody {
    pub sql: String,
    pub layout: RowLayout,
}

/// Assemble a SELECT in the fixed resolve order — FROM (aliases, joins),
/// WHERE, GROUP BY, HAVING, ORDER BY, then the projection list — independent
/// of declaration order in the descriptor. The projection list renders first
/// in the SQL text but resolves last; it binds no parameters (constants
/// render inline), so the parameter list stays aligned with placeholder
/// positions.
///
/// Pagination is inlined only for subqueries (`inline_pagination`); a
/// top-level query hands its limit/offset integers to the statement layer.
pub(crate) fn compile_select_body(
    query: &QueryDescriptor,
    ctx: &mut ResolutionContext<'_>,
    inline_pagination: bool,
) -> Result<SelectBody, AccessError> {
    let from = ctx.with_clause(Clause::From, |ctx| {
        ctx.resolve(Expression::Target(&query.target))
    })?;

    let where_sql = match &query.filter {
        Some(filter) => Some(ctx.with_clause(Clause::Where, |ctx| {
            ctx.resolve(Expression::Filter(filter))
        })?),
        None => None,
    };

    let group_sql = if query.group_by.is_empty() {
        None
    } else {
        Some(ctx.with_clause(Clause::GroupBy, |ctx| {
            let mut parts = Vec::with_capacity(query.group_by.len());
            for path in &query.group_by {
                parts.push(ctx.resolve(Expression::Path(path))?.into_text());
            }
            Ok::<_, AccessError>(parts.join(", "))
        })?)
    };

    let having_sql = match &query.having {
        Some(having) => {
            if group_sql.is_none() {
                return Err(AccessError::invalid(
                    "HAVING requires a GROUP BY aggregation",
                ));
            }
            Some(ctx.with_clause(Clause::Having, |ctx| {
                ctx.resolve(Expression::Filter(having))
            })?)
        }
        None => None,
    };

    let order_sql = match &query.sort {
        Some(sort) => Some(ctx.with_clause(Clause::OrderBy, |ctx| {
            ctx.resolve(Expression::Sort(sort))
        })?),
        None => None,
    };

    let (projection_sql, layout) =
        ctx.with_clause(Clause::Select, |ctx| select_list(&query.projections, ctx))?;

    let mut sql = format!("SELECT {projection_sql} FROM {from}");
    if let Some(where_sql) = where_sql {
        sql.push_str(" WHERE ");
        sql.push_str(where_sql.text());
    }
    if let Some(group_sql) = group_sql {
        sql.push_str(" GROUP BY ");
        sql.push_str(&group_sql);
    }
    if let Some(having_sql) = having_sql {
        sql.push_str(" HAVING ");
        sql.push_str(having_sql.text());
    }
    if let Some(order_sql) = order_sql {
        sql.push_str(" ORDER BY ");
        sql.push_str(order_sql.text());
    }
    if inline_pagination {
        if let Some(clause) = ctx.dialect().limit_clause(query.limit, query.offset) {
            sql.push(' ');
            sql.push_str(&clause);
        }
    }

    Ok(SelectBody { sql, layout })
}

/// Compile a nested query configuration in a child alias scope. Its
/// parameters join the enclosing pass's list; its pagination, if any, is
/// inlined since the statement layer never sees subqueries.
pub(crate) fn resolve_subquery(
    subquery: &SubQuery,
    ctx: &mut ResolutionContext<'_>,
) -> Result<SqlToken, AccessError> {
    let body = ctx.subquery_scope(|ctx| compile_select_body(&subquery.query, ctx, true))?;
    SqlToken::new(body.sql)
}

/// Flatten projections into output-column units (a property set contributes
/// one unit per member) and render them with per-column `AS cN` aliases.
/// Wildcard paths stay alias-free.
fn select_list(
    projections: &[Projection],
    ctx: &mut ResolutionContext<'_>,
) -> Result<(String, RowLayout), AccessError> {
    let units = projection_units(projections);
    if units.is_empty() {
        return Ok((WILDCARD.to_owned(), RowLayout::default()));
    }

    let mut parts = Vec::with_capacity(units.len());
    let mut columns = Vec::with_capacity(units.len());
    for (index, (unit, source)) in units.iter().enumerate() {
        let token = ctx.resolve(Expression::Projection(unit.as_ref()))?;

        if matches!(unit.as_ref(), Projection::Path(p) if p.is_wildcard()) {
            parts.push(token.into_text());
            continue;
        }

        let label = format!("c{index}");
        parts.push(format!("{token} AS {label}"));
        let kind = match unit.as_ref() {
            Projection::Path(path) => path.value_kind,
            _ => None,
        };
        columns.push(RowColumn {
            label,
            source: source.clone(),
            kind,
        });
    }

    Ok((parts.join(", "), RowLayout { columns }))
}

fn projection_units(projections: &[Projection]) -> Vec<(MaybeOwned<'_, Projection>, String)> {
    let mut units = Vec::new();
    for projection in projections {
        match projection {
            Projection::PropertySet(paths) => {
                for path in paths {
                    units.push((
                        MaybeOwned::Owned(Projection::Path(path.clone())),
                        path.name.clone(),
                    ));
                }
            }
            Projection::Path(path) => {
                units.push((MaybeOwned::Borrowed(projection), path.name.clone()));
            }
            Projection::Function(function) => {
                units.push((MaybeOwned::Borrowed(projection), function.kind.name().to_owned()));
            }
            Projection::Constant(_) => {
                units.push((MaybeOwned::Borrowed(projection), "constant".to_owned()));
            }
            Projection::CountAll => {
                units.push((MaybeOwned::Borrowed(projection), "count".to_owned()));
            }
        }
    }
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::filter::Filter;
    use crate::expr::function::SqlFunction;
    use crate::expr::sort::Sort;
    use crate::expr::target::Target;
    use crate::expr::value::Value;
    use crate::sql::dialect::AnsiDialect;

    fn scenario_query() -> (Target, QueryDescriptor) {
        let t = Target::new("T");
        let query = QueryDescriptor::from_target(t.clone())
            .filter(Filter::eq(t.path("keycode"), Value::Int(1)))
            .project(t.path("strv"));
        (t, query)
    }

    #[test]
    fn scenario_keyed_projection() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();
        let (_, query) = scenario_query();

        let compiled = compile_query(&query, &registry, &dialect).unwrap();
        assert_binding!(
            (compiled.sql, compiled.params),
            "SELECT t.strv AS c0 FROM T t WHERE t.keycode = ?",
            1i64
        );
        assert_eq!(compiled.layout.columns.len(), 1);
        assert_eq!(compiled.layout.columns[0].label, "c0");
        assert_eq!(compiled.layout.columns[0].source, "strv");
    }

    #[test]
    fn compilation_is_deterministic() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();
        let (_, query) = scenario_query();

        let first = compile_query(&query, &registry, &dialect).unwrap();
        let second = compile_query(&query, &registry, &dialect).unwrap();
        assert_eq!(first.sql, second.sql);
        assert_eq!(first.params, second.params);
    }

    #[test]
    fn suppressed_root_alias() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new().without_root_alias();
        let (_, query) = scenario_query();

        let compiled = compile_query(&query, &registry, &dialect).unwrap();
        assert_binding!(
            (compiled.sql, compiled.params),
            "SELECT strv AS c0 FROM T WHERE keycode = ?",
            1i64
        );
    }

    #[test]
    fn joins_expand_in_declaration_order() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();

        let orders = Target::new("Orders");
        let customers = Target::new("Customers");
        let items = Target::new("Items");
        let target = orders
            .clone()
            .left_join(
                customers.clone(),
                Filter::eq(orders.path("customer_id"), customers.path("id")),
            )
            .inner_join(
                items.clone(),
                Filter::eq(orders.path("id"), items.path("order_id")),
            );

        let query = QueryDescriptor::from_target(target).project(customers.path("name"));
        let compiled = compile_query(&query, &registry, &dialect).unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT c.name AS c0 FROM Orders o LEFT JOIN Customers c ON o.customer_id = c.id \
             JOIN Items i ON o.id = i.order_id"
        );
    }

    #[test]
    fn outer_keyword_is_dialect_gated() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new().with_explicit_outer_join();

        let orders = Target::new("Orders");
        let customers = Target::new("Customers");
        let target = orders.clone().right_join(
            customers.clone(),
            Filter::eq(orders.path("customer_id"), customers.path("id")),
        );

        let query = QueryDescriptor::from_target(target).project(orders.path("id"));
        let compiled = compile_query(&query, &registry, &dialect).unwrap();
        assert!(compiled.sql.contains("RIGHT OUTER JOIN Customers c"));
    }

    #[test]
    fn aggregation_with_having() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();

        let t = Target::new("Orders");
        let query = QueryDescriptor::from_target(t.clone())
            .project(t.path("customer_id"))
            .project(SqlFunction::count(t.path("id")))
            .group_by(t.path("customer_id"))
            .having(Filter::gt(
                SqlFunction::count(t.path("id")),
                Value::Int(10),
            ));

        let compiled = compile_query(&query, &registry, &dialect).unwrap();
        assert_binding!(
            (compiled.sql, compiled.params),
            "SELECT o.customer_id AS c0, COUNT(o.id) AS c1 FROM Orders o \
             GROUP BY o.customer_id HAVING COUNT(o.id) > ?",
            10i64
        );
    }

    #[test]
    fn having_without_group_by_is_rejected() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();

        let t = Target::new("Orders");
        let query = QueryDescriptor::from_target(t.clone())
            .having(Filter::gt(SqlFunction::count(t.path("id")), Value::Int(1)));

        assert!(compile_query(&query, &registry, &dialect).is_err());
    }

    #[test]
    fn sort_renders_after_filters() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();

        let t = Target::new("T");
        let query = QueryDescriptor::from_target(t.clone())
            .filter(Filter::not_null(t.path("strv")))
            .sort(Sort::desc(t.path("keycode")))
            .project(t.path("strv"));

        let compiled = compile_query(&query, &registry, &dialect).unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT t.strv AS c0 FROM T t WHERE t.strv IS NOT NULL ORDER BY t.keycode DESC"
        );
    }

    #[test]
    fn pagination_stays_out_of_top_level_sql() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();

        let t = Target::new("T");
        let query = QueryDescriptor::from_target(t.clone())
            .project(t.path("strv"))
            .limit(20)
            .offset(10);

        let compiled = compile_query(&query, &registry, &dialect).unwrap();
        assert!(!compiled.sql.contains("LIMIT"));
        assert_eq!(compiled.limit, Some(20));
        assert_eq!(compiled.offset, Some(10));
    }

    #[test]
    fn correlated_exists_uses_child_scope_and_one_param_list() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();

        let t = Target::new("T");
        let tags = Target::new("Tags");
        let sub = QueryDescriptor::from_target(tags.clone())
            .filter(Filter::eq(tags.path("t_id"), t.path("keycode")))
            .filter(Filter::eq(tags.path("label"), Value::from("new")))
            .project(tags.path("id"));

        let query = QueryDescriptor::from_target(t.clone())
            .filter(Filter::gt(t.path("keycode"), Value::Int(0)))
            .filter(Filter::exists(sub.into()))
            .project(t.path("strv"));

        let compiled = compile_query(&query, &registry, &dialect).unwrap();
        assert_binding!(
            (compiled.sql, compiled.params),
            "SELECT t.strv AS c0 FROM T t WHERE (t.keycode > ?) AND (EXISTS \
             (SELECT t2.id AS c0 FROM Tags t2 WHERE (t2.t_id = t.keycode) AND (t2.label = ?)))",
            0i64,
            "new"
        );
    }

    #[test]
    fn wildcard_projection_is_unaliased() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();

        let t = Target::new("T");
        let query = QueryDescriptor::from_target(t.clone()).project(t.wildcard());

        let compiled = compile_query(&query, &registry, &dialect).unwrap();
        assert_eq!(compiled.sql, "SELECT * FROM T t");
        assert!(compiled.layout.columns.is_empty());
    }
}
