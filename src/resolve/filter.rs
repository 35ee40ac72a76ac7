// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::access_error::AccessError;
use crate::expr::filter::{Filter, InValues, MatchMode, Operand};
use crate::expr::function::FunctionKind;
use crate::expr::value::{ParameterValue, Value};
use crate::expr::Expression;
use crate::sql::token::SqlToken;

use super::context::ResolutionContext;
use super::{apply_template, resolve_operand};

/// The reserved LIKE escape character. It is escaped in pattern literals
/// together with the wildcard metacharacters before wildcards are injected.
const LIKE_ESCAPE: char = '!';

/// Resolve a filter node to a boolean SQL fragment, one case per variant.
pub(crate) fn resolve_filter(
    filter: &Filter,
    ctx: &mut ResolutionContext<'_>,
) -> Result<SqlToken, AccessError> {
    match filter {
        Filter::And(children) => logical_combine(children, "AND", ctx),
        Filter::Or(children) => logical_combine(children, "OR", ctx),
        Filter::Not(child) => {
            let inner = ctx.resolve(Expression::Filter(child))?;
            SqlToken::new(format!("NOT ({inner})"))
        }
        Filter::Compare { op, left, right } => {
            require_operand(right, "comparison right")?;
            let left = resolve_operand(left, ctx)?;
            let right = resolve_operand(right, ctx)?;
            SqlToken::new(format!("{left} {} {right}", op.sql()))
        }
        Filter::Between { left, low, high } => {
            require_operand(low, "BETWEEN low")?;
            require_operand(high, "BETWEEN high")?;
            let left = resolve_operand(left, ctx)?;
            let low = resolve_operand(low, ctx)?;
            let high = resolve_operand(high, ctx)?;
            SqlToken::new(format!("{left} BETWEEN {low} AND {high}"))
        }
        Filter::In { left, values } => resolve_in(left, values, false, ctx),
        Filter::NotIn { left, values } => resolve_in(left, values, true, ctx),
        Filter::Null(operand) => {
            let operand = resolve_operand(operand, ctx)?;
            SqlToken::new(format!("{operand} IS NULL"))
        }
        Filter::NotNull(operand) => {
            let operand = resolve_operand(operand, ctx)?;
            SqlToken::new(format!("{operand} IS NOT NULL"))
        }
        Filter::Match {
            mode,
            ignore_case,
            left,
            pattern,
        } => resolve_match(*mode, *ignore_case, left, pattern, ctx),
        Filter::Exists(query) => {
            let inner = ctx.resolve(Expression::SubQuery(query))?;
            SqlToken::new(format!("EXISTS ({inner})"))
        }
        Filter::NotExists(query) => {
            let inner = ctx.resolve(Expression::SubQuery(query))?;
            SqlToken::new(format!("NOT EXISTS ({inner})"))
        }
    }
}

/// Every compare/between/in node must resolve a non-null right operand; a
/// literal NULL there would render `= NULL`, which no dialect evaluates the
/// way callers expect.
fn require_operand(operand: &Operand, role: &str) -> Result<(), AccessError> {
    match operand {
        Operand::Literal(value) if value.is_null() => Err(AccessError::invalid(format!(
            "missing required {role} operand: literal NULL; use an IS [NOT] NULL filter"
        ))),
        _ => Ok(()),
    }
}

fn logical_combine(
    children: &[Filter],
    op: &str,
    ctx: &mut ResolutionContext<'_>,
) -> Result<SqlToken, AccessError> {
    if children.is_empty() {
        return Err(AccessError::invalid(format!("empty {op} filter")));
    }
    let mut parts = Vec::with_capacity(children.len());
    for child in children {
        let token = ctx.resolve(Expression::Filter(child))?;
        parts.push(format!("({token})"));
    }
    SqlToken::new(parts.join(&format!(" {op} ")))
}

fn resolve_in(
    left: &Operand,
    values: &InValues,
    negated: bool,
    ctx: &mut ResolutionContext<'_>,
) -> Result<SqlToken, AccessError> {
    let keyword = if negated { "NOT IN" } else { "IN" };
    match values {
        // An empty literal collection would render `IN ()`, which is not
        // valid SQL; it short-circuits to a constant predicate instead.
        InValues::List(list) if list.is_empty() => {
            SqlToken::new(ctx.dialect().constant_predicate(negated))
        }
        InValues::List(list) => {
            let left = resolve_operand(left, ctx)?;
            let mut rendered = Vec::with_capacity(list.len());
            for value in list {
                rendered.push(ctx.resolve(Expression::Literal(value))?.into_text());
            }
            SqlToken::new(format!("{left} {keyword} ({})", rendered.join(", ")))
        }
        InValues::Query(query) => {
            let left = resolve_operand(left, ctx)?;
            let inner = ctx.resolve(Expression::SubQuery(query))?;
            SqlToken::new(format!("{left} {keyword} ({inner})"))
        }
    }
}

fn resolve_match(
    mode: MatchMode,
    ignore_case: bool,
    left: &Operand,
    pattern: &Operand,
    ctx: &mut ResolutionContext<'_>,
) -> Result<SqlToken, AccessError> {
    let raw = match pattern {
        Operand::Literal(Value::Text(s)) => s,
        other => {
            return Err(AccessError::invalid(format!(
                "string match pattern must be a text literal, got {other:?}"
            )));
        }
    };

    let escaping = ctx.dialect().supports_like_escape();

    // escape before wildcards are added, so user text never acts as a wildcard
    let mut body = if escaping {
        escape_like(raw)
    } else {
        raw.clone()
    };
    if ignore_case {
        body = body.to_lowercase();
    }
    let pattern_text = match mode {
        MatchMode::Contains => format!("%{body}%"),
        MatchMode::StartsWith => format!("{body}%"),
        MatchMode::EndsWith => format!("%{body}"),
    };

    let left = resolve_operand(left, ctx)?;
    let left = if ignore_case {
        let template = ctx
            .dialect()
            .function_template(&FunctionKind::Lower)
            .ok_or_else(|| {
                AccessError::invalid(
                    "case-insensitive match requires a case-folding function in the dialect",
                )
            })?;
        apply_template(&template, Some(left.text()), FunctionKind::Lower.name())?
    } else {
        left.into_text()
    };

    let bound = ctx.bind(ParameterValue::new(Value::Text(pattern_text)))?;
    let suffix = if escaping {
        format!(" ESCAPE '{LIKE_ESCAPE}'")
    } else {
        String::new()
    };
    SqlToken::new(format!("{left} LIKE {bound}{suffix}"))
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, LIKE_ESCAPE | '%' | '_' | '[') {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::target::Target;
    use crate::sql::dialect::AnsiDialect;

    use super::super::registry::ResolverRegistry;

    fn resolve(
        filter: &Filter,
        dialect: &AnsiDialect,
    ) -> Result<(String, Vec<ParameterValue>), AccessError> {
        let registry = ResolverRegistry::builtin();
        let mut ctx = ResolutionContext::new(&registry, dialect);
        let token = ctx.resolve(Expression::Filter(filter))?;
        Ok((token.into_text(), ctx.into_params()))
    }

    fn aliased_resolve(
        target: &Target,
        filter: &Filter,
        dialect: &AnsiDialect,
    ) -> Result<(String, Vec<ParameterValue>), AccessError> {
        let registry = ResolverRegistry::builtin();
        let mut ctx = ResolutionContext::new(&registry, dialect);
        ctx.assign_alias(target);
        let token = ctx.resolve(Expression::Filter(filter))?;
        Ok((token.into_text(), ctx.into_params()))
    }

    #[test]
    fn comparison() {
        let dialect = AnsiDialect::new();
        let t = Target::new("T");
        let filter = Filter::eq(t.path("keycode"), Value::Int(1));

        assert_binding!(aliased_resolve(&t, &filter, &dialect).unwrap(), "t.keycode = ?", 1i64);
    }

    #[test]
    fn unaliased_paths_render_bare() {
        let dialect = AnsiDialect::new();
        let t = Target::new("T");
        let filter = Filter::gt(t.path("keycode"), Value::Int(5));

        assert_binding!(resolve(&filter, &dialect).unwrap(), "keycode > ?", 5i64);
    }

    #[test]
    fn and_or_parenthesize_each_child() {
        let dialect = AnsiDialect::new();
        let t = Target::new("T");
        let filter = Filter::and(
            Filter::eq(t.path("a"), Value::Int(1)),
            Filter::or(
                Filter::eq(t.path("b"), Value::Int(2)),
                Filter::eq(t.path("c"), Value::Int(3)),
            ),
        );

        assert_binding!(
            aliased_resolve(&t, &filter, &dialect).unwrap(),
            "(t.a = ?) AND ((t.b = ?) OR (t.c = ?))",
            1i64,
            2i64,
            3i64
        );
    }

    #[test]
    fn between_binds_in_emission_order() {
        let dialect = AnsiDialect::new();
        let t = Target::new("T");
        let filter = Filter::between(t.path("keycode"), Value::Int(1), Value::Int(2));

        assert_binding!(
            aliased_resolve(&t, &filter, &dialect).unwrap(),
            "t.keycode BETWEEN ? AND ?",
            1i64,
            2i64
        );
    }

    #[test]
    fn in_list() {
        let dialect = AnsiDialect::new();
        let t = Target::new("T");
        let filter = Filter::in_list(t.path("keycode"), [Value::Int(1), Value::Int(2)]);

        assert_binding!(
            aliased_resolve(&t, &filter, &dialect).unwrap(),
            "t.keycode IN (?, ?)",
            1i64,
            2i64
        );
    }

    #[test]
    fn empty_in_short_circuits() {
        let dialect = AnsiDialect::new();
        let t = Target::new("T");

        let never = Filter::in_list(t.path("keycode"), []);
        assert_binding!(resolve(&never, &dialect).unwrap(), "FALSE");

        let always = Filter::not_in_list(t.path("keycode"), []);
        assert_binding!(resolve(&always, &dialect).unwrap(), "TRUE");
    }

    #[test]
    fn null_checks() {
        let dialect = AnsiDialect::new();
        let t = Target::new("T");

        assert_binding!(
            resolve(&Filter::is_null(t.path("strv")), &dialect).unwrap(),
            "strv IS NULL"
        );
        assert_binding!(
            resolve(&Filter::not_null(t.path("strv")), &dialect).unwrap(),
            "strv IS NOT NULL"
        );
    }

    #[test]
    fn null_comparison_operand_is_rejected() {
        let dialect = AnsiDialect::new();
        let t = Target::new("T");
        let filter = Filter::eq(t.path("strv"), Value::Null);

        let err = resolve(&filter, &dialect).unwrap_err();
        assert!(err.to_string().contains("IS [NOT] NULL"));
    }

    #[test]
    fn contains_escapes_wildcards_before_injecting() {
        let dialect = AnsiDialect::new();
        let t = Target::new("T");
        let filter = Filter::contains(t.path("strv"), Value::from("100%"));

        // the literal percent is escaped; the injected wildcards are not
        assert_binding!(
            aliased_resolve(&t, &filter, &dialect).unwrap(),
            "t.strv LIKE ? ESCAPE '!'",
            "%100!%%"
        );
    }

    #[test]
    fn match_modes_place_wildcards() {
        let dialect = AnsiDialect::new();
        let t = Target::new("T");

        assert_binding!(
            resolve(&Filter::starts_with(t.path("strv"), Value::from("ab")), &dialect).unwrap(),
            "strv LIKE ? ESCAPE '!'",
            "ab%"
        );
        assert_binding!(
            resolve(&Filter::ends_with(t.path("strv"), Value::from("ab")), &dialect).unwrap(),
            "strv LIKE ? ESCAPE '!'",
            "%ab"
        );
    }

    #[test]
    fn match_without_escape_support() {
        let dialect = AnsiDialect::new().without_like_escape();
        let t = Target::new("T");
        let filter = Filter::contains(t.path("strv"), Value::from("ab"));

        assert_binding!(resolve(&filter, &dialect).unwrap(), "strv LIKE ?", "%ab%");
    }

    #[test]
    fn ignore_case_folds_both_sides() {
        let dialect = AnsiDialect::new();
        let t = Target::new("T");
        let filter = Filter::matches(
            MatchMode::Contains,
            true,
            t.path("strv"),
            Operand::literal("AbC"),
        );

        assert_binding!(
            aliased_resolve(&t, &filter, &dialect).unwrap(),
            "LOWER(t.strv) LIKE ? ESCAPE '!'",
            "%abc%"
        );
    }

    #[test]
    fn non_literal_match_pattern_is_rejected() {
        let dialect = AnsiDialect::new();
        let t = Target::new("T");
        let filter = Filter::contains(t.path("strv"), t.path("other"));

        assert!(resolve(&filter, &dialect).is_err());
    }

    #[test]
    fn not_wraps_non_invertible_filters() {
        let dialect = AnsiDialect::new();
        let t = Target::new("T");
        let filter = Filter::Not(Box::new(Filter::contains(t.path("strv"), Value::from("x"))));

        assert_binding!(
            resolve(&filter, &dialect).unwrap(),
            "NOT (strv LIKE ? ESCAPE '!')",
            "%x%"
        );
    }
}
