// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::access_error::AccessError;
use crate::expr::function::SqlFunction;
use crate::sql::token::SqlToken;

use super::context::ResolutionContext;
use super::{apply_template, resolve_operand};

/// Resolve a function application: the operand resolves first, then the
/// dialect supplies the SQL template for the function kind. A kind the
/// dialect does not know is a hard resolution failure, never a best-effort
/// fallback.
pub(crate) fn resolve_function(
    function: &SqlFunction,
    ctx: &mut ResolutionContext<'_>,
) -> Result<SqlToken, AccessError> {
    let arg = match &function.arg {
        Some(operand) => Some(resolve_operand(operand, ctx)?),
        None => None,
    };

    let template = ctx
        .dialect()
        .function_template(&function.kind)
        .ok_or_else(|| {
            AccessError::invalid(format!(
                "function {} is not supported by the active dialect",
                function.kind.name()
            ))
        })?;

    let sql = apply_template(
        &template,
        arg.as_ref().map(|t| t.text()),
        function.kind.name(),
    )?;
    SqlToken::new(sql)
}

#[cfg(test)]
mod tests {
    use crate::expr::function::{FunctionKind, SqlFunction};
    use crate::expr::target::Target;
    use crate::expr::Expression;
    use crate::sql::dialect::AnsiDialect;

    use super::super::context::ResolutionContext;
    use super::super::registry::ResolverRegistry;

    #[test]
    fn aggregate_uses_dialect_template() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();
        let mut ctx = ResolutionContext::new(&registry, &dialect);

        let t = Target::new("T");
        ctx.assign_alias(&t);
        let function = SqlFunction::count(t.path("keycode"));
        let token = ctx.resolve(Expression::Function(&function)).unwrap();
        assert_eq!(token.text(), "COUNT(t.keycode)");
    }

    #[test]
    fn temporal_extraction() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();
        let mut ctx = ResolutionContext::new(&registry, &dialect);

        let t = Target::new("T");
        ctx.assign_alias(&t);
        let function = SqlFunction::year(t.path("created"));
        let token = ctx.resolve(Expression::Function(&function)).unwrap();
        assert_eq!(token.text(), "EXTRACT(YEAR FROM t.created)");
    }

    #[test]
    fn nullary_function_has_no_operand() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();
        let mut ctx = ResolutionContext::new(&registry, &dialect);

        let function = SqlFunction::current_timestamp();
        let token = ctx.resolve(Expression::Function(&function)).unwrap();
        assert_eq!(token.text(), "CURRENT_TIMESTAMP");

        let t = Target::new("T");
        let misapplied = SqlFunction::new(FunctionKind::CurrentDate, t.path("x"));
        assert!(ctx.resolve(Expression::Function(&misapplied)).is_err());
    }

    #[test]
    fn unknown_function_is_a_hard_failure() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();
        let mut ctx = ResolutionContext::new(&registry, &dialect);

        let t = Target::new("T");
        let function = SqlFunction::custom("soundex", t.path("name"));
        let err = ctx.resolve(Expression::Function(&function)).unwrap_err();
        assert!(err.to_string().contains("soundex"));
    }
}
