// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use tracing::trace;

use crate::access_error::AccessError;
use crate::expr::{Expression, ExpressionKind};
use crate::sql::token::SqlToken;

use super::context::ResolutionContext;

/// What a resolver produces. Currently every resolution path targets an SQL
/// token; the kind is explicit so per-target dispatch tables stay possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveTarget {
    Token,
}

impl std::fmt::Display for ResolveTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveTarget::Token => f.write_str("Token"),
        }
    }
}

type ResolverFn = dyn Fn(Expression<'_>, &mut ResolutionContext<'_>) -> Result<Option<SqlToken>, AccessError>
    + Send
    + Sync;

#[derive(Clone)]
struct ResolverEntry {
    source: ExpressionKind,
    target: ResolveTarget,
    priority: i16,
    seq: u64,
    label: String,
    resolver: Arc<ResolverFn>,
}

/// The ordered dispatch table from (expression kind, target kind) to
/// resolution functions.
///
/// Entries are sorted once at registration time: higher priority first,
/// ties broken by registration order with the *later* registration tried
/// first, so a per-query registration shadows a same-priority default. A
/// resolver may decline by returning `Ok(None)`, in which case dispatch
/// falls through to the next entry; exhausting the table is a hard
/// [`AccessError::InvalidExpression`] naming the registered entries — never
/// a silent default.
#[derive(Clone, Default)]
pub struct ResolverRegistry {
    entries: Vec<ResolverEntry>,
    next_seq: u64,
}

impl ResolverRegistry {
    /// An empty registry. Useful as the carrier of per-query registrations
    /// to merge over a datastore's registry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The registry with the built-in visitors for every expression kind.
    pub fn builtin() -> Self {
        use super::{filter, function, literal, path, projection, sort, target};
        use crate::compile::select;

        let mut registry = Self::empty();
        registry.register(ExpressionKind::Literal, ResolveTarget::Token, 0, "literal", |expr, ctx| {
            match expr {
                Expression::Literal(value) => literal::resolve_literal(value, ctx).map(Some),
                _ => Ok(None),
            }
        });
        registry.register(ExpressionKind::Path, ResolveTarget::Token, 0, "path", |expr, ctx| {
            match expr {
                Expression::Path(p) => path::resolve_path(p, ctx).map(Some),
                _ => Ok(None),
            }
        });
        registry.register(ExpressionKind::Function, ResolveTarget::Token, 0, "function", |expr, ctx| {
            match expr {
                Expression::Function(f) => function::resolve_function(f, ctx).map(Some),
                _ => Ok(None),
            }
        });
        registry.register(ExpressionKind::Filter, ResolveTarget::Token, 0, "filter", |expr, ctx| {
            match expr {
                Expression::Filter(f) => filter::resolve_filter(f, ctx).map(Some),
                _ => Ok(None),
            }
        });
        registry.register(ExpressionKind::Sort, ResolveTarget::Token, 0, "sort", |expr, ctx| {
            match expr {
                Expression::Sort(s) => sort::resolve_sort(s, ctx).map(Some),
                _ => Ok(None),
            }
        });
        registry.register(ExpressionKind::Projection, ResolveTarget::Token, 0, "projection", |expr, ctx| {
            match expr {
                Expression::Projection(p) => projection::resolve_projection(p, ctx).map(Some),
                _ => Ok(None),
            }
        });
        registry.register(ExpressionKind::Target, ResolveTarget::Token, 0, "target", |expr, ctx| {
            match expr {
                Expression::Target(t) => target::resolve_target(t, ctx).map(Some),
                _ => Ok(None),
            }
        });
        registry.register(ExpressionKind::SubQuery, ResolveTarget::Token, 0, "subquery", |expr, ctx| {
            match expr {
                Expression::SubQuery(q) => select::resolve_subquery(q, ctx).map(Some),
                _ => Ok(None),
            }
        });
        registry
    }

    pub fn register<F>(
        &mut self,
        source: ExpressionKind,
        target: ResolveTarget,
        priority: i16,
        label: impl Into<String>,
        resolver: F,
    ) where
        F: Fn(Expression<'_>, &mut ResolutionContext<'_>) -> Result<Option<SqlToken>, AccessError>
            + Send
            + Sync
            + 'static,
    {
        self.push_entry(source, target, priority, label.into(), Arc::new(resolver));
    }

    fn push_entry(
        &mut self,
        source: ExpressionKind,
        target: ResolveTarget,
        priority: i16,
        label: String,
        resolver: Arc<ResolverFn>,
    ) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(ResolverEntry {
            source,
            target,
            priority,
            seq,
            label,
            resolver,
        });
        self.entries
            .sort_by(|a, b| b.priority.cmp(&a.priority).then(b.seq.cmp(&a.seq)));
    }

    /// A registry with `local`'s entries merged over this one's. Local
    /// entries are re-sequenced after every existing entry, so at equal
    /// priority they shadow the inherited defaults.
    pub fn merged_with(&self, local: &ResolverRegistry) -> ResolverRegistry {
        let mut merged = self.clone();
        let mut local_entries: Vec<_> = local.entries.iter().collect();
        local_entries.sort_by_key(|e| e.seq);
        for entry in local_entries {
            merged.push_entry(
                entry.source,
                entry.target,
                entry.priority,
                entry.label.clone(),
                entry.resolver.clone(),
            );
        }
        merged
    }

    /// Resolve an expression to an SQL token.
    pub fn resolve(
        &self,
        expr: Expression<'_>,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<SqlToken, AccessError> {
        let kind = expr.kind();
        for entry in &self.entries {
            if entry.source != kind || entry.target != ResolveTarget::Token {
                continue;
            }
            trace!(resolver = %entry.label, %kind, "dispatching resolver");
            if let Some(token) = (entry.resolver)(expr, ctx)? {
                return Ok(token);
            }
        }
        Err(AccessError::invalid(format!(
            "no resolver produced a token for {kind} expression {expr:?}; registered: [{}]",
            self.describe()
        )))
    }

    fn describe(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}({}->{}, priority {})", e.label, e.source, e.target, e.priority))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::value::Value;
    use crate::sql::dialect::AnsiDialect;

    #[test]
    fn higher_priority_wins() {
        let mut registry = ResolverRegistry::builtin();
        registry.register(
            ExpressionKind::Literal,
            ResolveTarget::Token,
            10,
            "literal-inline",
            |expr, _ctx| match expr {
                Expression::Literal(Value::Int(n)) => SqlToken::new(n.to_string()).map(Some),
                _ => Ok(None),
            },
        );

        let dialect = AnsiDialect::new();
        let mut ctx = ResolutionContext::new(&registry, &dialect);
        let value = Value::Int(42);
        let token = ctx.resolve(Expression::Literal(&value)).unwrap();

        // the override rendered inline instead of binding a parameter
        assert_eq!(token.text(), "42");
        assert!(ctx.params().is_empty());
    }

    #[test]
    fn later_registration_shadows_same_priority() {
        let mut local = ResolverRegistry::empty();
        local.register(
            ExpressionKind::Literal,
            ResolveTarget::Token,
            0,
            "literal-upper",
            |expr, _ctx| match expr {
                Expression::Literal(Value::Text(s)) => {
                    SqlToken::new(format!("'{}'", s.to_uppercase())).map(Some)
                }
                _ => Ok(None),
            },
        );
        let registry = ResolverRegistry::builtin().merged_with(&local);

        let dialect = AnsiDialect::new();
        let mut ctx = ResolutionContext::new(&registry, &dialect);
        let value = Value::from("abc");
        let token = ctx.resolve(Expression::Literal(&value)).unwrap();
        assert_eq!(token.text(), "'ABC'");
    }

    #[test]
    fn declining_resolver_falls_through() {
        let mut registry = ResolverRegistry::builtin();
        registry.register(
            ExpressionKind::Literal,
            ResolveTarget::Token,
            10,
            "int-only",
            |expr, _ctx| match expr {
                Expression::Literal(Value::Int(n)) => SqlToken::new(n.to_string()).map(Some),
                _ => Ok(None),
            },
        );

        let dialect = AnsiDialect::new();
        let mut ctx = ResolutionContext::new(&registry, &dialect);
        let value = Value::from("abc");
        // the override declines text literals; the builtin binds a parameter
        let token = ctx.resolve(Expression::Literal(&value)).unwrap();
        assert_eq!(token.text(), "?");
        assert_eq!(ctx.params().len(), 1);
    }

    #[test]
    fn missing_resolver_reports_registered_entries() {
        let registry = ResolverRegistry::empty();
        let dialect = AnsiDialect::new();
        let mut ctx = ResolutionContext::new(&registry, &dialect);
        let value = Value::Int(1);

        let err = ctx.resolve(Expression::Literal(&value)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("no resolver"), "got: {message}");
        assert!(message.contains("Literal"), "got: {message}");
    }
}
