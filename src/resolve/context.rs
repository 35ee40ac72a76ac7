// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;

use crate::access_error::AccessError;
use crate::expr::target::{Target, TargetId};
use crate::expr::value::ParameterValue;
use crate::expr::Expression;
use crate::sql::dialect::Dialect;
use crate::sql::token::SqlToken;

use super::registry::ResolverRegistry;

/// The clause a fragment is being resolved for. Dialect hooks and path
/// rendering are clause-sensitive: a path in a SET clause renders
/// unqualified, a path in WHERE carries its target alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    From,
    Where,
    Set,
    GroupBy,
    Having,
    OrderBy,
    Select,
}

#[derive(Debug, Default)]
struct AliasScope {
    aliases: IndexMap<TargetId, String>,
}

/// Mutable state of one compile pass.
///
/// Alias assignment is stable for the lifetime of the pass: the same target
/// maps to the same alias on every lookup. A subquery opens a child alias
/// scope chained to the parent — lookups walk outward (so correlated paths
/// reuse the enclosing alias), assignments land in the innermost scope and
/// are discarded when the scope closes, and synthetic alias generation
/// consults the whole chain so no two scopes collide.
///
/// The parameter list is deliberately *not* scoped: all parameters bound
/// anywhere in the pass, subqueries included, append to one ordered list
/// matching the single final prepared statement.
pub struct ResolutionContext<'r> {
    registry: &'r ResolverRegistry,
    dialect: &'r dyn Dialect,
    current_clause: Option<Clause>,
    scopes: Vec<AliasScope>,
    params: Vec<ParameterValue>,
}

impl<'r> ResolutionContext<'r> {
    pub fn new(registry: &'r ResolverRegistry, dialect: &'r dyn Dialect) -> Self {
        Self {
            registry,
            dialect,
            current_clause: None,
            scopes: vec![AliasScope::default()],
            params: Vec::new(),
        }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect
    }

    pub fn clause(&self) -> Option<Clause> {
        self.current_clause
    }

    /// Resolve an expression through the registry this context was built
    /// with. This is the entry point custom resolvers use to recurse.
    pub fn resolve(&mut self, expr: Expression<'_>) -> Result<SqlToken, AccessError> {
        let registry = self.registry;
        registry.resolve(expr, self)
    }

    /// Run `func` with the current clause switched to `clause`, restoring
    /// the previous clause on exit — including early `Err` returns.
    pub fn with_clause<R>(&mut self, clause: Clause, func: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.current_clause.replace(clause);
        let result = func(self);
        self.current_clause = previous;
        result
    }

    /// Run `func` in a fresh child alias scope. Aliases assigned inside the
    /// scope never leak into the parent table; the clause state is reset for
    /// the duration so the subquery starts from a clean slate.
    pub fn subquery_scope<R>(&mut self, func: impl FnOnce(&mut Self) -> R) -> R {
        self.scopes.push(AliasScope::default());
        let previous = self.current_clause.take();
        let result = func(self);
        self.current_clause = previous;
        self.scopes.pop();
        result
    }

    /// The alias assigned to a target, if any, looking through the scope
    /// chain innermost-first.
    pub fn alias_of(&self, target: TargetId) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.aliases.get(&target))
            .map(String::as_str)
    }

    /// Assign an alias to a target, reusing the existing assignment if the
    /// target is already aliased anywhere in the scope chain. A
    /// user-supplied alias is used as-is; otherwise a short synthetic alias
    /// is derived from the target name, avoiding every alias already in
    /// scope.
    pub fn assign_alias(&mut self, target: &Target) -> String {
        if let Some(existing) = self.alias_of(target.id()) {
            return existing.to_owned();
        }

        let alias = match &target.alias {
            Some(alias) => alias.clone(),
            None => self.synthesize_alias(&target.name),
        };

        if let Some(scope) = self.scopes.last_mut() {
            scope.aliases.insert(target.id(), alias.clone());
        }
        alias
    }

    fn synthesize_alias(&self, target_name: &str) -> String {
        let base: String = target_name
            .chars()
            .find(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase())
            .unwrap_or('t')
            .to_string();

        if !self.alias_in_use(&base) {
            return base;
        }
        let mut n = 2u32;
        loop {
            let candidate = format!("{base}{n}");
            if !self.alias_in_use(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn alias_in_use(&self, candidate: &str) -> bool {
        self.scopes
            .iter()
            .any(|scope| scope.aliases.values().any(|a| a == candidate))
    }

    /// Bind a parameter: the value joins the ordered list and the returned
    /// token is the dialect's placeholder for its position.
    pub fn bind(&mut self, param: ParameterValue) -> Result<SqlToken, AccessError> {
        let param = self.dialect.process_parameter(param);
        self.params.push(param);
        SqlToken::new(self.dialect.placeholder(self.params.len()))
    }

    pub fn params(&self) -> &[ParameterValue] {
        &self.params
    }

    pub fn into_params(self) -> Vec<ParameterValue> {
        self.params
    }

    #[cfg(test)]
    pub(crate) fn innermost_aliases(&self) -> Vec<(TargetId, String)> {
        self.scopes
            .last()
            .map(|scope| {
                scope
                    .aliases
                    .iter()
                    .map(|(id, alias)| (*id, alias.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}
