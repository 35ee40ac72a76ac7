// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::expr::function::FunctionKind;
use crate::expr::value::ParameterValue;

/// The per-database-product policy object. Every syntax variation the
/// composition engine needs to know about goes through this trait; the
/// engine itself never branches on a product name.
pub trait Dialect: Send + Sync {
    /// Rewrite a table or column name before it is embedded in SQL
    /// (case-folding, quoting). The default is the identity.
    fn process_path_name(&self, name: &str) -> String {
        name.to_owned()
    }

    /// The placeholder text for the 1-based parameter position.
    fn placeholder(&self, index: usize) -> String {
        let _ = index;
        "?".to_owned()
    }

    /// Whether LEFT/RIGHT joins spell out the OUTER keyword.
    fn explicit_outer_join(&self) -> bool {
        false
    }

    /// Whether LIKE patterns may carry an ESCAPE clause.
    fn supports_like_escape(&self) -> bool {
        true
    }

    /// Whether the driver can report generated key values after an insert.
    fn supports_generated_keys(&self) -> bool {
        true
    }

    /// Whether generated keys are retrieved by column name (as opposed to
    /// position).
    fn generated_keys_by_name(&self) -> bool {
        true
    }

    /// Whether a DELETE against an aliased target must repeat the alias
    /// between DELETE and FROM.
    fn requires_delete_alias(&self) -> bool {
        false
    }

    /// Whether the root target of a SELECT gets a synthetic alias when the
    /// user supplied none. Joined targets are always aliased.
    fn alias_root_targets(&self) -> bool {
        true
    }

    /// A predicate that is constantly true or false, used where a filter
    /// short-circuits (e.g. an empty IN list).
    fn constant_predicate(&self, value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    /// The SQL template for a function kind, with `{}` marking the operand
    /// position. `None` means the function is unknown to this dialect,
    /// which aborts resolution.
    fn function_template(&self, kind: &FunctionKind) -> Option<Cow<'_, str>>;

    /// The pagination clause appended by the statement layer (or inlined
    /// for subqueries).
    fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (None, None) => None,
            (Some(limit), None) => Some(format!("LIMIT {limit}")),
            (None, Some(offset)) => Some(format!("OFFSET {offset}")),
            (Some(limit), Some(offset)) => Some(format!("LIMIT {limit} OFFSET {offset}")),
        }
    }

    /// Hook applied to every parameter before it enters the bound list.
    fn process_parameter(&self, param: ParameterValue) -> ParameterValue {
        param
    }
}

/// A configurable, product-neutral dialect. Concrete database products are
/// expected to supply their own [`Dialect`] implementations; this one covers
/// the common ANSI surface and doubles as the default policy.
#[derive(Debug, Clone, Default)]
pub struct AnsiDialect {
    quote_identifiers: bool,
    explicit_outer_join: bool,
    no_like_escape: bool,
    requires_delete_alias: bool,
    suppress_root_alias: bool,
    no_generated_keys: bool,
    custom_functions: HashMap<String, String>,
}

impl AnsiDialect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render identifiers wrapped in double quotes.
    pub fn quoted(mut self) -> Self {
        self.quote_identifiers = true;
        self
    }

    pub fn with_explicit_outer_join(mut self) -> Self {
        self.explicit_outer_join = true;
        self
    }

    pub fn without_like_escape(mut self) -> Self {
        self.no_like_escape = true;
        self
    }

    pub fn with_delete_alias(mut self) -> Self {
        self.requires_delete_alias = true;
        self
    }

    pub fn without_root_alias(mut self) -> Self {
        self.suppress_root_alias = true;
        self
    }

    pub fn without_generated_keys(mut self) -> Self {
        self.no_generated_keys = true;
        self
    }

    /// Register the SQL template for a custom function name.
    pub fn with_function(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.custom_functions.insert(name.into(), template.into());
        self
    }
}

impl Dialect for AnsiDialect {
    fn process_path_name(&self, name: &str) -> String {
        if self.quote_identifiers {
            format!("\"{name}\"")
        } else {
            name.to_owned()
        }
    }

    fn explicit_outer_join(&self) -> bool {
        self.explicit_outer_join
    }

    fn supports_like_escape(&self) -> bool {
        !self.no_like_escape
    }

    fn supports_generated_keys(&self) -> bool {
        !self.no_generated_keys
    }

    fn requires_delete_alias(&self) -> bool {
        self.requires_delete_alias
    }

    fn alias_root_targets(&self) -> bool {
        !self.suppress_root_alias
    }

    fn function_template(&self, kind: &FunctionKind) -> Option<Cow<'_, str>> {
        let template = match kind {
            FunctionKind::Count => "COUNT({})",
            FunctionKind::Sum => "SUM({})",
            FunctionKind::Avg => "AVG({})",
            FunctionKind::Min => "MIN({})",
            FunctionKind::Max => "MAX({})",
            FunctionKind::Upper => "UPPER({})",
            FunctionKind::Lower => "LOWER({})",
            FunctionKind::Year => "EXTRACT(YEAR FROM {})",
            FunctionKind::Month => "EXTRACT(MONTH FROM {})",
            FunctionKind::Day => "EXTRACT(DAY FROM {})",
            FunctionKind::Hour => "EXTRACT(HOUR FROM {})",
            FunctionKind::CurrentDate => "CURRENT_DATE",
            FunctionKind::CurrentTimestamp => "CURRENT_TIMESTAMP",
            FunctionKind::Custom(name) => {
                return self.custom_functions.get(name).map(|t| Cow::from(t.clone()));
            }
        };
        Some(Cow::from(template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_functions_are_opt_in() {
        let plain = AnsiDialect::new();
        assert_eq!(
            plain.function_template(&FunctionKind::Custom("soundex".into())),
            None
        );

        let extended = AnsiDialect::new().with_function("soundex", "SOUNDEX({})");
        assert_eq!(
            extended
                .function_template(&FunctionKind::Custom("soundex".into()))
                .as_deref(),
            Some("SOUNDEX({})")
        );
    }

    #[test]
    fn quoting_is_opt_in() {
        assert_eq!(AnsiDialect::new().process_path_name("strv"), "strv");
        assert_eq!(
            AnsiDialect::new().quoted().process_path_name("strv"),
            "\"strv\""
        );
    }
}
