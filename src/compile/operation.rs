// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::access_error::AccessError;
use crate::expr::filter::Operand;
use crate::expr::value::ParameterValue;
use crate::expr::write::{Delete, Insert, Update};
use crate::expr::Expression;
use crate::resolve::context::{Clause, ResolutionContext};
use crate::resolve::registry::ResolverRegistry;
use crate::resolve::resolve_operand;
use crate::sql::dialect::Dialect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Insert,
    Update,
    Delete,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OperationKind::Insert => "INSERT",
            OperationKind::Update => "UPDATE",
            OperationKind::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// The compiled form of a write statement. `params` carries the bound
/// values of a single-statement operation; `batch` carries the per-row
/// parameter sets of a batch insert (the statement is prepared once and
/// re-bound per row). `key_columns` names the generated-key columns to
/// report back, when the dialect supports retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledOperation {
    pub kind: OperationKind,
    pub sql: String,
    pub params: Vec<ParameterValue>,
    pub batch: Option<Vec<Vec<ParameterValue>>>,
    pub key_columns: Vec<String>,
}

/// Compile an insert descriptor.
///
/// The column order is fixed once — from the explicit column list or the
/// first row's value map — and every row must supply exactly that set; a
/// missing mapped column is a configuration error, never a silent NULL.
pub fn compile_insert(
    insert: &Insert,
    registry: &ResolverRegistry,
    dialect: &dyn Dialect,
) -> Result<CompiledOperation, AccessError> {
    if insert.rows.is_empty() {
        return Err(AccessError::invalid("insert has no rows"));
    }

    let columns: Vec<String> = if insert.columns.is_empty() {
        insert.rows[0].keys().cloned().collect()
    } else {
        insert.columns.clone()
    };
    if columns.is_empty() {
        return Err(AccessError::invalid("insert has no columns"));
    }

    for (index, row) in insert.rows.iter().enumerate() {
        for column in &columns {
            if !row.contains_key(column) {
                return Err(AccessError::invalid(format!(
                    "insert row {index} is missing a value for column {column}"
                )));
            }
        }
        if row.len() != columns.len() {
            let extra = row
                .keys()
                .find(|k| !columns.contains(k))
                .cloned()
                .unwrap_or_default();
            return Err(AccessError::invalid(format!(
                "insert row {index} supplies a value for unmapped column {extra}"
            )));
        }
    }

    let table = dialect.process_path_name(&insert.target.name);
    let column_list = columns
        .iter()
        .map(|c| dialect.process_path_name(c))
        .collect::<Vec<_>>()
        .join(", ");
    let key_columns: Vec<String> = insert.returning.iter().map(|p| p.name.clone()).collect();

    if let [row] = insert.rows.as_slice() {
        // single row: values resolve through the registry, so literals bind
        // and functions render as SQL
        let mut ctx = ResolutionContext::new(registry, dialect);
        let values = ctx.with_clause(Clause::Set, |ctx| {
            let mut rendered = Vec::with_capacity(columns.len());
            for column in &columns {
                rendered.push(resolve_operand(&row[column], ctx)?.into_text());
            }
            Ok::<_, AccessError>(rendered)
        })?;

        return Ok(CompiledOperation {
            kind: OperationKind::Insert,
            sql: format!(
                "INSERT INTO {table} ({column_list}) VALUES ({})",
                values.join(", ")
            ),
            params: ctx.into_params(),
            batch: None,
            key_columns,
        });
    }

    // batch: one placeholder per column, per-row parameter sets
    let placeholders = (1..=columns.len())
        .map(|i| dialect.placeholder(i))
        .collect::<Vec<_>>()
        .join(", ");

    let mut batch = Vec::with_capacity(insert.rows.len());
    for (index, row) in insert.rows.iter().enumerate() {
        let mut params = Vec::with_capacity(columns.len());
        for column in &columns {
            match &row[column] {
                Operand::Literal(value) => {
                    params.push(dialect.process_parameter(ParameterValue::new(value.clone())));
                }
                other => {
                    return Err(AccessError::invalid(format!(
                        "batch insert values must be literals; row {index}, column {column} is {other:?}"
                    )));
                }
            }
        }
        batch.push(params);
    }

    Ok(CompiledOperation {
        kind: OperationKind::Insert,
        sql: format!("INSERT INTO {table} ({column_list}) VALUES ({placeholders})"),
        params: Vec::new(),
        batch: Some(batch),
        key_columns,
    })
}

/// Compile an update descriptor: `UPDATE <target> SET <assignments>
/// [WHERE <filter>]`. Paths in the SET list render unqualified; the WHERE
/// filter's paths render bare as well since the target is never aliased in
/// an update.
pub fn compile_update(
    update: &Update,
    registry: &ResolverRegistry,
    dialect: &dyn Dialect,
) -> Result<CompiledOperation, AccessError> {
    if update.assignments.is_empty() {
        return Err(AccessError::invalid("update has no assignments"));
    }

    let mut ctx = ResolutionContext::new(registry, dialect);
    let table = dialect.process_path_name(&update.target.name);

    let set_sql = ctx.with_clause(Clause::Set, |ctx| {
        let mut parts = Vec::with_capacity(update.assignments.len());
        for (column, value) in &update.assignments {
            let column = dialect.process_path_name(column);
            let value = resolve_operand(value, ctx)?;
            parts.push(format!("{column} = {value}"));
        }
        Ok::<_, AccessError>(parts.join(", "))
    })?;

    let mut sql = format!("UPDATE {table} SET {set_sql}");
    if let Some(filter) = &update.filter {
        let where_sql =
            ctx.with_clause(Clause::Where, |ctx| ctx.resolve(Expression::Filter(filter)))?;
        sql.push_str(" WHERE ");
        sql.push_str(where_sql.text());
    }

    Ok(CompiledOperation {
        kind: OperationKind::Update,
        sql,
        params: ctx.into_params(),
        batch: None,
        key_columns: Vec::new(),
    })
}

/// Compile a delete descriptor: `DELETE [<alias>] FROM <target> [WHERE
/// <filter>]`. The target is aliased when the user supplied an alias or the
/// dialect requires one for deletes; the alias is repeated between DELETE
/// and FROM only on the dialect's demand.
pub fn compile_delete(
    delete: &Delete,
    registry: &ResolverRegistry,
    dialect: &dyn Dialect,
) -> Result<CompiledOperation, AccessError> {
    let mut ctx = ResolutionContext::new(registry, dialect);
    let table = dialect.process_path_name(&delete.target.name);

    let alias = if delete.target.alias.is_some() || dialect.requires_delete_alias() {
        Some(ctx.assign_alias(&delete.target))
    } else {
        None
    };

    let mut sql = String::from("DELETE");
    if dialect.requires_delete_alias() {
        if let Some(alias) = &alias {
            sql.push(' ');
            sql.push_str(alias);
        }
    }
    sql.push_str(" FROM ");
    sql.push_str(&table);
    if let Some(alias) = &alias {
        sql.push(' ');
        sql.push_str(alias);
    }

    if let Some(filter) = &delete.filter {
        let where_sql =
            ctx.with_clause(Clause::Where, |ctx| ctx.resolve(Expression::Filter(filter)))?;
        sql.push_str(" WHERE ");
        sql.push_str(where_sql.text());
    }

    Ok(CompiledOperation {
        kind: OperationKind::Delete,
        sql,
        params: ctx.into_params(),
        batch: None,
        key_columns: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::filter::Filter;
    use crate::expr::function::SqlFunction;
    use crate::expr::target::Target;
    use crate::expr::value::Value;
    use crate::sql::dialect::AnsiDialect;

    #[test]
    fn single_row_insert_binds_in_column_order() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();

        let t = Target::new("T");
        let insert = Insert::into_table(t).values([
            ("keycode", Operand::literal(1i64)),
            ("strv", Operand::literal("One")),
        ]);

        let compiled = compile_insert(&insert, &registry, &dialect).unwrap();
        assert_binding!(
            (compiled.sql, compiled.params),
            "INSERT INTO T (keycode, strv) VALUES (?, ?)",
            1i64,
            "One"
        );
        assert!(compiled.batch.is_none());
    }

    #[test]
    fn single_row_insert_renders_function_values() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();

        let t = Target::new("T");
        let insert = Insert::into_table(t).values([
            ("strv", Operand::literal("One")),
            ("created", Operand::Function(SqlFunction::current_timestamp())),
        ]);

        let compiled = compile_insert(&insert, &registry, &dialect).unwrap();
        assert_binding!(
            (compiled.sql, compiled.params),
            "INSERT INTO T (strv, created) VALUES (?, CURRENT_TIMESTAMP)",
            "One"
        );
    }

    #[test]
    fn batch_insert_emits_placeholders_and_row_params() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();

        let t = Target::new("T");
        let insert = Insert::into_table(t)
            .values([
                ("keycode", Operand::literal(1i64)),
                ("strv", Operand::literal("One")),
            ])
            .values([
                ("keycode", Operand::literal(2i64)),
                ("strv", Operand::literal("Two")),
            ]);

        let compiled = compile_insert(&insert, &registry, &dialect).unwrap();
        assert_eq!(compiled.sql, "INSERT INTO T (keycode, strv) VALUES (?, ?)");
        assert!(compiled.params.is_empty());

        let batch = compiled.batch.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0][0].value, Value::Int(1));
        assert_eq!(batch[0][1].value, Value::from("One"));
        assert_eq!(batch[1][0].value, Value::Int(2));
        assert_eq!(batch[1][1].value, Value::from("Two"));
    }

    #[test]
    fn batch_row_with_missing_column_is_rejected() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();

        let t = Target::new("T");
        let insert = Insert::into_table(t)
            .values([
                ("keycode", Operand::literal(1i64)),
                ("strv", Operand::literal("One")),
            ])
            .values([("keycode", Operand::literal(2i64))]);

        let err = compile_insert(&insert, &registry, &dialect).unwrap_err();
        assert!(err.to_string().contains("missing a value for column strv"));
    }

    #[test]
    fn batch_row_with_extra_column_is_rejected() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();

        let t = Target::new("T");
        let insert = Insert::into_table(t)
            .columns(["keycode"])
            .values([
                ("keycode", Operand::literal(1i64)),
                ("strv", Operand::literal("One")),
            ]);

        let err = compile_insert(&insert, &registry, &dialect).unwrap_err();
        assert!(err.to_string().contains("unmapped column strv"));
    }

    #[test]
    fn update_with_between_filter() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();

        let t = Target::new("T");
        let update = Update::table(t.clone())
            .set("strv", Operand::literal("X"))
            .filter(Filter::between(
                t.path("keycode"),
                Value::Int(1),
                Value::Int(2),
            ));

        let compiled = compile_update(&update, &registry, &dialect).unwrap();
        assert_binding!(
            (compiled.sql, compiled.params),
            "UPDATE T SET strv = ? WHERE keycode BETWEEN ? AND ?",
            "X",
            1i64,
            2i64
        );
    }

    #[test]
    fn update_without_assignments_is_rejected() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();

        let t = Target::new("T");
        let update = Update::table(t);
        assert!(compile_update(&update, &registry, &dialect).is_err());
    }

    #[test]
    fn plain_delete_is_unaliased() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();

        let t = Target::new("T");
        let delete =
            Delete::from_table(t.clone()).filter(Filter::eq(t.path("keycode"), Value::Int(1)));

        let compiled = compile_delete(&delete, &registry, &dialect).unwrap();
        assert_binding!(
            (compiled.sql, compiled.params),
            "DELETE FROM T WHERE keycode = ?",
            1i64
        );
    }

    #[test]
    fn delete_alias_on_dialect_demand() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new().with_delete_alias();

        let t = Target::new("T");
        let delete =
            Delete::from_table(t.clone()).filter(Filter::eq(t.path("keycode"), Value::Int(1)));

        let compiled = compile_delete(&delete, &registry, &dialect).unwrap();
        assert_binding!(
            (compiled.sql, compiled.params),
            "DELETE t FROM T t WHERE t.keycode = ?",
            1i64
        );
    }

    #[test]
    fn explicit_delete_alias_without_dialect_demand() {
        let registry = ResolverRegistry::builtin();
        let dialect = AnsiDialect::new();

        let t = Target::aliased("T", "victim");
        let delete =
            Delete::from_table(t.clone()).filter(Filter::eq(t.path("keycode"), Value::Int(1)));

        let compiled = compile_delete(&delete, &registry, &dialect).unwrap();
        assert_binding!(
            (compiled.sql, compiled.params),
            "DELETE FROM T victim WHERE victim.keycode = ?",
            1i64
        );
    }
}
