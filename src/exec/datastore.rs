// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, error, instrument};

use crate::access_error::AccessError;
use crate::compile::operation::{
    compile_delete, compile_insert, compile_update, CompiledOperation, OperationKind,
};
use crate::compile::select::{compile_query, CompiledQuery};
use crate::expr::filter::{Filter, Operand};
use crate::expr::projection::Projection;
use crate::expr::query::QueryDescriptor;
use crate::expr::record::Record;
use crate::expr::target::Target;
use crate::expr::value::Value;
use crate::expr::write::{Delete, Insert, Update};
use crate::pk::{KeyResolver, KeyStrategy, PrimaryKey};
use crate::resolve::registry::ResolverRegistry;
use crate::sql::dialect::Dialect;

use super::connection::{BatchStatus, Connection, ConnectionKind, ConnectionProvider, Row};
use super::context::{ExecutionContext, TxFrame};
use super::transaction::{Transaction, TransactionConfig};

/// The outcome of a write operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    pub kind: OperationKind,
    pub affected: u64,
    /// Generated key values reported by the driver, keyed by column name.
    pub inserted_keys: IndexMap<String, Value>,
}

impl OperationResult {
    fn plain(kind: OperationKind, affected: u64) -> Self {
        Self {
            kind,
            affected,
            inserted_keys: IndexMap::new(),
        }
    }
}

/// The top-level handle: dialect, connection provider, resolver registry
/// and key resolver. Compilation entry points live here; execution happens
/// through a [`Session`].
pub struct Datastore {
    provider: Arc<dyn ConnectionProvider>,
    dialect: Arc<dyn Dialect>,
    registry: ResolverRegistry,
    keys: KeyResolver,
}

impl Datastore {
    pub fn new(provider: Arc<dyn ConnectionProvider>, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            provider,
            dialect,
            registry: ResolverRegistry::builtin(),
            keys: KeyResolver::new(KeyStrategy::Auto),
        }
    }

    pub fn with_key_strategy(mut self, strategy: KeyStrategy) -> Self {
        self.keys = KeyResolver::new(strategy);
        self
    }

    /// The datastore-wide registry, for registering global custom
    /// resolvers. Per-query resolvers go through the `*_with` compile
    /// entry points instead.
    pub fn registry_mut(&mut self) -> &mut ResolverRegistry {
        &mut self.registry
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn compile_query(&self, query: &QueryDescriptor) -> Result<CompiledQuery, AccessError> {
        compile_query(query, &self.registry, self.dialect.as_ref())
    }

    /// Compile with per-query resolver registrations layered over the
    /// datastore's registry.
    pub fn compile_query_with(
        &self,
        query: &QueryDescriptor,
        local: &ResolverRegistry,
    ) -> Result<CompiledQuery, AccessError> {
        compile_query(query, &self.registry.merged_with(local), self.dialect.as_ref())
    }

    pub fn compile_insert(&self, insert: &Insert) -> Result<CompiledOperation, AccessError> {
        compile_insert(insert, &self.registry, self.dialect.as_ref())
    }

    pub fn compile_update(&self, update: &Update) -> Result<CompiledOperation, AccessError> {
        compile_update(update, &self.registry, self.dialect.as_ref())
    }

    pub fn compile_delete(&self, delete: &Delete) -> Result<CompiledOperation, AccessError> {
        compile_delete(delete, &self.registry, self.dialect.as_ref())
    }

    /// Discover the identifying columns for a target per the configured
    /// key strategy. `Ok(None)` means no key is discoverable; the caller
    /// decides whether that is an error.
    pub fn resolve_key(
        &self,
        record: Option<&Record>,
        target: &Target,
    ) -> Result<Option<PrimaryKey>, AccessError> {
        self.keys.resolve(record, target, self.provider.as_ref())
    }

    pub fn session(&self) -> Session<'_> {
        Session {
            datastore: self,
            ctx: ExecutionContext::new(),
        }
    }
}

/// One logical sequence of operations on one thread, carrying the explicit
/// execution state (transaction stack, shared connection). Statements pick
/// their connection in this order: the innermost active transaction's, the
/// shared-scope connection, else a connection acquired and released around
/// the single statement.
pub struct Session<'d> {
    datastore: &'d Datastore,
    ctx: ExecutionContext,
}

impl<'d> Session<'d> {
    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    /// Run `op` transactionally. A nested call with a reuse-configured
    /// transaction participates in the outer transaction: only the
    /// outermost caller finalizes, and an inner failure marks the whole
    /// transaction rollback-only.
    #[instrument(level = "debug", skip_all)]
    pub fn with_transaction<R>(
        &mut self,
        config: TransactionConfig,
        op: impl FnOnce(&mut Self) -> Result<R, AccessError>,
    ) -> Result<R, AccessError> {
        self.begin_transaction(config)?;
        let result = op(self);
        let ended = self.end_transaction(result.is_err());
        match (result, ended) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(end_error)) => Err(end_error),
            (Err(op_error), Err(end_error)) => {
                error!("transaction end also failed: {end_error}");
                Err(op_error)
            }
            (Err(op_error), Ok(())) => Err(op_error),
        }
    }

    pub fn begin_transaction(&mut self, config: TransactionConfig) -> Result<(), AccessError> {
        if config.reuse_active && self.ctx.in_transaction() {
            self.ctx.frames.push(TxFrame::Nested);
            return Ok(());
        }

        let connection = self
            .datastore
            .provider
            .acquire(ConnectionKind::Default)
            .map_err(AccessError::DataAccess)?;
        let mut tx = Transaction::new(connection, config);
        if let Err(start_error) = tx.start() {
            if let Some(connection) = tx.into_connection() {
                if let Err(release_error) = self
                    .datastore
                    .provider
                    .release(connection, ConnectionKind::Default)
                {
                    return Err(AccessError::Transaction(format!(
                        "failed to start a transaction ({start_error}) and to release its \
                         connection ({release_error})"
                    )));
                }
            }
            return Err(start_error);
        }
        self.ctx.frames.push(TxFrame::Root(tx));
        Ok(())
    }

    /// Pop one transaction frame. For the root frame this finalizes
    /// (rollback if flagged or `failed` with rollback-on-error, commit
    /// otherwise per config), restores autocommit and releases the
    /// connection; for a nested frame a failure only marks the root
    /// rollback-only.
    pub fn end_transaction(&mut self, failed: bool) -> Result<(), AccessError> {
        match self.ctx.frames.pop() {
            None => Err(AccessError::Transaction("no transaction to end".into())),
            Some(TxFrame::Nested) => {
                if failed {
                    if let Some(root) = self.ctx.innermost_root_mut() {
                        root.set_rollback_only();
                    }
                }
                Ok(())
            }
            Some(TxFrame::Root(mut tx)) => {
                if failed && tx.should_rollback_on_error() {
                    tx.set_rollback_only();
                }
                tx.end(self.datastore.provider.as_ref())
            }
        }
    }

    /// Mark the active transaction so that ending it rolls back.
    pub fn set_rollback_only(&mut self) -> Result<(), AccessError> {
        self.ctx
            .innermost_root_mut()
            .ok_or_else(|| AccessError::Transaction("no active transaction".into()))?
            .set_rollback_only();
        Ok(())
    }

    /// Run `op` with one connection shared by all its statements, without
    /// opening a transaction. Composite operations (an existence check
    /// followed by an insert-or-update) use this to avoid pool churn and to
    /// read their own writes. Inside an active transaction this is a no-op
    /// wrapper, since statements already share the transaction's
    /// connection.
    #[instrument(level = "debug", skip_all)]
    pub fn with_connection<R>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<R, AccessError>,
    ) -> Result<R, AccessError> {
        if self.ctx.shared.is_none() && !self.ctx.in_transaction() {
            let connection = self
                .datastore
                .provider
                .acquire(ConnectionKind::Default)
                .map_err(AccessError::DataAccess)?;
            self.ctx.shared = Some(connection);
        }

        self.ctx.shared_depth += 1;
        let result = op(self);
        self.ctx.shared_depth -= 1;

        if self.ctx.shared_depth == 0 {
            if let Some(connection) = self.ctx.shared.take() {
                if let Err(release_error) = self
                    .datastore
                    .provider
                    .release(connection, ConnectionKind::Default)
                {
                    error!("failed to release shared connection: {release_error}");
                    if result.is_ok() {
                        return Err(AccessError::DataAccess(release_error)
                            .with_context("failed to release shared connection".into()));
                    }
                }
            }
        }
        result
    }

    fn with_statement_connection<R>(
        &mut self,
        f: impl FnOnce(&mut dyn Connection) -> Result<R, AccessError>,
    ) -> Result<R, AccessError> {
        if let Some(tx) = self.ctx.innermost_root_mut() {
            let connection = tx
                .connection()
                .ok_or_else(|| AccessError::Transaction("transaction has no connection".into()))?;
            return f(connection);
        }

        if let Some(shared) = self.ctx.shared.as_mut() {
            return f(shared.as_mut());
        }

        let mut connection = self
            .datastore
            .provider
            .acquire(ConnectionKind::Default)
            .map_err(AccessError::DataAccess)?;
        let result = f(connection.as_mut());
        let released = self
            .datastore
            .provider
            .release(connection, ConnectionKind::Default);
        match (result, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(release_error)) => Err(AccessError::DataAccess(release_error)
                .with_context("failed to release connection".into())),
            (Err(op_error), Err(release_error)) => {
                error!("failed to release connection after error: {release_error}");
                Err(op_error)
            }
            (Err(op_error), Ok(())) => Err(op_error),
        }
    }

    /// Execute a query descriptor; pagination is applied here through the
    /// dialect, never by the compiler.
    pub fn query(&mut self, query: &QueryDescriptor) -> Result<Vec<Row>, AccessError> {
        let compiled = self.datastore.compile_query(query)?;
        self.execute_query(&compiled)
    }

    /// Like [`query`](Session::query), with per-query resolver
    /// registrations layered over the datastore's registry.
    pub fn query_with(
        &mut self,
        query: &QueryDescriptor,
        local: &ResolverRegistry,
    ) -> Result<Vec<Row>, AccessError> {
        let compiled = self.datastore.compile_query_with(query, local)?;
        self.execute_query(&compiled)
    }

    fn execute_query(&mut self, compiled: &CompiledQuery) -> Result<Vec<Row>, AccessError> {
        let sql = match self
            .datastore
            .dialect
            .limit_clause(compiled.limit, compiled.offset)
        {
            Some(clause) => format!("{} {}", compiled.sql, clause),
            None => compiled.sql.clone(),
        };
        debug!(sql = %sql, "executing query");

        let params = compiled.params.clone();
        self.with_statement_connection(move |connection| {
            connection.query(&sql, &params).map_err(|e| {
                error!("query failed: {e}");
                AccessError::DataAccess(e).with_context(format!("query failed: {sql}"))
            })
        })
    }

    /// Whether any row matches the descriptor's target and filter.
    pub fn exists(&mut self, query: &QueryDescriptor) -> Result<bool, AccessError> {
        let mut probe = query.clone();
        probe.projections = vec![Projection::CountAll];
        probe.sort = None;
        probe.limit = None;
        probe.offset = None;

        let rows = self.query(&probe)?;
        match rows.first().and_then(|row| row.get(0)) {
            Some(Value::Int(count)) => Ok(*count > 0),
            _ => Err(AccessError::DataAccess(
                "driver returned no count row".into(),
            )),
        }
    }

    pub fn insert(&mut self, insert: &Insert) -> Result<OperationResult, AccessError> {
        let compiled = self.datastore.compile_insert(insert)?;
        self.execute_operation(compiled)
    }

    pub fn update(&mut self, update: &Update) -> Result<OperationResult, AccessError> {
        let compiled = self.datastore.compile_update(update)?;
        self.execute_operation(compiled)
    }

    pub fn delete(&mut self, delete: &Delete) -> Result<OperationResult, AccessError> {
        let compiled = self.datastore.compile_delete(delete)?;
        self.execute_operation(compiled)
    }

    fn execute_operation(
        &mut self,
        compiled: CompiledOperation,
    ) -> Result<OperationResult, AccessError> {
        debug!(sql = %compiled.sql, kind = %compiled.kind, "executing operation");
        let dialect = self.datastore.dialect.clone();

        self.with_statement_connection(move |connection| {
            let wrap = |e: crate::access_error::DriverError| {
                error!("operation failed: {e}");
                AccessError::DataAccess(e)
                    .with_context(format!("{} failed: {}", compiled.kind, compiled.sql))
            };

            if let Some(batch) = &compiled.batch {
                let statuses = connection
                    .execute_batch(&compiled.sql, batch)
                    .map_err(&wrap)?;
                let affected = statuses.iter().map(BatchStatus::affected).sum();
                return Ok(OperationResult::plain(compiled.kind, affected));
            }

            if compiled.kind == OperationKind::Insert
                && !compiled.key_columns.is_empty()
                && dialect.supports_generated_keys()
            {
                let (affected, rows) = connection
                    .insert_returning(&compiled.sql, &compiled.params, &compiled.key_columns)
                    .map_err(&wrap)?;
                let mut inserted_keys = IndexMap::new();
                if let Some(row) = rows.first() {
                    for (index, column) in compiled.key_columns.iter().enumerate() {
                        let value = if dialect.generated_keys_by_name() {
                            row.get_named(column)
                        } else {
                            row.get(index)
                        };
                        if let Some(value) = value {
                            inserted_keys.insert(column.clone(), value.clone());
                        }
                    }
                }
                return Ok(OperationResult {
                    kind: compiled.kind,
                    affected,
                    inserted_keys,
                });
            }

            let affected = connection
                .execute(&compiled.sql, &compiled.params)
                .map_err(&wrap)?;
            Ok(OperationResult::plain(compiled.kind, affected))
        })
    }

    /// Insert one record's entries.
    pub fn insert_record(
        &mut self,
        target: &Target,
        record: &Record,
    ) -> Result<OperationResult, AccessError> {
        let insert = Insert::into_table(target.clone()).record(record);
        self.insert(&insert)
    }

    /// Update one record's non-key columns, addressed by its primary key.
    pub fn update_record(
        &mut self,
        target: &Target,
        record: &Record,
    ) -> Result<OperationResult, AccessError> {
        let key = self.require_key(target, record)?;
        let key_columns: Vec<&str> = key.columns().iter().map(|p| p.name.as_str()).collect();

        let mut update = Update::table(target.clone());
        for (column, value) in record.entries() {
            if key_columns.contains(&column) {
                continue;
            }
            update = update.set(column, Operand::Literal(value.clone()));
        }
        if update.assignments.is_empty() {
            return Err(AccessError::invalid("record has no non-key columns to update"));
        }
        let update = update.filter(key_filter(&key, record)?);
        self.update(&update)
    }

    /// Delete one record's row, addressed by its primary key.
    pub fn delete_record(
        &mut self,
        target: &Target,
        record: &Record,
    ) -> Result<OperationResult, AccessError> {
        let key = self.require_key(target, record)?;
        let delete = Delete::from_table(target.clone()).filter(key_filter(&key, record)?);
        self.delete(&delete)
    }

    /// Re-read one record's row by primary key; `None` when the row is
    /// gone.
    pub fn refresh(&mut self, target: &Target, record: &Record) -> Result<Option<Row>, AccessError> {
        let key = self.require_key(target, record)?;
        let mut query =
            QueryDescriptor::from_target(target.clone()).filter(key_filter(&key, record)?);
        for (column, _) in record.entries() {
            query = query.project(target.path(column));
        }
        let rows = self.query(&query)?;
        Ok(rows.into_iter().next())
    }

    /// Insert-or-update: an existence check by key decides, both statements
    /// sharing one connection. Without a discoverable key the operation
    /// degrades to insert-only.
    pub fn save(&mut self, target: &Target, record: &Record) -> Result<OperationResult, AccessError> {
        self.with_connection(|session| {
            match session.datastore.resolve_key(Some(record), target)? {
                None => session.insert_record(target, record),
                Some(key) => {
                    let probe = QueryDescriptor::from_target(target.clone())
                        .filter(key_filter(&key, record)?);
                    if session.exists(&probe)? {
                        session.update_record(target, record)
                    } else {
                        session.insert_record(target, record)
                    }
                }
            }
        })
    }

    fn require_key(&self, target: &Target, record: &Record) -> Result<PrimaryKey, AccessError> {
        self.datastore
            .resolve_key(Some(record), target)?
            .ok_or_else(|| {
                AccessError::invalid(format!("empty primary key for table {}", target.name))
            })
    }
}

/// The key-equality filter for one record: conjunction of `<key col> = ?`
/// over the key columns, in key order.
fn key_filter(key: &PrimaryKey, record: &Record) -> Result<Filter, AccessError> {
    let mut filter: Option<Filter> = None;
    for path in key.columns() {
        let value = record.get(&path.name).ok_or_else(|| {
            AccessError::invalid(format!("record is missing key column {}", path.name))
        })?;
        if value.is_null() {
            return Err(AccessError::invalid(format!(
                "key column {} is NULL",
                path.name
            )));
        }
        let clause = Filter::eq(path.clone(), value.clone());
        filter = Some(match filter {
            Some(existing) => Filter::and(existing, clause),
            None => clause,
        });
    }
    filter.ok_or_else(|| AccessError::invalid("empty primary key"))
}
