// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! A relational access layer that compiles a declarative, type-safe
//! expression model — targets, filters, projections, sorts, functions and
//! write operations — into dialect-correct SQL text plus an ordered list of
//! bound parameters, and executes it through externally provided blocking
//! connections with explicit transaction lifecycle management.
//!
//! The model ([`expr`]) is plain data. One compile pass walks it top-down
//! through the resolver registry ([`resolve`]): every node resolves to a
//! validated [`SqlToken`], aliases stay stable for the pass, subqueries
//! open child alias scopes, and every bound parameter appends to a single
//! ordered list matching the placeholders in the final statement. The
//! structure compilers ([`compile`]) assemble SELECT/INSERT/UPDATE/DELETE
//! from descriptors; [`Datastore`] and [`Session`] execute the result,
//! carrying transaction and shared-connection state explicitly. Per-product
//! SQL variations live behind the [`Dialect`] policy trait, and the actual
//! wire I/O behind the [`Connection`]/[`ConnectionProvider`] pair.

#[cfg(test)]
#[macro_use]
mod test_util;

pub mod access_error;
pub mod compile;
pub mod exec;
pub mod expr;
pub mod pk;
pub mod resolve;
pub mod sql;

pub use access_error::{AccessError, DriverError, WithContext};

pub use expr::{
    filter::{CompareOp, Filter, InValues, MatchMode, Operand},
    function::{FunctionKind, SqlFunction},
    path::Path,
    projection::Projection,
    query::{QueryDescriptor, SubQuery},
    record::Record,
    sort::{Sort, SortDirection},
    target::{Join, JoinType, Target, TargetId},
    value::{ParameterValue, TemporalKind, Value, ValueKind},
    write::{Delete, Insert, Update},
    Expression, ExpressionKind,
};

pub use sql::{
    dialect::{AnsiDialect, Dialect},
    token::SqlToken,
};

pub use resolve::{
    context::{Clause, ResolutionContext},
    registry::{ResolveTarget, ResolverRegistry},
};

pub use compile::{
    operation::{CompiledOperation, OperationKind},
    select::{compile_query, CompiledQuery, RowColumn, RowLayout},
};

pub use pk::{KeyResolver, KeyStrategy, PrimaryKey, DEFAULT_KEY_CACHE_CAPACITY};

pub use exec::{
    connection::{
        BatchStatus, Connection, ConnectionKind, ConnectionProvider, DriverResult, IsolationLevel,
        KeyColumn, Row,
    },
    context::ExecutionContext,
    datastore::{Datastore, OperationResult, Session},
    transaction::{Transaction, TransactionConfig, TransactionState},
};
