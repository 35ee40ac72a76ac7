// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::access_error::DriverError;
use crate::expr::value::{ParameterValue, Value};

pub type DriverResult<T> = Result<T, DriverError>;

/// What a connection is acquired for. Providers may route the kinds to
/// different pools or credentials; schema probing (primary-key metadata)
/// uses `Init`, operational statements use `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    Init,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

/// Per-entry outcome of a batch execution. A driver that reports success
/// without a row count still counts as one affected row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Count(u64),
    SuccessNoInfo,
}

impl BatchStatus {
    pub fn affected(&self) -> u64 {
        match self {
            BatchStatus::Count(n) => *n,
            BatchStatus::SuccessNoInfo => 1,
        }
    }
}

/// One result row: ordered values with their column labels. This is the
/// minimal row contract; mapping rows onto richer value objects is the
/// caller's concern.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    labels: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(labels: Vec<String>, values: Vec<Value>) -> Self {
        Self { labels, values }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get_named(&self, label: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|l| l == label)
            .and_then(|i| self.values.get(i))
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A primary-key column reported by database metadata, with its 1-based
/// position in the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColumn {
    pub name: String,
    pub key_seq: i32,
}

/// The external blocking database connection. Every call blocks the
/// invoking thread; cancellation and timeouts are the driver's concern.
pub trait Connection {
    fn query(&mut self, sql: &str, params: &[ParameterValue]) -> DriverResult<Vec<Row>>;

    fn execute(&mut self, sql: &str, params: &[ParameterValue]) -> DriverResult<u64>;

    /// Execute one statement repeatedly with per-row parameter sets,
    /// returning a status per entry.
    fn execute_batch(
        &mut self,
        sql: &str,
        batches: &[Vec<ParameterValue>],
    ) -> DriverResult<Vec<BatchStatus>>;

    /// Execute an insert and report the generated values of the named key
    /// columns alongside the affected count.
    fn insert_returning(
        &mut self,
        sql: &str,
        params: &[ParameterValue],
        key_columns: &[String],
    ) -> DriverResult<(u64, Vec<Row>)>;

    fn auto_commit(&mut self) -> DriverResult<bool>;

    fn set_auto_commit(&mut self, enabled: bool) -> DriverResult<()>;

    fn set_isolation(&mut self, level: IsolationLevel) -> DriverResult<()>;

    fn commit(&mut self) -> DriverResult<()>;

    fn rollback(&mut self) -> DriverResult<()>;

    /// The target table's primary-key columns from database metadata, in
    /// whatever order the driver reports them.
    fn primary_key(&mut self, table: &str) -> DriverResult<Vec<KeyColumn>>;
}

/// The external connection source. Pooling, credentials and physical
/// connectivity live behind this pair of calls.
pub trait ConnectionProvider: Send + Sync {
    fn acquire(&self, kind: ConnectionKind) -> DriverResult<Box<dyn Connection>>;

    fn release(&self, connection: Box<dyn Connection>, kind: ConnectionKind) -> DriverResult<()>;
}
