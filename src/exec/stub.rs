// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! An in-memory stand-in for the external driver, shared by the execution
//! and primary-key tests. It keeps one logical table of (keycode, strv)
//! rows with committed/pending separation so transaction semantics are
//! observable, and it records every acquire/release/statement.

use std::sync::{Arc, Mutex};

use crate::expr::value::{ParameterValue, Value};

use super::connection::{
    BatchStatus, Connection, ConnectionKind, ConnectionProvider, DriverResult, IsolationLevel,
    KeyColumn, Row,
};

pub(crate) struct StubState {
    pub committed: Vec<(i64, String)>,
    pub pending: Vec<(i64, String)>,
    pub autocommit: bool,
    pub acquired: Vec<ConnectionKind>,
    pub released: Vec<ConnectionKind>,
    pub key_probes: usize,
    pub key_columns: Vec<KeyColumn>,
    pub write_affected: u64,
    pub batch_statuses: Option<Vec<BatchStatus>>,
    pub generated_key: i64,
    pub statements: Vec<String>,
    pub fail_release: bool,
}

impl Default for StubState {
    fn default() -> Self {
        Self {
            committed: Vec::new(),
            pending: Vec::new(),
            autocommit: true,
            acquired: Vec::new(),
            released: Vec::new(),
            key_probes: 0,
            key_columns: Vec::new(),
            write_affected: 1,
            batch_statuses: None,
            generated_key: 99,
            statements: Vec::new(),
            fail_release: false,
        }
    }
}

impl StubState {
    fn visible_rows(&self) -> Vec<(i64, String)> {
        self.committed
            .iter()
            .chain(self.pending.iter())
            .cloned()
            .collect()
    }
}

pub(crate) struct StubProvider(Arc<Mutex<StubState>>);

impl StubProvider {
    pub(crate) fn new() -> Self {
        Self(Arc::new(Mutex::new(StubState::default())))
    }

    pub(crate) fn seeded(rows: Vec<(i64, &str)>) -> Self {
        let provider = Self::new();
        provider.0.lock().unwrap().committed =
            rows.into_iter().map(|(k, v)| (k, v.to_owned())).collect();
        provider
    }

    pub(crate) fn state(&self) -> Arc<Mutex<StubState>> {
        self.0.clone()
    }
}

impl ConnectionProvider for StubProvider {
    fn acquire(&self, kind: ConnectionKind) -> DriverResult<Box<dyn Connection>> {
        self.0.lock().unwrap().acquired.push(kind);
        Ok(Box::new(StubConnection(self.0.clone())))
    }

    fn release(&self, _connection: Box<dyn Connection>, kind: ConnectionKind) -> DriverResult<()> {
        let mut state = self.0.lock().unwrap();
        if state.fail_release {
            return Err("stub release failure".into());
        }
        state.released.push(kind);
        Ok(())
    }
}

struct StubConnection(Arc<Mutex<StubState>>);

fn row_from_params(params: &[ParameterValue]) -> (i64, String) {
    let mut keycode = 0;
    let mut strv = String::new();
    for param in params {
        match &param.value {
            Value::Int(n) => keycode = *n,
            Value::Text(s) => strv = s.clone(),
            _ => {}
        }
    }
    (keycode, strv)
}

impl Connection for StubConnection {
    fn query(&mut self, sql: &str, _params: &[ParameterValue]) -> DriverResult<Vec<Row>> {
        let mut state = self.0.lock().unwrap();
        state.statements.push(sql.to_owned());

        if sql.contains("COUNT(*)") {
            let count = state.visible_rows().len() as i64;
            return Ok(vec![Row::new(vec!["c0".into()], vec![Value::Int(count)])]);
        }
        // filter evaluation is the real database's job; echo the visible rows
        Ok(state
            .visible_rows()
            .into_iter()
            .map(|(keycode, strv)| {
                Row::new(
                    vec!["c0".into(), "c1".into()],
                    vec![Value::Int(keycode), Value::Text(strv)],
                )
            })
            .collect())
    }

    fn execute(&mut self, sql: &str, params: &[ParameterValue]) -> DriverResult<u64> {
        let mut state = self.0.lock().unwrap();
        state.statements.push(sql.to_owned());

        if sql.starts_with("INSERT") {
            let row = row_from_params(params);
            if state.autocommit {
                state.committed.push(row);
            } else {
                state.pending.push(row);
            }
            return Ok(1);
        }
        Ok(state.write_affected)
    }

    fn execute_batch(
        &mut self,
        sql: &str,
        batches: &[Vec<ParameterValue>],
    ) -> DriverResult<Vec<BatchStatus>> {
        let mut state = self.0.lock().unwrap();
        state.statements.push(sql.to_owned());

        if sql.starts_with("INSERT") {
            for batch in batches {
                let row = row_from_params(batch);
                if state.autocommit {
                    state.committed.push(row);
                } else {
                    state.pending.push(row);
                }
            }
        }
        Ok(state
            .batch_statuses
            .clone()
            .unwrap_or_else(|| vec![BatchStatus::Count(1); batches.len()]))
    }

    fn insert_returning(
        &mut self,
        sql: &str,
        params: &[ParameterValue],
        key_columns: &[String],
    ) -> DriverResult<(u64, Vec<Row>)> {
        self.execute(sql, params)?;
        let state = self.0.lock().unwrap();
        let values = vec![Value::Int(state.generated_key); key_columns.len()];
        Ok((1, vec![Row::new(key_columns.to_vec(), values)]))
    }

    fn auto_commit(&mut self) -> DriverResult<bool> {
        Ok(self.0.lock().unwrap().autocommit)
    }

    fn set_auto_commit(&mut self, enabled: bool) -> DriverResult<()> {
        self.0.lock().unwrap().autocommit = enabled;
        Ok(())
    }

    fn set_isolation(&mut self, _level: IsolationLevel) -> DriverResult<()> {
        Ok(())
    }

    fn commit(&mut self) -> DriverResult<()> {
        let mut state = self.0.lock().unwrap();
        let pending: Vec<_> = state.pending.drain(..).collect();
        state.committed.extend(pending);
        Ok(())
    }

    fn rollback(&mut self) -> DriverResult<()> {
        self.0.lock().unwrap().pending.clear();
        Ok(())
    }

    fn primary_key(&mut self, _table: &str) -> DriverResult<Vec<KeyColumn>> {
        let mut state = self.0.lock().unwrap();
        state.key_probes += 1;
        Ok(state.key_columns.clone())
    }
}
