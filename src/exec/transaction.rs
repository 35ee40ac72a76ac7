// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use tracing::{debug, error};

use crate::access_error::AccessError;

use super::connection::{Connection, ConnectionKind, ConnectionProvider, IsolationLevel};

/// How a transaction behaves over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionConfig {
    pub isolation: Option<IsolationLevel>,
    /// Commit when the transaction ends without a rollback request.
    pub auto_commit_on_success: bool,
    /// Roll back when the transactional closure returns an error.
    pub rollback_on_error: bool,
    /// Participate in an already-active transaction instead of opening a
    /// new one. With this set (the default), nested transactional blocks
    /// share the outer transaction and only the outermost caller finalizes
    /// it.
    pub reuse_active: bool,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            isolation: None,
            auto_commit_on_success: true,
            rollback_on_error: true,
            reuse_active: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    NotStarted,
    Active,
    Completed,
}

/// A transaction bound to one connection.
///
/// Lifecycle: [`start`](Transaction::start) disables autocommit (remembering
/// the prior flag) and applies the requested isolation; commit/rollback are
/// legal only while `Active`; [`end`](Transaction::end) finalizes at most
/// once and always restores the connection's prior autocommit state and
/// releases it back to the provider, even when the commit or rollback
/// itself fails.
pub struct Transaction {
    connection: Option<Box<dyn Connection>>,
    config: TransactionConfig,
    state: TransactionState,
    rollback_only: bool,
    prior_auto_commit: bool,
}

impl Transaction {
    pub(crate) fn new(connection: Box<dyn Connection>, config: TransactionConfig) -> Self {
        Self {
            connection: Some(connection),
            config,
            state: TransactionState::NotStarted,
            rollback_only: false,
            prior_auto_commit: true,
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn is_rollback_only(&self) -> bool {
        self.rollback_only
    }

    /// Flag the transaction so that ending it rolls back regardless of the
    /// configured commit-on-success behavior.
    pub fn set_rollback_only(&mut self) {
        self.rollback_only = true;
    }

    pub(crate) fn connection(&mut self) -> Option<&mut (dyn Connection + '_)> {
        self.connection.as_mut().map(|c| &mut **c as _)
    }

    /// Take the connection back without starting; used when `start` fails
    /// and the connection must still go back to the provider.
    pub(crate) fn into_connection(self) -> Option<Box<dyn Connection>> {
        self.connection
    }

    pub(crate) fn start(&mut self) -> Result<(), AccessError> {
        if self.state != TransactionState::NotStarted {
            return Err(AccessError::Transaction(format!(
                "cannot start a transaction in state {:?}",
                self.state
            )));
        }
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| AccessError::Transaction("transaction has no connection".into()))?;

        self.prior_auto_commit = connection
            .auto_commit()
            .map_err(|e| AccessError::Transaction(format!("failed to start transaction: {e}")))?;
        connection
            .set_auto_commit(false)
            .map_err(|e| AccessError::Transaction(format!("failed to start transaction: {e}")))?;
        if let Some(isolation) = self.config.isolation {
            connection.set_isolation(isolation).map_err(|e| {
                AccessError::Transaction(format!("failed to apply isolation: {e}"))
            })?;
        }

        self.state = TransactionState::Active;
        debug!("transaction started");
        Ok(())
    }

    /// Commit now. Legal only while the transaction is active; ending the
    /// transaction afterwards just restores and releases the connection.
    pub fn commit(&mut self) -> Result<(), AccessError> {
        self.finalize_now(false)
    }

    /// Roll back now. Legal only while the transaction is active.
    pub fn rollback(&mut self) -> Result<(), AccessError> {
        self.finalize_now(true)
    }

    fn finalize_now(&mut self, rollback: bool) -> Result<(), AccessError> {
        if self.state != TransactionState::Active {
            return Err(AccessError::Transaction(format!(
                "cannot {} a transaction in state {:?}",
                if rollback { "roll back" } else { "commit" },
                self.state
            )));
        }
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| AccessError::Transaction("transaction has no connection".into()))?;
        let result = if rollback {
            connection.rollback()
        } else {
            connection.commit()
        };
        self.state = TransactionState::Completed;
        result.map_err(AccessError::DataAccess)
    }

    /// Finalize and release. Rolls back when flagged rollback-only,
    /// otherwise commits when configured to; the autocommit restore and the
    /// release run on every path, and a release failure is surfaced even
    /// when the commit or rollback succeeded — a leaked connection is a
    /// correctness issue.
    pub(crate) fn end(mut self, provider: &dyn ConnectionProvider) -> Result<(), AccessError> {
        let mut first_error: Option<AccessError> = None;

        if self.state == TransactionState::Active {
            let finalize = match self.connection.as_mut() {
                Some(connection) => {
                    if self.rollback_only || !self.config.auto_commit_on_success {
                        debug!("rolling back transaction");
                        connection.rollback()
                    } else {
                        debug!("committing transaction");
                        connection.commit()
                    }
                }
                None => Ok(()),
            };
            if let Err(e) = finalize {
                error!("transaction finalization failed: {e}");
                first_error = Some(AccessError::DataAccess(e));
            }
            self.state = TransactionState::Completed;
        }

        if let Some(mut connection) = self.connection.take() {
            if let Err(e) = connection.set_auto_commit(self.prior_auto_commit) {
                first_error.get_or_insert(AccessError::Transaction(format!(
                    "failed to restore autocommit: {e}"
                )));
            }
            if let Err(e) = provider.release(connection, ConnectionKind::Default) {
                first_error.get_or_insert(AccessError::Transaction(format!(
                    "failed to release transactional connection: {e}"
                )));
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    pub(crate) fn should_rollback_on_error(&self) -> bool {
        self.config.rollback_on_error
    }
}
