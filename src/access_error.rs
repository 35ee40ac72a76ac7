// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

/// Failures reported by the external connection/statement layer.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum AccessError {
    /// A malformed or unresolvable expression tree node: no resolver found,
    /// a missing required operand, an empty primary key, and the like.
    /// Raised before any SQL reaches the driver.
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    /// A failure from the underlying connection/statement layer, including
    /// constraint violations and connectivity errors.
    #[error("{0}")]
    DataAccess(#[from] DriverError),

    /// An illegal transaction state transition, or a failure to start or
    /// release a transactional connection.
    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("{0}: {1}")]
    WithContext(String, #[source] Box<AccessError>),
}

impl AccessError {
    pub fn invalid(message: impl Into<String>) -> AccessError {
        AccessError::InvalidExpression(message.into())
    }

    pub fn with_context(self, context: String) -> AccessError {
        AccessError::WithContext(context, Box::new(self))
    }
}

pub trait WithContext {
    fn with_context(self, context: String) -> Self;
}

impl<T> WithContext for Result<T, AccessError> {
    fn with_context(self, context: String) -> Result<T, AccessError> {
        self.map_err(|e| e.with_context(context))
    }
}
