// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Execution: the external driver contract, the transaction state machine,
//! the explicit execution context, and the datastore/session facade.

pub mod connection;
pub mod context;
pub mod datastore;
pub mod transaction;

#[cfg(test)]
pub(crate) mod stub;
