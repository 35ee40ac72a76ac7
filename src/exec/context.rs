// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::connection::Connection;
use super::transaction::Transaction;

/// A frame of the transaction stack. A non-reusing begin pushes a `Root`
/// owning its connection; a reusing begin inside an active transaction
/// pushes `Nested`, which participates in the nearest root below it.
pub(crate) enum TxFrame {
    Root(Transaction),
    Nested,
}

/// The explicit per-logical-operation execution state: the transaction
/// stack (innermost last) and the optional shared connection of a
/// multi-statement composite operation. One instance belongs to one
/// session on one thread; it is never handed across threads.
#[derive(Default)]
pub struct ExecutionContext {
    pub(crate) frames: Vec<TxFrame>,
    pub(crate) shared: Option<Box<dyn Connection>>,
    pub(crate) shared_depth: usize,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_transaction(&self) -> bool {
        self.frames
            .iter()
            .any(|frame| matches!(frame, TxFrame::Root(_)))
    }

    pub fn in_shared_scope(&self) -> bool {
        self.shared_depth > 0
    }

    /// The innermost root transaction, the one any statement executes in.
    pub(crate) fn innermost_root_mut(&mut self) -> Option<&mut Transaction> {
        self.frames.iter_mut().rev().find_map(|frame| match frame {
            TxFrame::Root(tx) => Some(tx),
            TxFrame::Nested => None,
        })
    }
}
