// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::filter::Filter;
use super::path::Path;

static NEXT_TARGET_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`Target`]. Clones of a target share the id, so alias
/// assignment treats them as the same relational source; two targets built
/// separately over the same table name are distinct, which is what makes
/// self-joins expressible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(u64);

impl TargetId {
    fn fresh() -> Self {
        TargetId(NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A queryable relational source: a named table, optionally aliased, with an
/// ordered list of joins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    id: TargetId,
    pub name: String,
    pub alias: Option<String>,
    pub joins: Vec<Join>,
}

impl Target {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TargetId::fresh(),
            name: name.into(),
            alias: None,
            joins: Vec::new(),
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            ..Self::new(name)
        }
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    /// A column path anchored to this target.
    pub fn path(&self, column: impl Into<String>) -> Path {
        Path::anchored(column, self.id)
    }

    /// The unqualified wildcard path.
    pub fn wildcard(&self) -> Path {
        Path::wildcard()
    }

    pub fn join(mut self, kind: JoinType, target: Target, on: Filter) -> Self {
        self.joins.push(Join { kind, target, on });
        self
    }

    pub fn inner_join(self, target: Target, on: Filter) -> Self {
        self.join(JoinType::Inner, target, on)
    }

    pub fn left_join(self, target: Target, on: Filter) -> Self {
        self.join(JoinType::Left, target, on)
    }

    pub fn right_join(self, target: Target, on: Filter) -> Self {
        self.join(JoinType::Right, target, on)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinType,
    pub target: Target,
    pub on: Filter,
}
