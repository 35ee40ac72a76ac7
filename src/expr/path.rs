// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

use super::target::TargetId;
use super::value::ValueKind;

/// A named column reference, optionally anchored to a target and optionally
/// carrying a declared value kind.
///
/// A path renders alias-qualified only when its parent target has an alias
/// assigned in the current resolution scope; the wildcard path `*` is never
/// qualified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    pub name: String,
    pub parent: Option<TargetId>,
    pub value_kind: Option<ValueKind>,
}

pub const WILDCARD: &str = "*";

impl Path {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            value_kind: None,
        }
    }

    pub(crate) fn anchored(name: impl Into<String>, parent: TargetId) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent),
            value_kind: None,
        }
    }

    pub fn wildcard() -> Self {
        Self::new(WILDCARD)
    }

    pub fn typed(mut self, kind: ValueKind) -> Self {
        self.value_kind = Some(kind);
        self
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD
    }
}
