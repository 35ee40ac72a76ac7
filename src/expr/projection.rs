// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

use super::function::SqlFunction;
use super::path::Path;
use super::value::Value;

/// One element of a SELECT list. A `PropertySet` expands to one output
/// column per member path; `Constant` renders inline (never as a bound
/// parameter) so a tag column can be added without disturbing the
/// statement's placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    Path(Path),
    PropertySet(Vec<Path>),
    Function(SqlFunction),
    Constant(Value),
    CountAll,
}

impl From<Path> for Projection {
    fn from(path: Path) -> Self {
        Projection::Path(path)
    }
}

impl From<SqlFunction> for Projection {
    fn from(function: SqlFunction) -> Self {
        Projection::Function(function)
    }
}
