// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

use super::filter::Operand;
use super::path::Path;

/// The function vocabulary of the expression model. The SQL rendering of
/// each kind is a dialect template; an unknown kind for the active dialect
/// is a resolution failure, never a best-effort fallback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Upper,
    Lower,
    Year,
    Month,
    Day,
    Hour,
    CurrentDate,
    CurrentTimestamp,
    Custom(String),
}

impl FunctionKind {
    pub fn name(&self) -> &str {
        match self {
            FunctionKind::Count => "count",
            FunctionKind::Sum => "sum",
            FunctionKind::Avg => "avg",
            FunctionKind::Min => "min",
            FunctionKind::Max => "max",
            FunctionKind::Upper => "upper",
            FunctionKind::Lower => "lower",
            FunctionKind::Year => "year",
            FunctionKind::Month => "month",
            FunctionKind::Day => "day",
            FunctionKind::Hour => "hour",
            FunctionKind::CurrentDate => "current_date",
            FunctionKind::CurrentTimestamp => "current_timestamp",
            FunctionKind::Custom(name) => name,
        }
    }
}

/// A function application over at most one operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlFunction {
    pub kind: FunctionKind,
    pub arg: Option<Box<Operand>>,
}

impl SqlFunction {
    pub fn new(kind: FunctionKind, arg: impl Into<Operand>) -> Self {
        Self {
            kind,
            arg: Some(Box::new(arg.into())),
        }
    }

    pub fn nullary(kind: FunctionKind) -> Self {
        Self { kind, arg: None }
    }

    pub fn count(path: Path) -> Self {
        Self::new(FunctionKind::Count, path)
    }

    pub fn sum(path: Path) -> Self {
        Self::new(FunctionKind::Sum, path)
    }

    pub fn avg(path: Path) -> Self {
        Self::new(FunctionKind::Avg, path)
    }

    pub fn min(path: Path) -> Self {
        Self::new(FunctionKind::Min, path)
    }

    pub fn max(path: Path) -> Self {
        Self::new(FunctionKind::Max, path)
    }

    pub fn upper(path: Path) -> Self {
        Self::new(FunctionKind::Upper, path)
    }

    pub fn lower(path: Path) -> Self {
        Self::new(FunctionKind::Lower, path)
    }

    pub fn year(path: Path) -> Self {
        Self::new(FunctionKind::Year, path)
    }

    pub fn month(path: Path) -> Self {
        Self::new(FunctionKind::Month, path)
    }

    pub fn day(path: Path) -> Self {
        Self::new(FunctionKind::Day, path)
    }

    pub fn hour(path: Path) -> Self {
        Self::new(FunctionKind::Hour, path)
    }

    pub fn current_date() -> Self {
        Self::nullary(FunctionKind::CurrentDate)
    }

    pub fn current_timestamp() -> Self {
        Self::nullary(FunctionKind::CurrentTimestamp)
    }

    pub fn custom(name: impl Into<String>, arg: impl Into<Operand>) -> Self {
        Self::new(FunctionKind::Custom(name.into()), arg)
    }
}
