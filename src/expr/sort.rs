// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

use super::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A sort key, or an ordered composition of sort keys. Composites flatten in
/// declaration order: the first-declared key is the primary sort key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Sort {
    By(Path, SortDirection),
    Composite(Vec<Sort>),
}

impl Sort {
    pub fn asc(path: Path) -> Sort {
        Sort::By(path, SortDirection::Asc)
    }

    pub fn desc(path: Path) -> Sort {
        Sort::By(path, SortDirection::Desc)
    }

    pub fn composite(sorts: impl IntoIterator<Item = Sort>) -> Sort {
        Sort::Composite(sorts.into_iter().collect())
    }

    /// Append another sort after this one.
    pub fn then(self, next: Sort) -> Sort {
        match self {
            Sort::Composite(mut sorts) => {
                sorts.push(next);
                Sort::Composite(sorts)
            }
            sort => Sort::Composite(vec![sort, next]),
        }
    }

    pub fn flatten(&self) -> Vec<(&Path, SortDirection)> {
        match self {
            Sort::By(path, direction) => vec![(path, *direction)],
            Sort::Composite(sorts) => sorts.iter().flat_map(|s| s.flatten()).collect(),
        }
    }
}
