// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::value::Value;

/// An ordered column-to-value map describing one logical row, with zero or
/// more columns marked as identifier properties. Identifier marks drive the
/// fast path of primary-key resolution; they are a property of the value
/// object, not of the table, and are therefore never cached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    entries: IndexMap<String, Value>,
    identifiers: Vec<String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(column.into(), value.into());
        self
    }

    /// Set a value and mark the column as an identifier property.
    pub fn set_identifier(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        if !self.identifiers.contains(&column) {
            self.identifiers.push(column.clone());
        }
        self.entries.insert(column, value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn identifier_columns(&self) -> &[String] {
        &self.identifiers
    }

    pub fn is_identifier(&self, column: &str) -> bool {
        self.identifiers.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
