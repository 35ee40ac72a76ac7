// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

use crate::access_error::AccessError;

/// An immutable, validated SQL text fragment — the atomic unit every
/// resolver produces. Construction rejects empty or all-whitespace text, so
/// a blank fragment can never silently vanish into a composed statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SqlToken {
    text: String,
}

impl SqlToken {
    pub fn new(text: impl Into<String>) -> Result<SqlToken, AccessError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(AccessError::invalid("empty SQL token"));
        }
        Ok(SqlToken { text })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl std::fmt::Display for SqlToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for SqlToken {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_text() {
        assert!(SqlToken::new("").is_err());
        assert!(SqlToken::new("   ").is_err());
        assert!(SqlToken::new("SELECT 1").is_ok());
    }
}
