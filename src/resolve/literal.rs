// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::access_error::AccessError;
use crate::expr::value::{ParameterValue, Value};
use crate::sql::token::SqlToken;

use super::context::ResolutionContext;

/// A literal resolves to a bound parameter, never to inline SQL text; this
/// is what makes the generated statements injection-safe by construction.
pub(crate) fn resolve_literal(
    value: &Value,
    ctx: &mut ResolutionContext<'_>,
) -> Result<SqlToken, AccessError> {
    ctx.bind(ParameterValue::new(value.clone()))
}
