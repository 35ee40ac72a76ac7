// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

#![cfg(test)]

//! Test assertions for compiled SQL and bound parameters.

/// Assert that a `(sql, params)` pair matches the expected statement text
/// and parameter values.
///
/// ```ignore
/// assert_binding!(compiled, "SELECT t.strv AS c0 FROM T t WHERE t.keycode = ?", 1i64);
/// assert_binding!(compiled, "SELECT * FROM T t"); // no parameters
/// ```
macro_rules! assert_binding {
    ($actual:expr, $expected_sql:expr $(, $expected_param:expr)* $(,)?) => {{
        let (actual_sql, actual_params) = $actual;
        assert_eq!(actual_sql, $expected_sql, "statement mismatch");
        let expected: Vec<$crate::expr::value::ParameterValue> = vec![
            $($crate::expr::value::ParameterValue::new(
                $crate::expr::value::Value::from($expected_param)
            )),*
        ];
        assert_eq!(actual_params, expected, "parameter mismatch");
    }};
}
