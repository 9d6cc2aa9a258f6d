// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn exit_error_keeps_its_code() {
    let error = anyhow::Error::new(ExitError::new(7, "custom"));
    assert_eq!(report(&error), 7);
}

#[test]
fn other_errors_are_operational_failures() {
    let error = anyhow::anyhow!("socket gone");
    assert_eq!(report(&error), EXIT_FAILURE);
}
