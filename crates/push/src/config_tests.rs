// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const SAMPLE: &str = "\
# MCS policy
MCSID = MCS-0042
pushServer1=https://push.example.com:8459/

pushPingTimeout=30
not a setting
MCSID=MCS-0043
";

#[test]
fn parse_skips_comments_and_noise() {
    let config = McsConfig::parse(SAMPLE);
    assert_eq!(config.get("pushServer1"), Some("https://push.example.com:8459/"));
    assert_eq!(config.get("not a setting"), None);
}

#[test]
fn later_keys_override_earlier_ones() {
    assert_eq!(McsConfig::parse(SAMPLE).get("MCSID"), Some("MCS-0043"));
}

#[yare::parameterized(
    present = { "pushPingTimeout", Some(30) },
    absent  = { "missing", None },
)]
fn get_int_reads_integers(key: &str, expected: Option<u64>) {
    assert_eq!(McsConfig::parse(SAMPLE).get_int(key).unwrap(), expected);
}

#[test]
fn get_int_rejects_garbage() {
    let config = McsConfig::default().with("pushPingTimeout", "soon");
    assert!(matches!(config.get_int("pushPingTimeout"), Err(PushError::Config(_))));
}

#[test]
fn require_treats_empty_as_missing() {
    let config = McsConfig::default().with("MCSID", "");
    assert!(matches!(config.require("MCSID"), Err(PushError::Config(_))));
}

#[test]
fn load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mcs.config");
    std::fs::write(&path, SAMPLE).unwrap();
    assert_eq!(McsConfig::load(&path).unwrap(), McsConfig::parse(SAMPLE));

    let missing = McsConfig::load(&dir.path().join("nope"));
    assert!(matches!(missing, Err(PushError::ReadFile { .. })));
}
