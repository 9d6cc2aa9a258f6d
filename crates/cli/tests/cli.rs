// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end checks of the fake peer binaries.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::Path;
use std::process::{Child, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;

fn agent(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("fake-agent").unwrap();
    cmd.arg("--ipc-dir").arg(dir).env("MF_LOG", "off");
    cmd
}

fn plugin(dir: &Path, name: &str) -> Command {
    let mut cmd = Command::cargo_bin("fake-plugin").unwrap();
    cmd.arg("--ipc-dir").arg(dir).arg(name).env("MF_LOG", "off");
    cmd
}

/// A serving peer process, killed if the test bails out early.
struct Serving(Child);

impl Serving {
    fn start(dir: &Path) -> Self {
        Self::spawn("fake-agent", dir, &["serve"])
    }

    fn plugin(dir: &Path, name: &str, args: &[&str]) -> Self {
        let mut full = vec![name, "serve"];
        full.extend_from_slice(args);
        Self::spawn("fake-plugin", dir, &full)
    }

    fn spawn(bin: &str, dir: &Path, args: &[&str]) -> Self {
        let child = std::process::Command::new(cargo_bin(bin))
            .arg("--ipc-dir")
            .arg(dir)
            .args(args)
            .env("MF_LOG", "off")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();
        Self(child)
    }

    fn wait_for_exit(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Some(status) = self.0.try_wait().unwrap() {
                return status.success();
            }
            thread::sleep(Duration::from_millis(20));
        }
        false
    }
}

impl Drop for Serving {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

#[test]
fn unknown_command_prints_usage() {
    let dir = tempfile::tempdir().unwrap();
    let output = agent(dir.path()).arg("explode").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn unknown_wire_command_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    plugin(dir.path(), "SAVPlugin").args(["send-custom", "SAV", "Explode"]).assert().code(2);
}

#[test]
fn missing_agent_is_an_operational_failure() {
    let dir = tempfile::tempdir().unwrap();
    let output =
        agent(dir.path()).arg("list-plugins").env("MF_CONNECT_RETRIES", "1").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("error:"));
}

#[test]
fn plugin_and_agent_talk_through_the_binaries() {
    let dir = tempfile::tempdir().unwrap();
    let mut serving = Serving::start(dir.path());

    plugin(dir.path(), "SAVPlugin").arg("register").assert().success().stdout("ACK\n");
    agent(dir.path()).arg("list-plugins").assert().success().stdout("SAVPlugin\n");

    agent(dir.path())
        .args(["queue-reply", "RequestPolicy", "SAV", "policy1"])
        .assert()
        .success();
    agent(dir.path())
        .args(["queue-reply", "RequestPolicy", "SAV", "ERROR", "no policy for you"])
        .assert()
        .success();
    plugin(dir.path(), "SAVPlugin")
        .args(["request-policy", "SAV"])
        .assert()
        .success()
        .stdout("policy1\n");
    plugin(dir.path(), "SAVPlugin")
        .args(["request-policy", "SAV"])
        .assert()
        .code(1)
        .stdout("ERROR: no policy for you\n");

    agent(dir.path()).arg("stop").assert().success().stdout("ACK\n");
    assert!(serving.wait_for_exit(Duration::from_secs(10)));
}

#[test]
fn json_format_prints_tagged_reply() {
    let dir = tempfile::tempdir().unwrap();
    let mut serving = Serving::start(dir.path());

    plugin(dir.path(), "SAVPlugin")
        .args(["--format", "json", "register"])
        .assert()
        .success()
        .stdout("{\"type\":\"Ack\"}\n");

    agent(dir.path()).arg("stop").assert().success();
    assert!(serving.wait_for_exit(Duration::from_secs(10)));
}

#[test]
fn served_plugin_answers_with_preloaded_status_and_telemetry() {
    let dir = tempfile::tempdir().unwrap();
    let mut serving = Serving::start(dir.path());
    let mut sav = Serving::plugin(
        dir.path(),
        "SAVPlugin",
        &[
            "--register",
            "--status",
            "SAV",
            "StatusXML",
            "StatusWithoutXML",
            "--telemetry",
            r#"{"files":12}"#,
        ],
    );

    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let listed = agent(dir.path()).arg("list-plugins").output().unwrap();
        if String::from_utf8_lossy(&listed.stdout).contains("SAVPlugin") {
            break;
        }
        assert!(Instant::now() < deadline, "plugin never registered");
        thread::sleep(Duration::from_millis(50));
    }

    agent(dir.path()).args(["link", "SAV", "SAVPlugin"]).assert().success();
    agent(dir.path())
        .args(["request-status", "SAV"])
        .assert()
        .success()
        .stdout("StatusXML\nStatusWithoutXML\n");
    agent(dir.path())
        .args(["request-telemetry", "SAVPlugin"])
        .assert()
        .success()
        .stdout("{\"files\":12}\n");

    agent(dir.path())
        .args(["send-custom", "SAV", "SAVPlugin", "Stop"])
        .assert()
        .success();
    assert!(sav.wait_for_exit(Duration::from_secs(10)));
    agent(dir.path()).arg("stop").assert().success();
    assert!(serving.wait_for_exit(Duration::from_secs(10)));
}
