/*!
 * Command-Line Integration Tests
 *
 * Runs the built binary against policies on disk and checks exit codes and
 * the JSON written to stdout.
 */

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const POLICY: &str = r#"
label: legal_approval
users: [legal1, legal2]
---
label: prod_admin_approval
users: [prod1, prod2, prod3]
num_approvers_required: 2
requester_must_be_authorized: true
"#;

const ENV_UNKNOWN: &str = "APPROVAL_UNKNOWN_LABEL_POLICY";
const ENV_STRICT: &str = "APPROVAL_POLICY_STRICT";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        fixture.write("policy.yaml", POLICY);
        fixture
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn policy(&self) -> PathBuf {
        self.dir.path().join("policy.yaml")
    }
}

/// Binary with the policy environment cleared
fn command() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_approval-policy"));
    cmd.env_remove(ENV_UNKNOWN)
        .env_remove(ENV_STRICT)
        .env_remove("RUST_LOG");
    cmd
}

fn check(policy: &Path, args: &[&str]) -> Command {
    let mut cmd = command();
    cmd.arg("check").arg("--policy").arg(policy).args(args);
    cmd
}

fn run(cmd: &mut Command) -> (i32, serde_json::Value) {
    let Output { status, stdout, .. } = cmd.output().unwrap();
    let json = serde_json::from_slice(&stdout).unwrap_or(serde_json::Value::Null);
    (status.code().unwrap(), json)
}

#[test]
fn test_check_granted_exits_zero() {
    let fx = Fixture::new();
    let (code, json) = run(&mut check(
        &fx.policy(),
        &[
            "--requester", "prod1",
            "--label", "prod_admin_approval",
            "--approver", "prod2",
            "--approver", "prod3",
        ],
    ));
    assert_eq!(code, 0);
    assert_eq!(json["decision"], "granted");
}

#[test]
fn test_check_denied_exits_one() {
    let fx = Fixture::new();
    let (code, json) = run(&mut check(
        &fx.policy(),
        &[
            "--requester", "prod1",
            "--label", "prod_admin_approval",
            "--approver", "prod1",
            "--approver", "prod2",
        ],
    ));
    assert_eq!(code, 1);
    assert_eq!(json["decision"], "denied");
    assert_eq!(json["per_label"][0]["missing_approvers_count"], 1);
}

#[test]
fn test_check_invalid_request_exits_two() {
    let fx = Fixture::new();
    let (code, json) = run(&mut check(&fx.policy(), &["--label", "legal_approval"]));
    assert_eq!(code, 2);
    assert_eq!(json["error"], "invalid_request");
}

#[test]
fn test_unreadable_request_file_is_invalid_request() {
    let fx = Fixture::new();
    let missing = fx.dir.path().join("absent.json");
    let (code, json) = run(&mut check(
        &fx.policy(),
        &["--request-file", missing.to_str().unwrap()],
    ));
    assert_eq!(code, 2);
    assert_eq!(json["error"], "invalid_request");
}

#[test]
fn test_request_file_decided() {
    let fx = Fixture::new();
    let request = fx.write(
        "request.json",
        r#"{"requester":"alice","labels":["legal_approval"],"approvals":["legal2"]}"#,
    );
    let (code, json) = run(&mut check(
        &fx.policy(),
        &["--request-file", request.to_str().unwrap()],
    ));
    assert_eq!(code, 0);
    assert_eq!(json["decision"], "granted");
}

#[test]
fn test_check_load_error_exits_three() {
    let fx = Fixture::new();
    let broken = fx.write("broken.yaml", "label: ops_approval\nusers: []\n");
    let (code, json) = run(&mut check(
        &broken,
        &["--requester", "alice", "--label", "ops_approval"],
    ));
    assert_eq!(code, 3);
    assert_eq!(json["error"], "load_error");
    assert_eq!(json["violations"][0]["kind"], "empty_group");
}

#[test]
fn test_validate_exit_codes() {
    let fx = Fixture::new();

    let output = command()
        .arg("validate")
        .arg("--policy")
        .arg(fx.policy())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 rule(s) loaded"));

    let broken = fx.write("broken.yaml", "label: a\nusers: [x]\nnum_approvers_required: 2\n");
    let output = command()
        .arg("validate")
        .arg("--policy")
        .arg(&broken)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_unknown_label_env_fallback_fails_closed() {
    let fx = Fixture::new();
    let args = ["--requester", "alice", "--label", "secret"];

    let (code, json) = run(check(&fx.policy(), &args).env(ENV_UNKNOWN, "maybe"));
    assert_eq!(code, 1);
    assert_eq!(json["per_label"][0]["unknown_label"], true);

    let (code, _) = run(check(&fx.policy(), &args).env(ENV_UNKNOWN, "allow"));
    assert_eq!(code, 0);
}

#[test]
fn test_unknown_label_flag_overrides_env() {
    let fx = Fixture::new();

    let mut args = vec![
        "--requester", "alice",
        "--label", "secret",
        "--unknown-labels", "deny",
    ];
    let (code, _) = run(check(&fx.policy(), &args).env(ENV_UNKNOWN, "allow"));
    assert_eq!(code, 1);

    args[5] = "allow";
    let (code, _) = run(check(&fx.policy(), &args).env(ENV_UNKNOWN, "deny"));
    assert_eq!(code, 0);
}

#[test]
fn test_strict_from_env_and_flag() {
    let fx = Fixture::new();
    let extra = fx.write(
        "extra.yaml",
        "label: legal_approval\nusers: [legal1]\nowner: legal-team\n",
    );
    let validate = |strict_flag: bool| {
        let mut cmd = command();
        cmd.arg("validate").arg("--policy").arg(&extra);
        if strict_flag {
            cmd.arg("--strict");
        }
        cmd
    };

    assert_eq!(validate(false).output().unwrap().status.code(), Some(0));
    assert_eq!(
        validate(false).env(ENV_STRICT, "1").output().unwrap().status.code(),
        Some(3)
    );
    assert_eq!(validate(true).output().unwrap().status.code(), Some(3));
}
