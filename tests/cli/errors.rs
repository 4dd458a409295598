//! Error reporting and settings resolution.

use predicates::prelude::*;

use crate::support::*;

#[test]
fn test_missing_vault_file() {
    let t = Test::new();
    let output = t.put("KEY", "value");
    assert_failure(&output);
    assert_stderr_contains(&output, "vault not found");
    assert_stderr_contains(&output, "cellar new");
}

#[test]
fn test_no_vault_configured() {
    let t = Test::new();
    let output = t
        .bare_cmd()
        .env_remove("CELLAR_VAULT")
        .arg("list")
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "--vault");
}

#[test]
fn test_vault_from_project_settings() {
    let t = Test::init();
    t.write(".cellar.toml", "[cellar]\nvault = \"vault.yaml\"\n");
    assert_success(&t.put("KEY", "value"));

    let output = t
        .bare_cmd()
        .env_remove("CELLAR_VAULT")
        .arg("list")
        .output()
        .unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "KEY");
}

#[test]
fn test_malformed_secret_key() {
    let t = Test::with_secrets(&[("KEY", "value")]);
    let output = t
        .bare_cmd()
        .env("CELLAR_SECRET_KEY", "CELLAR_ESK_garbage")
        .args(["get", "KEY"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "invalid format");
}

#[test]
fn test_completions() {
    let t = Test::new();
    t.bare_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cellar"));
}

#[test]
fn test_unknown_command() {
    let t = Test::new();
    t.bare_cmd()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("frobnicate"));
}
