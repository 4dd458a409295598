//! Tests for `cellar new/put/get/rm/list/export/run`.

use crate::support::*;

#[test]
fn test_put_and_get_roundtrip() {
    let t = Test::init();

    let output = t.put("DATABASE_URL", "postgres://localhost/db");
    assert_success(&output);
    assert_stdout_contains(&output, "DATABASE_URL");

    let output = t.get("DATABASE_URL");
    assert_success(&output);
    assert_eq!(stdout(&output).trim_end(), "postgres://localhost/db");
}

#[test]
fn test_put_overwrites() {
    let t = Test::with_secrets(&[("KEY", "original")]);

    assert_success(&t.put("KEY", "replacement"));
    let output = t.get("KEY");
    assert_success(&output);
    assert_stdout_contains(&output, "replacement");
}

#[test]
fn test_new_refuses_existing_vault() {
    let t = Test::init();
    let output = t.new_vault(&[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "exists already");
}

#[test]
fn test_vault_file_holds_no_plaintext() {
    let t = Test::with_secrets(&[("DB_PASS", "hunter2-very-secret")]);
    let vault = t.read("vault.yaml");

    assert!(vault.contains("DB_PASS: CELLAR_VSS_"));
    assert!(vault.contains("CELLAR_EWK_"));
    assert!(!vault.contains("hunter2"));
}

#[test]
fn test_invalid_names_rejected() {
    let t = Test::init();

    assert_failure(&t.put("123BAD", "value"));
    assert_failure(&t.put("", "value"));
    assert_failure(&t.put("KEY-WITH-DASH", "value"));
    assert_failure(&t.put("TRAILING_", "value"));
}

#[test]
fn test_get_nonexistent_fails() {
    let t = Test::init();
    let output = t.get("NONEXISTENT_KEY");
    assert_failure(&output);
    assert_stderr_contains(&output, "secret not found");
}

#[test]
fn test_get_without_secret_key_fails() {
    let t = Test::with_secrets(&[("KEY", "value")]);
    let output = t
        .bare_cmd()
        .args(["get", "KEY"])
        .output()
        .expect("failed to run cellar get");
    assert_failure(&output);
    assert_stderr_contains(&output, "CELLAR_SECRET_KEY");
}

#[test]
fn test_rm_removes_secret() {
    let t = Test::with_secrets(&[("TEMP_KEY", "temp_value")]);

    assert_success(&t.rm("TEMP_KEY"));
    assert_failure(&t.get("TEMP_KEY"));
    assert_failure(&t.rm("TEMP_KEY"));
}

#[test]
fn test_list_shows_names_only() {
    let t = Test::with_secrets(&[("ALPHA", "one"), ("BETA", "two")]);

    let output = t.list();
    assert_success(&output);
    assert_stdout_contains(&output, "ALPHA");
    assert_stdout_contains(&output, "BETA");
    assert_stdout_excludes(&output, "one");
}

#[test]
fn test_list_empty() {
    let t = Test::init();
    let output = t.list();
    assert_success(&output);
    assert_stdout_contains(&output, "no secrets stored");
}

#[test]
fn test_list_json() {
    let t = Test::with_secrets(&[("B", "2"), ("A", "1")]);

    let output = t.list_json();
    assert_success(&output);
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["count"], 2);
    assert_eq!(parsed["secrets"][0]["name"], "A");
    assert_eq!(parsed["secrets"][1]["name"], "B");
}

#[test]
fn test_list_shows_hashes() {
    let t = Test::new();
    let output = t
        .cmd()
        .args([
            "new",
            "--hash-length",
            "4",
            "--share",
            t.owner.public_key().to_string().as_str(),
        ])
        .output()
        .unwrap();
    assert_success(&output);
    assert_success(&t.put("A", "same"));
    assert_success(&t.put("B", "same"));

    let parsed: serde_json::Value = serde_json::from_str(&stdout(&t.list_json())).unwrap();
    let a = parsed["secrets"][0]["hash"].as_str().unwrap().to_string();
    assert_eq!(parsed["secrets"][1]["hash"], a.as_str());
}

#[test]
fn test_new_default_records_vault() {
    let t = Test::new();
    let output = t
        .cmd()
        .args([
            "new",
            "--default",
            "--share",
            t.owner.public_key().to_string().as_str(),
        ])
        .output()
        .unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, ".cellar.toml");

    let settings: toml::Value = toml::from_str(&t.read(".cellar.toml")).unwrap();
    assert_eq!(
        settings["cellar"]["vault"].as_str().unwrap(),
        t.vault_path().to_str().unwrap()
    );

    let output = t
        .bare_cmd()
        .env_remove("CELLAR_VAULT")
        .args(["put", "KEY", "value"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_stdout_contains(&t.get("KEY"), "value");
}

#[test]
fn test_export_env_lines() {
    let t = Test::with_secrets(&[("DB_PASS", r#"pa"ss\word"#), ("API_KEY", "k")]);

    let output = t.export("env");
    assert_success(&output);
    assert_eq!(
        stdout(&output).trim_end(),
        "API_KEY=\"k\"\nDB_PASS=\"pa\\\"ss\\\\word\""
    );
}

#[test]
fn test_export_json_and_yaml() {
    let t = Test::with_secrets(&[("A", "it's"), ("B", "two")]);

    let output = t.export("json");
    assert_success(&output);
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed, serde_json::json!({"A": "it's", "B": "two"}));

    let output = t.export("yaml");
    assert_success(&output);
    let parsed: serde_yaml::Value = serde_yaml::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["A"].as_str(), Some("it's"));
    assert_eq!(parsed["B"].as_str(), Some("two"));
}

#[test]
fn test_export_needs_secret_key() {
    let t = Test::with_secrets(&[("A", "1")]);
    let output = t
        .bare_cmd()
        .arg("export")
        .output()
        .expect("failed to run cellar export");
    assert_failure(&output);
    assert_stdout_excludes(&output, "A=");
}

#[test]
fn test_run_injects_secrets() {
    let t = Test::with_secrets(&[("DB_PASS", "s3cr3t"), ("API_KEY", "k")]);

    let output = t.run(&["sh", "-c", r#"printf '%s:%s' "$DB_PASS" "$API_KEY""#]);
    assert_success(&output);
    assert_eq!(stdout(&output), "s3cr3t:k");
}

#[test]
fn test_run_propagates_exit_code() {
    let t = Test::with_secrets(&[("A", "1")]);
    let output = t.run(&["sh", "-c", "exit 3"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_run_without_access_does_not_start_command() {
    let t = Test::with_secrets(&[("A", "1")]);
    let output = t
        .bare_cmd()
        .args(["run", "--", "sh", "-c", "echo started"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stdout_excludes(&output, "started");
}
