//! Tests for password-bound environments.

use cellar::core::crypto::PublicKey;

use crate::support::*;

#[test]
fn test_env_binding_unlocks_vault() {
    let t = Test::with_secrets(&[("KEY", "value")]);

    let output = t
        .bare_cmd()
        .env("CELLAR_PASSWORD", "correct horse")
        .args(["env", "new", "ci", "--service", "--tag", "prod"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "type: service");

    let out = stdout(&output);
    let field = |label: &str| {
        out.lines()
            .find(|l| l.trim_start().starts_with(label))
            .and_then(|l| l.split_whitespace().last())
            .unwrap()
            .to_string()
    };
    let public: PublicKey = field("public:").parse().unwrap();
    let binding = field("binding:");
    assert!(binding.starts_with("CELLAR_EB_"));

    let output = t
        .cmd()
        .args(["share", public.to_string().as_str()])
        .output()
        .unwrap();
    assert_success(&output);

    let output = t
        .bare_cmd()
        .env("CELLAR_ENV_BINDING", &binding)
        .env("CELLAR_PASSWORD", "correct horse")
        .args(["get", "KEY"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "value");

    let output = t
        .bare_cmd()
        .env("CELLAR_ENV_BINDING", &binding)
        .env("CELLAR_PASSWORD", "wrong")
        .args(["get", "KEY"])
        .output()
        .unwrap();
    assert_failure(&output);
}

#[test]
fn test_env_list_filters_saved_environments() {
    let t = Test::init();
    let create = |args: &[&str]| {
        let output = t
            .bare_cmd()
            .env("CELLAR_PASSWORD", "pw")
            .args(["env", "new"])
            .args(args)
            .output()
            .unwrap();
        assert_success(&output);
        output
    };
    let output = create(&["ci", "--service", "--tag", "prod", "--out", "ci.yaml"]);
    assert_stdout_contains(&output, "ci.yaml");
    create(&["laptop", "--email", "dev@example.com", "--out", "laptop.yaml"]);

    let output = t
        .bare_cmd()
        .args(["env", "list", "ci.yaml", "laptop.yaml"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "ci (service)");
    assert_stdout_contains(&output, "laptop (user)");

    let output = t
        .bare_cmd()
        .args(["env", "list", "ci.yaml", "laptop.yaml", "--query", "PROD"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "ci (service)");
    assert_stdout_excludes(&output, "laptop");

    let output = t
        .bare_cmd()
        .args(["env", "list", "ci.yaml", "--query", "nomatch"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "no matching environments");
}
