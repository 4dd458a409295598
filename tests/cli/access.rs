//! Tests for `cellar keygen/share/revoke/access`.

use cellar::core::crypto::{generate_key_pair, KeyType, PublicKey, SecretKey};

use crate::support::*;

fn identity() -> SecretKey {
    generate_key_pair(KeyType::Environment).unwrap()
}

#[test]
fn test_keygen_prints_tokens() {
    let t = Test::new();
    let output = t.bare_cmd().arg("keygen").output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "CELLAR_EPK_");
    assert_stdout_contains(&output, "CELLAR_ESK_");

    let output = t
        .bare_cmd()
        .args(["keygen", "--role", "root"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "CELLAR_RPK_");
}

#[test]
fn test_keygen_tokens_parse() {
    let t = Test::new();
    let output = t.bare_cmd().arg("keygen").output().unwrap();
    let out = stdout(&output);

    let token = |label: &str| {
        out.lines()
            .find(|l| l.trim_start().starts_with(label))
            .and_then(|l| l.split_whitespace().last())
            .unwrap()
            .to_string()
    };
    let public: PublicKey = token("public:").parse().unwrap();
    let secret: SecretKey = token("secret:").parse().unwrap();
    assert_eq!(secret.public_key(), &public);
}

#[test]
fn test_share_grants_access() {
    let t = Test::with_secrets(&[("KEY", "value")]);
    let bob = identity();

    assert_failure(&t.cmd_as(&bob).args(["get", "KEY"]).output().unwrap());

    let output = t.share(&bob);
    assert_success(&output);
    assert_stdout_contains(&output, "shared with");

    let output = t.cmd_as(&bob).args(["get", "KEY"]).output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "value");

    let output = t.share(&bob);
    assert_success(&output);
    assert_stdout_contains(&output, "already shared");
}

#[test]
fn test_share_requires_access() {
    let t = Test::init();
    let stranger = identity();
    let output = t
        .cmd_as(&stranger)
        .args(["share", stranger.public_key().to_string().as_str()])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "not accessible");
}

#[test]
fn test_revoke_removes_access() {
    let t = Test::init();
    let bob = identity();
    assert_success(&t.share(&bob));
    assert_success(&t.put("KEY", "value"));
    let before = t.read("vault.yaml");

    let output = t.revoke(&bob);
    assert_success(&output);
    assert_stdout_contains(&output, "rotated");

    let output = t.cmd_as(&bob).args(["get", "KEY"]).output().unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "not accessible");

    let output = t.get("KEY");
    assert_success(&output);
    assert_stdout_contains(&output, "value");

    let after = t.read("vault.yaml");
    let public_key = |doc: &str| {
        doc.lines()
            .find(|l| l.trim_start().starts_with("publicKey:"))
            .unwrap()
            .to_string()
    };
    assert_ne!(public_key(&before), public_key(&after));
}

#[test]
fn test_access_lists_accessors() {
    let t = Test::init();
    let bob = identity();
    assert_success(&t.share(&bob));

    let output = t.bare_cmd().arg("access").output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "2 accessors");
    assert_stdout_contains(&output, bob.public_key().to_string().as_str());
    assert_stdout_contains(&output, &t.owner.public_key().fingerprint());
}
