//! Tests for `cellar ref/deref`.

use crate::support::*;

#[test]
fn test_ref_then_deref_restores_values() {
    let t = Test::init();
    t.write("config.yaml", "a: x\nb:\n  c: y\n");

    let output = t.reference("config.yaml", &[]);
    assert_success(&output);
    let referenced = t.read("config.yaml");
    assert!(referenced.contains("{{CELLAR_VID_"));
    assert!(!referenced.contains(": x"));

    let output = t.list();
    assert_stdout_contains(&output, "a");
    assert_stdout_contains(&output, "b__c");

    assert_success(&t.dereference("config.yaml", &[]));
    let restored: serde_yaml::Value = serde_yaml::from_str(&t.read("config.yaml")).unwrap();
    let expected: serde_yaml::Value = serde_yaml::from_str("a: x\nb:\n  c: y\n").unwrap();
    assert_eq!(restored, expected);
}

#[test]
fn test_ref_is_idempotent() {
    let t = Test::init();
    t.write("config.yaml", "token: abc\n");

    assert_success(&t.reference("config.yaml", &[]));
    let first = t.read("config.yaml");
    assert_success(&t.reference("config.yaml", &[]));
    assert_eq!(t.read("config.yaml"), first);
}

#[test]
fn test_ref_conflict_keeps_existing_secret() {
    let t = Test::with_secrets(&[("X", "1")]);
    t.write("config.yaml", "X: new\n");

    let output = t.reference("config.yaml", &[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "exists already");
    assert_eq!(t.read("config.yaml"), "X: new\n");
    assert_stdout_contains(&t.get("X"), "1");

    assert_success(&t.reference("config.yaml", &["--force"]));
    assert_stdout_contains(&t.get("X"), "new");
}

#[test]
fn test_ref_preview_changes_nothing() {
    let t = Test::init();
    t.write("config.yaml", "key: value\n");

    let output = t.reference("config.yaml", &["--preview"]);
    assert_success(&output);
    assert_stdout_contains(&output, "CELLAR_SECRET_PREVIEW");
    assert_eq!(t.read("config.yaml"), "key: value\n");
    assert_stdout_contains(&t.list(), "no secrets stored");
}

#[test]
fn test_ref_json_file() {
    let t = Test::init();
    t.write("config.json", r#"{"db": {"password": "pw"}, "port": 5432}"#);

    assert_success(&t.reference("config.json", &["--prefix", "app"]));
    let parsed: serde_json::Value = serde_json::from_str(&t.read("config.json")).unwrap();
    assert_eq!(parsed["port"], 5432);
    assert!(parsed["db"]["password"]
        .as_str()
        .unwrap()
        .ends_with(".app__db__password}}"));
}

#[test]
fn test_deref_preview_leaves_file() {
    let t = Test::init();
    t.write("config.yaml", "key: value\n");
    assert_success(&t.reference("config.yaml", &["--random"]));
    let referenced = t.read("config.yaml");
    assert!(referenced.contains(".ref_"));

    let output = t.dereference("config.yaml", &["--preview"]);
    assert_success(&output);
    assert_stdout_contains(&output, "value");
    assert_stdout_excludes(&output, "CELLAR_VID_");
    assert_eq!(t.read("config.yaml"), referenced);
}

#[test]
fn test_deref_walks_directories() {
    let t = Test::init();
    std::fs::create_dir(t.dir.path().join("conf")).unwrap();
    t.write("conf/app.yaml", "greeting: \"it's here\"\n");
    t.write("conf/db.json", r#"{"password": "say \"hi\""}"#);
    t.write("conf/readme.txt", "untouched\n");

    assert_success(&t.reference("conf/app.yaml", &[]));
    assert_success(&t.reference("conf/db.json", &[]));
    assert!(t.read("conf/app.yaml").contains("{{CELLAR_VID_"));

    let output = t.cmd().args(["deref", "conf"]).output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "app.yaml");
    assert_stdout_contains(&output, "db.json");

    let app: serde_yaml::Value = serde_yaml::from_str(&t.read("conf/app.yaml")).unwrap();
    assert_eq!(app["greeting"].as_str(), Some("it's here"));
    let db: serde_json::Value = serde_json::from_str(&t.read("conf/db.json")).unwrap();
    assert_eq!(db["password"], "say \"hi\"");
    assert_eq!(t.read("conf/readme.txt"), "untouched\n");
}

#[test]
fn test_deref_accepts_several_files() {
    let t = Test::init();
    t.write("a.yaml", "one: \"line\\nbreak\"\n");
    t.write("b.yaml", "two: plain\n");
    assert_success(&t.reference("a.yaml", &[]));
    assert_success(&t.reference("b.yaml", &["--prefix", "b"]));

    let output = t.cmd().args(["deref", "a.yaml", "b.yaml"]).output().unwrap();
    assert_success(&output);

    let a: serde_yaml::Value = serde_yaml::from_str(&t.read("a.yaml")).unwrap();
    assert_eq!(a["one"].as_str(), Some("line\nbreak"));
    let b: serde_yaml::Value = serde_yaml::from_str(&t.read("b.yaml")).unwrap();
    assert_eq!(b["two"].as_str(), Some("plain"));
}
