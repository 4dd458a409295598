//! Assertions over captured command output.

use std::process::Output;

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

pub fn stdout(output: &Output) -> String {
    text(&output.stdout)
}

pub fn stderr(output: &Output) -> String {
    text(&output.stderr)
}

/// Panic with stderr unless the command exited zero.
pub fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "command failed ({}):\n{}",
        output.status,
        stderr(output)
    );
}

pub fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "command succeeded unexpectedly:\n{}",
        stdout(output)
    );
}

fn check(stream: &str, haystack: String, needle: &str, present: bool) {
    assert_eq!(
        haystack.contains(needle),
        present,
        "{} {} '{}':\n{}",
        stream,
        if present { "missing" } else { "unexpectedly contains" },
        needle,
        haystack
    );
}

pub fn assert_stdout_contains(output: &Output, expected: &str) {
    check("stdout", stdout(output), expected, true);
}

pub fn assert_stderr_contains(output: &Output, expected: &str) {
    check("stderr", stderr(output), expected, true);
}

pub fn assert_stdout_excludes(output: &Output, excluded: &str) {
    check("stdout", stdout(output), excluded, false);
}
