//! Input validation for cellar operations.
//!
//! Secret names are identifiers: a letter first, then letters, digits and
//! underscores, never ending with an underscore.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, SecretError};

/// Secret name grammar without anchors, shared with the reference token grammar.
pub(crate) const SECRET_NAME_PATTERN: &str = "[A-Za-z](?:[A-Za-z0-9_]*[A-Za-z0-9])?";

fn secret_name_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(&format!("^{}$", SECRET_NAME_PATTERN)).expect("secret name pattern is valid")
    })
}

/// Check a secret name against the identifier grammar.
pub fn is_valid_secret_name(name: &str) -> bool {
    secret_name_regex().is_match(name)
}

/// Validate a secret name.
///
/// # Errors
///
/// Returns `SecretError::InvalidName` if the name breaks the grammar.
pub fn validate_secret_name(name: &str) -> Result<()> {
    if is_valid_secret_name(name) {
        Ok(())
    } else {
        Err(SecretError::InvalidName(name.to_string()).into())
    }
}

/// Turn an arbitrary path-derived string into a valid secret name.
///
/// Unsupported characters become underscores, surrounding underscores are
/// trimmed, and names not starting with a letter get an `S_` prefix.
pub fn sanitize_secret_name(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let trimmed = replaced.trim_matches('_');

    match trimmed.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => trimmed.to_string(),
        Some(_) => format!("S_{}", trimmed),
        None => "S".to_string(),
    }
}
