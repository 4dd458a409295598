//! Key generation command.

use crate::cli::{output, Role};
use crate::core::crypto::{generate_key_pair, KeyType};
use crate::error::Result;

/// Generate a key pair and print both tokens.
pub fn keygen(role: Role) -> Result<()> {
    let key_type = match role {
        Role::Environment => KeyType::Environment,
        Role::Root => KeyType::Root,
    };
    let secret = generate_key_pair(key_type)?;

    output::header(&format!("{} key pair", key_type));
    output::kv("public:", secret.public_key());
    output::kv("secret:", secret.to_token().as_str());
    output::kv("fingerprint:", secret.public_key().fingerprint());
    output::dimmed("keep the secret key out of version control; export it as CELLAR_SECRET_KEY");
    Ok(())
}
