//! Vault lifecycle and access commands (new, share, revoke, access).

use crate::cli::{display, output, Context};
use crate::core::constants::SETTINGS_FILE;
use crate::core::crypto::PublicKey;
use crate::core::vault::Vault;
use crate::error::Result;

fn parse_keys(tokens: &[String]) -> Result<Vec<PublicKey>> {
    tokens.iter().map(|t| t.parse()).collect()
}

/// Create a new vault file, optionally recording it as the project default.
pub fn new(
    ctx: &Context,
    hash_length: Option<u8>,
    share: &[String],
    make_default: bool,
) -> Result<()> {
    let path = ctx.vault_path()?;
    let recipients = parse_keys(share)?;
    let hash_length = hash_length.unwrap_or(ctx.settings.cellar.hash_length);

    let vault = Vault::create(&path, hash_length, &recipients)?;

    output::success(&format!("created {}", display(&path)));
    output::kv("id:", vault.id());
    output::kv("accessors:", vault.accessors().len());
    if vault.accessors().is_empty() {
        output::warn("nobody can unlock this vault; pass --share <PUBLIC_KEY>");
    }

    if make_default {
        let mut settings = ctx.settings.clone();
        settings.cellar.vault = Some(path);
        let file = std::env::current_dir()?.join(SETTINGS_FILE);
        settings.save(&file)?;
        output::kv("default in:", display(&file));
    }
    Ok(())
}

/// Grant a public key access.
pub fn share(ctx: &Context, token: &str) -> Result<()> {
    let recipient: PublicKey = token.parse()?;
    let mut vault = ctx.unlock()?;

    if vault.share(&recipient)? {
        output::success(&format!("shared with {}", output::key(&recipient.fingerprint())));
    } else {
        output::dimmed("already shared");
    }
    Ok(())
}

/// Revoke public keys and rotate the vault key.
pub fn revoke(ctx: &Context, tokens: &[String]) -> Result<()> {
    let revoked = parse_keys(tokens)?;
    let mut vault = ctx.unlock()?;

    if vault.revoke(&revoked)? {
        output::success("revoked access and rotated the vault key");
        output::kv("accessors:", vault.accessors().len());
    } else {
        output::dimmed("none of those keys had access");
    }
    Ok(())
}

/// List identities with access.
pub fn access(ctx: &Context) -> Result<()> {
    let vault = ctx.open()?;
    let accessors = vault.accessors();

    output::section(&format!("{} accessors", accessors.len()));
    for accessor in accessors {
        output::list_item(&format!(
            "{} ({}, {})",
            accessor,
            accessor.key_type(),
            accessor.fingerprint()
        ));
    }
    Ok(())
}
