//! Secret management commands (put, get, rm, list, export).

use std::collections::BTreeMap;

use zeroize::Zeroizing;

use crate::cli::{output, Context, ExportFormat};
use crate::error::{Result, SecretError};

/// Store a secret. Needs no secret key.
pub fn put(ctx: &Context, name: &str, value: &str) -> Result<()> {
    let mut vault = ctx.open()?;
    vault.put_secret(name, value.as_bytes())?;
    output::success(&format!("stored {}", output::key(name)));
    Ok(())
}

/// Print a secret value.
pub fn get(ctx: &Context, name: &str) -> Result<()> {
    let mut vault = ctx.unlock()?;
    let value = vault.get_secret_string(name)?;
    output::data(&value);
    Ok(())
}

/// Delete a secret.
pub fn rm(ctx: &Context, name: &str) -> Result<()> {
    let mut vault = ctx.open()?;
    if !vault.delete_secret(name)? {
        return Err(SecretError::NotFound(name.to_string()).into());
    }
    output::success(&format!("removed {}", output::key(name)));
    Ok(())
}

/// List secret names, with rotation hashes when the vault records them.
pub fn list(ctx: &Context, json: bool) -> Result<()> {
    let vault = ctx.open()?;
    let names = vault.secret_names();

    if json {
        let secrets: Vec<_> = names
            .iter()
            .map(|name| {
                serde_json::json!({
                    "name": name,
                    "hash": vault.secret_hash(name),
                })
            })
            .collect();
        let report = serde_json::json!({
            "secrets": secrets,
            "count": names.len()
        });
        output::data(&serde_json::to_string_pretty(&report)?);
    } else if names.is_empty() {
        output::dimmed("no secrets stored");
    } else {
        output::header(&format!("{} secrets", names.len()));
        for name in &names {
            match vault.secret_hash(name) {
                Some(hash) => output::list_item(&format!("{} ({})", name, hash)),
                None => output::list_item(name),
            }
        }
    }
    Ok(())
}

/// Print every secret in one go.
pub fn export(ctx: &Context, format: ExportFormat) -> Result<()> {
    let mut vault = ctx.unlock()?;
    let secrets = vault.get_all_secret_strings()?;
    let rendered = render_export(&secrets, format)?;
    output::data(rendered.trim_end());
    Ok(())
}

fn render_export(
    secrets: &BTreeMap<String, Zeroizing<String>>,
    format: ExportFormat,
) -> Result<Zeroizing<String>> {
    let plain: BTreeMap<&str, &str> = secrets
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    let text = match format {
        ExportFormat::Env => secrets
            .iter()
            .map(|(name, value)| {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                format!("{}=\"{}\"\n", name, escaped)
            })
            .collect(),
        ExportFormat::Json => serde_json::to_string_pretty(&plain)?,
        ExportFormat::Yaml => serde_yaml::to_string(&plain)?,
    };
    Ok(Zeroizing::new(text))
}
