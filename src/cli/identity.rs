//! Secret key resolution for commands that unlock a vault.
//!
//! Order: a raw `CELLAR_SECRET_KEY` token, then an environment binding from
//! `CELLAR_ENV_BINDING` unlocked through the provider registry.

use std::env;

use dialoguer::Password;
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::constants::{ENV_BINDING, ENV_PASSWORD};
use crate::core::crypto::SecretKey;
use crate::core::environment::secret_key_from_env;
use crate::core::provider::{Inputs, ProviderRegistry, PASSWORD_INPUT};
use crate::error::{ConfigError, Result};

/// Find the caller's secret key.
///
/// # Errors
///
/// Returns `ConfigError::MissingSecretKey` if neither variable is set.
pub fn resolve_secret_key(registry: &ProviderRegistry) -> Result<SecretKey> {
    if let Some(key) = secret_key_from_env()? {
        debug!(key = %key.public_key().fingerprint(), "using secret key from environment");
        return Ok(key);
    }

    let binding = match env::var(ENV_BINDING) {
        Ok(binding) if !binding.trim().is_empty() => binding,
        _ => return Err(ConfigError::MissingSecretKey.into()),
    };

    let key = registry.unbind(&binding, &password_inputs()?)?;
    debug!(key = %key.public_key().fingerprint(), "using secret key from binding");
    Ok(key)
}

/// Password from `CELLAR_PASSWORD`, or an interactive prompt.
pub fn password_inputs() -> Result<Inputs> {
    let password = match env::var(ENV_PASSWORD) {
        Ok(password) => Zeroizing::new(password),
        Err(_) => Zeroizing::new(
            Password::new()
                .with_prompt("Password")
                .interact()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?,
        ),
    };

    let mut inputs = Inputs::new();
    inputs.insert(
        PASSWORD_INPUT.to_string(),
        Zeroizing::new(password.as_bytes().to_vec()),
    );
    Ok(inputs)
}
