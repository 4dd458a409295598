//! Password provider.
//!
//! Encrypts the environment's secret key with an age passphrase (scrypt).

use std::io::{Read, Write};
use std::iter;

use age::secrecy::SecretString;
use tracing::trace;
use zeroize::Zeroizing;

use super::{input, Inputs, Provider};
use crate::core::crypto::SecretKey;
use crate::error::{ProviderError, Result};

/// Name the password provider registers under.
pub const PASSWORD_PROVIDER: &str = "password";

/// Input holding the password.
pub const PASSWORD_INPUT: &str = "password";

/// Binds secret keys to a password.
#[derive(Debug, Clone, Default)]
pub struct PasswordProvider {
    work_factor: Option<u8>,
}

impl PasswordProvider {
    /// Uses age's default scrypt work factor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the scrypt work factor (log2 of N). Low values are for tests.
    pub fn with_work_factor(work_factor: u8) -> Self {
        Self {
            work_factor: Some(work_factor),
        }
    }
}

fn passphrase(inputs: &Inputs) -> Result<SecretString> {
    let raw = input(inputs, PASSWORD_INPUT)?;
    let text = std::str::from_utf8(raw)
        .map_err(|_| ProviderError::Failed("password is not valid UTF-8".into()))?;
    if text.is_empty() {
        return Err(ProviderError::MissingInput(PASSWORD_INPUT).into());
    }
    Ok(SecretString::from(text.to_string()))
}

impl Provider for PasswordProvider {
    fn name(&self) -> &str {
        PASSWORD_PROVIDER
    }

    fn bind(&self, key: &SecretKey, inputs: &Inputs) -> Result<Vec<u8>> {
        let mut recipient = age::scrypt::Recipient::new(passphrase(inputs)?);
        if let Some(work_factor) = self.work_factor {
            recipient.set_work_factor(work_factor);
        }

        let encryptor = age::Encryptor::with_recipients(iter::once(&recipient as &dyn age::Recipient))
            .map_err(|e| ProviderError::Failed(format!("{}", e)))?;

        let mut encrypted = Vec::new();
        let mut writer = encryptor
            .wrap_output(&mut encrypted)
            .map_err(|e| ProviderError::Failed(format!("{}", e)))?;
        writer.write_all(&key.to_bytes())?;
        writer
            .finish()
            .map_err(|e| ProviderError::Failed(format!("{}", e)))?;

        trace!(reference_len = encrypted.len(), "bound key to password");
        Ok(encrypted)
    }

    fn unbind(&self, reference: &[u8], inputs: &Inputs) -> Result<SecretKey> {
        let identity = age::scrypt::Identity::new(passphrase(inputs)?);

        let decryptor = age::Decryptor::new(reference)
            .map_err(|e| ProviderError::Failed(format!("{}", e)))?;
        let mut reader = decryptor
            .decrypt(iter::once(&identity as &dyn age::Identity))
            .map_err(|_| ProviderError::Failed("wrong password or corrupt binding".into()))?;

        let mut bytes = Zeroizing::new(Vec::new());
        reader.read_to_end(&mut bytes)?;

        trace!("unbound key from password");
        SecretKey::from_bytes(&bytes)
    }
}
