//! Secret operations.
//!
//! Writing only needs the vault public key; reading needs an unlocked vault.
//! Decrypted values are cached per session and zeroized on lock.

use std::collections::BTreeMap;

use tracing::{debug, trace};
use zeroize::Zeroizing;

use super::Vault;
use crate::core::crypto::encoding;
use crate::core::validation::validate_secret_name;
use crate::error::{Result, SecretError};

impl Vault {
    /// Store a secret, replacing any existing value.
    ///
    /// Works on a locked vault.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::InvalidName` if the name is not an identifier.
    pub fn put_secret(&mut self, name: &str, value: &[u8]) -> Result<()> {
        validate_secret_name(name)?;
        let sealed = self.public_key().seal(value, self.hash_length())?;

        self.document.secrets.insert(name.to_string(), sealed);
        if self.cache.contains_key(name) {
            self.cache
                .insert(name.to_string(), Zeroizing::new(value.to_vec()));
        }
        debug!(name, "stored secret");

        self.persist()
    }

    /// Decrypt a secret.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Locked` if the vault is locked and
    /// `SecretError::NotFound` if the name is absent.
    pub fn get_secret(&mut self, name: &str) -> Result<Zeroizing<Vec<u8>>> {
        let key = self.unlocked_key()?;
        let sealed = self
            .document
            .secrets
            .get(name)
            .ok_or_else(|| SecretError::NotFound(name.to_string()))?;

        if let Some(value) = self.cache.get(name) {
            trace!(name, "cache hit");
            return Ok(value.clone());
        }

        let value = key.open(sealed)?;
        self.cache.insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// Decrypt a secret as UTF-8 text.
    ///
    /// # Errors
    ///
    /// As [`Vault::get_secret`], plus `SecretError::NotUtf8`.
    pub fn get_secret_string(&mut self, name: &str) -> Result<Zeroizing<String>> {
        let bytes = self.get_secret(name)?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| SecretError::NotUtf8(name.to_string()))?;
        Ok(Zeroizing::new(text.to_string()))
    }

    /// Remove a secret. Returns whether it existed.
    pub fn delete_secret(&mut self, name: &str) -> Result<bool> {
        self.cache.remove(name);
        if self.document.secrets.remove(name).is_none() {
            return Ok(false);
        }
        debug!(name, "deleted secret");
        self.persist()?;
        Ok(true)
    }

    /// Sorted secret names.
    pub fn secret_names(&self) -> Vec<String> {
        self.document.secrets.keys().cloned().collect()
    }

    pub fn secret_exists(&self, name: &str) -> bool {
        self.document.secrets.contains_key(name)
    }

    /// Base58 rotation hash of a secret, if the vault records hashes.
    pub fn secret_hash(&self, name: &str) -> Option<String> {
        self.document
            .secrets
            .get(name)
            .and_then(|s| s.hash())
            .map(encoding::encode_plain)
    }

    /// Decrypt every secret.
    ///
    /// All or nothing: on the first failure nothing is returned or cached.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Locked` if the vault is locked, or the first
    /// decryption error.
    pub fn get_all_secrets(&mut self) -> Result<BTreeMap<String, Zeroizing<Vec<u8>>>> {
        let key = self.unlocked_key()?;

        let mut values = BTreeMap::new();
        for (name, sealed) in &self.document.secrets {
            let value = match self.cache.get(name) {
                Some(cached) => cached.clone(),
                None => key.open(sealed)?,
            };
            values.insert(name.clone(), value);
        }

        trace!(count = values.len(), "decrypted all secrets");
        self.cache = values.clone();
        Ok(values)
    }

    /// Decrypt every secret as text.
    ///
    /// # Errors
    ///
    /// As [`Vault::get_all_secrets`], plus `SecretError::NotUtf8` for the
    /// first value that is not text.
    pub fn get_all_secret_strings(&mut self) -> Result<BTreeMap<String, Zeroizing<String>>> {
        self.get_all_secrets()?
            .into_iter()
            .map(|(name, bytes)| match std::str::from_utf8(&bytes) {
                Ok(text) => Ok((name, Zeroizing::new(text.to_string()))),
                Err(_) => Err(SecretError::NotUtf8(name).into()),
            })
            .collect()
    }

    /// Store several secrets with a single write.
    ///
    /// Every name is validated before anything is sealed.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::InvalidName` for the first bad name; the vault is
    /// unchanged in that case.
    pub fn import_secrets<I, K, V>(&mut self, secrets: I) -> Result<usize>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<[u8]>,
    {
        let entries: Vec<(String, V)> = secrets.into_iter().map(|(k, v)| (k.into(), v)).collect();
        for (name, _) in &entries {
            validate_secret_name(name)?;
        }

        let hash_length = self.hash_length();
        let mut sealed = BTreeMap::new();
        for (name, value) in &entries {
            sealed.insert(
                name.clone(),
                self.public_key().seal(value.as_ref(), hash_length)?,
            );
        }

        let count = sealed.len();
        for (name, value) in &entries {
            if self.cache.contains_key(name) {
                self.cache
                    .insert(name.clone(), Zeroizing::new(value.as_ref().to_vec()));
            }
        }
        self.document.secrets.extend(sealed);
        debug!(count, "imported secrets");

        self.persist()?;
        Ok(count)
    }
}
