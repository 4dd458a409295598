//! Access control.
//!
//! The ledger is the list of wrapped copies of the vault secret key, one per
//! recipient. Unlocking recovers the vault key from the matching entry;
//! revoking rotates the vault key so revoked identities keep nothing usable.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::{Unlocked, Vault, VaultConfig, VaultDocument};
use crate::core::crypto::{generate_key_pair, KeyType, PublicKey, SecretKey};
use crate::error::{CipherError, Result, VaultError};

impl Vault {
    /// Unlock the vault with an accessor's secret key.
    ///
    /// A no-op if the same identity already unlocked it. Only the ledger entry
    /// addressed to `key` is decrypted.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::NotAccessible` if no entry is addressed to `key`.
    /// The lock state is unchanged on failure.
    pub fn unlock(&mut self, key: &SecretKey) -> Result<()> {
        let identity = key.public_key();
        if self.unlocked_by() == Some(identity) {
            return Ok(());
        }

        let wrapped = self
            .document
            .config
            .wrapped_keys
            .iter()
            .find(|w| w.is_for(identity))
            .ok_or(VaultError::NotAccessible)?;

        let vault_key = key.unwrap_key(wrapped)?;
        if vault_key.public_key() != self.public_key() {
            return Err(CipherError::DecryptionFailed.into());
        }

        debug!(id = %self.id(), by = %identity.fingerprint(), "unlocked vault");
        self.unlocked = Some(Unlocked {
            key: vault_key,
            by: identity.clone(),
        });
        Ok(())
    }

    /// Forget the vault key and every decrypted value.
    pub fn lock(&mut self) {
        if self.unlocked.take().is_some() {
            debug!(id = %self.id(), "locked vault");
        }
        self.cache.clear();
    }

    pub fn is_locked(&self) -> bool {
        self.unlocked.is_none()
    }

    /// Public key of the identity that unlocked the current session.
    pub fn unlocked_by(&self) -> Option<&PublicKey> {
        self.unlocked.as_ref().map(|u| &u.by)
    }

    /// Identities that can unlock the vault.
    pub fn accessors(&self) -> Vec<PublicKey> {
        self.document
            .config
            .wrapped_keys
            .iter()
            .map(|w| w.recipient())
            .collect()
    }

    pub fn has_access(&self, key: &PublicKey) -> bool {
        self.document
            .config
            .wrapped_keys
            .iter()
            .any(|w| w.is_for(key))
    }

    /// Grant `recipient` access.
    ///
    /// Returns `false` if the recipient already has access.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Locked` if the vault is locked and
    /// `VaultError::ShareWithVault` for a vault-role recipient.
    pub fn share(&mut self, recipient: &PublicKey) -> Result<bool> {
        let vault_key = self.unlocked_key()?;
        if recipient.key_type() == KeyType::Vault {
            return Err(VaultError::ShareWithVault.into());
        }
        if self.has_access(recipient) {
            debug!(recipient = %recipient.fingerprint(), "already shared");
            return Ok(false);
        }

        let wrapped = recipient.wrap_key(vault_key)?;
        self.document.config.wrapped_keys.push(wrapped);
        debug!(recipient = %recipient.fingerprint(), "shared vault");

        self.persist()?;
        Ok(true)
    }

    /// Remove access for `revoked` and rotate the vault key.
    ///
    /// Every secret is resealed under a fresh vault key wrapped for the
    /// remaining accessors only, so keys recovered before the revocation no
    /// longer open anything. If the current session's identity is revoked the
    /// vault ends up locked.
    ///
    /// Returns `false` without rotating if none of `revoked` had access.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Locked` if the vault is locked.
    pub fn revoke(&mut self, revoked: &[PublicKey]) -> Result<bool> {
        let by = match &self.unlocked {
            Some(unlocked) => unlocked.by.clone(),
            None => return Err(VaultError::Locked.into()),
        };

        let accessors = self.accessors();
        let remaining: Vec<PublicKey> = accessors
            .iter()
            .filter(|a| !revoked.contains(a))
            .cloned()
            .collect();
        if remaining.len() == accessors.len() {
            debug!("nothing to revoke");
            return Ok(false);
        }

        let plaintexts = self.get_all_secrets()?;
        let rotated = generate_key_pair(KeyType::Vault)?;
        let hash_length = self.hash_length();

        let wrapped_keys = remaining
            .iter()
            .map(|r| r.wrap_key(&rotated))
            .collect::<Result<Vec<_>>>()?;
        let secrets = plaintexts
            .iter()
            .map(|(name, value)| Ok((name.clone(), rotated.public_key().seal(value, hash_length)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        if remaining.is_empty() {
            warn!("revoked every accessor, nobody can unlock this vault");
        }
        debug!(
            revoked = accessors.len() - remaining.len(),
            remaining = remaining.len(),
            secrets = secrets.len(),
            "rotated vault key"
        );

        self.document = VaultDocument {
            config: VaultConfig {
                id: Some(self.id()),
                public_key: rotated.public_key().clone(),
                hash_length,
                wrapped_keys,
            },
            secrets,
        };

        if revoked.contains(&by) {
            self.lock();
        } else {
            self.unlocked = Some(Unlocked { key: rotated, by });
            self.cache = plaintexts;
        }

        self.persist()?;
        Ok(true)
    }
}
