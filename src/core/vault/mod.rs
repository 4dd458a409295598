//! The primary interface for cellar operations.
//!
//! A `Vault` owns its document, an optional storage backend, and the
//! transient unlock state. Mutations validate and compute the complete new
//! state first, apply it, then rewrite the whole document.

mod access;
mod document;
mod reference;
mod secrets;
mod shared;

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::core::constants::{HASH_MAX_LENGTH, VAULT_ID_BYTES};
use crate::core::crypto::{encoding, generate_key_pair, KeyType, PublicKey, SecretKey};
use crate::core::store::{FileStorage, Storage};
use crate::error::{Result, VaultError};

pub use document::{VaultConfig, VaultDocument};
pub use reference::{contains_reference, DocumentFormat, Naming, ReferenceOptions};
pub use shared::SharedVault;

/// Vault key and the identity that recovered it.
struct Unlocked {
    key: SecretKey,
    by: PublicKey,
}

/// An encrypted, multi-recipient secrets vault.
pub struct Vault {
    document: VaultDocument,
    storage: Option<Box<dyn Storage>>,
    unlocked: Option<Unlocked>,
    cache: BTreeMap<String, Zeroizing<Vec<u8>>>,
}

impl fmt::Debug for Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vault")
            .field("id", &self.id())
            .field("storage", &self.storage.as_ref().map(|s| s.location()))
            .field("accessors", &self.document.config.wrapped_keys.len())
            .field("secrets", &self.document.secrets.len())
            .field("locked", &self.is_locked())
            .finish()
    }
}

impl Vault {
    /// Create a detached, in-memory vault shared with `recipients`.
    ///
    /// `hash_length` is capped at 4. The new vault starts locked.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::ShareWithVault` if a recipient has the vault role.
    pub fn new(hash_length: u8, recipients: &[PublicKey]) -> Result<Self> {
        if recipients.iter().any(|r| r.key_type() == KeyType::Vault) {
            return Err(VaultError::ShareWithVault.into());
        }

        let key = generate_key_pair(KeyType::Vault)?;
        let mut seen = HashSet::new();
        let wrapped_keys = recipients
            .iter()
            .filter(|r| seen.insert(*r))
            .map(|r| r.wrap_key(&key))
            .collect::<Result<Vec<_>>>()?;

        if wrapped_keys.is_empty() {
            warn!("creating a vault nobody can unlock");
        }

        let id = encoding::encode_plain(&encoding::random_bytes::<VAULT_ID_BYTES>()?);
        debug!(%id, recipients = wrapped_keys.len(), hash_length, "created vault");

        Ok(Self::from_document(VaultDocument {
            config: VaultConfig {
                id: Some(id),
                public_key: key.public_key().clone(),
                hash_length: hash_length.min(HASH_MAX_LENGTH),
                wrapped_keys,
            },
            secrets: BTreeMap::new(),
        }))
    }

    /// Create a vault file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::AlreadyExists` if the file exists.
    pub fn create(path: &Path, hash_length: u8, recipients: &[PublicKey]) -> Result<Self> {
        let storage = FileStorage::new(path);
        if storage.exists() {
            return Err(VaultError::AlreadyExists(path.display().to_string()).into());
        }
        let mut vault = Self::new(hash_length, recipients)?;
        vault.storage = Some(Box::new(storage));
        vault.persist()?;
        Ok(vault)
    }

    /// Open the vault file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::NotFound` if the file does not exist, and a
    /// format error if it is not a valid vault document.
    pub fn open(path: &Path) -> Result<Self> {
        Self::load(Box::new(FileStorage::new(path)))
    }

    /// Load a vault from a storage backend and keep writing back to it.
    pub fn load(storage: Box<dyn Storage>) -> Result<Self> {
        let bytes = storage.load()?;
        let mut vault = Self::from_bytes(&bytes)?;
        debug!(location = %storage.location(), id = %vault.id(), "loaded vault");
        vault.storage = Some(storage);
        Ok(vault)
    }

    /// Parse a detached vault from document bytes. The vault starts locked.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_document(VaultDocument::from_slice(bytes)?))
    }

    /// Serialize the document.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.document.to_yaml()?.into_bytes())
    }

    /// Attach a storage backend. Subsequent mutations persist to it.
    pub fn with_storage(mut self, storage: Box<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    fn from_document(document: VaultDocument) -> Self {
        Self {
            document,
            storage: None,
            unlocked: None,
            cache: BTreeMap::new(),
        }
    }

    /// Stable identifier used in reference tokens.
    pub fn id(&self) -> String {
        self.document.config.vault_id()
    }

    /// Key that secrets are sealed under.
    pub fn public_key(&self) -> &PublicKey {
        &self.document.config.public_key
    }

    pub fn hash_length(&self) -> u8 {
        self.document.config.hash_length
    }

    pub fn document(&self) -> &VaultDocument {
        &self.document
    }

    /// Rewrite the whole document to storage. Detached vaults skip this.
    fn persist(&self) -> Result<()> {
        if let Some(storage) = &self.storage {
            storage.save(&self.to_bytes()?)?;
        }
        Ok(())
    }

    fn unlocked_key(&self) -> Result<&SecretKey> {
        self.unlocked
            .as_ref()
            .map(|u| &u.key)
            .ok_or_else(|| VaultError::Locked.into())
    }
}
