//! Persisted vault document.
//!
//! ```yaml
//! config:
//!   id: <base58>
//!   publicKey: CELLAR_VPK_...
//!   hashLength: 0
//!   wrappedKeys: [CELLAR_EWK_...]
//! secrets:
//!   NAME: CELLAR_VSS_...
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::constants::HASH_MAX_LENGTH;
use crate::core::crypto::{encoding, KeyType, PublicKey, SealedSecret, WrappedKey};
use crate::core::validation::validate_secret_name;
use crate::error::{CipherError, Result};

/// Vault configuration: identity, sealing key, and access ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub public_key: PublicKey,
    #[serde(default)]
    pub hash_length: u8,
    #[serde(default)]
    pub wrapped_keys: Vec<WrappedKey>,
}

impl VaultConfig {
    /// Stable id used in reference tokens.
    ///
    /// Documents written without an id fall back to the public key's token body.
    pub fn vault_id(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => encoding::encode(&self.public_key.to_bytes()),
        }
    }
}

/// The full persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultDocument {
    pub config: VaultConfig,
    #[serde(default)]
    pub secrets: BTreeMap<String, SealedSecret>,
}

impl VaultDocument {
    /// Parse and validate a YAML (or JSON) document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Yaml` for malformed YAML or tokens, and
    /// `CipherError::InvalidFormat` / `SecretError::InvalidName` for a
    /// document that parses but breaks the vault's invariants.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let document: VaultDocument = serde_yaml::from_slice(bytes)?;
        document.validate()?;
        Ok(document)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    fn validate(&self) -> Result<()> {
        let config = &self.config;
        if config.public_key.key_type() != KeyType::Vault {
            return Err(CipherError::format("vault public key must have the vault role").into());
        }
        if config.hash_length > HASH_MAX_LENGTH {
            return Err(CipherError::format(format!(
                "hash length {} exceeds {}",
                config.hash_length, HASH_MAX_LENGTH
            ))
            .into());
        }
        if let Some(id) = &config.id {
            if id.is_empty() || bs58::decode(id).into_vec().is_err() {
                return Err(CipherError::format("vault id must be base58").into());
            }
        }

        for (i, wrapped) in config.wrapped_keys.iter().enumerate() {
            if config.wrapped_keys[..i]
                .iter()
                .any(|earlier| earlier.recipient() == wrapped.recipient())
            {
                return Err(CipherError::format("duplicate wrapped key recipient").into());
            }
        }

        for (name, sealed) in &self.secrets {
            validate_secret_name(name)?;
            if !sealed.ciphered().is_for(&config.public_key) {
                return Err(CipherError::format(format!(
                    "secret '{}' is not sealed for this vault",
                    name
                ))
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crypto::generate_key_pair;

    fn document() -> (VaultDocument, crate::core::crypto::SecretKey) {
        let vault = generate_key_pair(KeyType::Vault).unwrap();
        let owner = generate_key_pair(KeyType::Environment).unwrap();
        let mut secrets = BTreeMap::new();
        secrets.insert(
            "DB_PASS".to_string(),
            vault.public_key().seal(b"s3cr3t", 0).unwrap(),
        );
        let document = VaultDocument {
            config: VaultConfig {
                id: Some("3yZe7d".to_string()),
                public_key: vault.public_key().clone(),
                hash_length: 0,
                wrapped_keys: vec![owner.public_key().wrap_key(&vault).unwrap()],
            },
            secrets,
        };
        (document, vault)
    }

    #[test]
    fn test_yaml_layout() {
        let (document, _) = document();
        let yaml = document.to_yaml().unwrap();
        assert!(yaml.contains("publicKey: CELLAR_VPK_"));
        assert!(yaml.contains("hashLength: 0"));
        assert!(yaml.contains("- CELLAR_EWK_"));
        assert!(yaml.contains("DB_PASS: CELLAR_VSS_"));
    }

    #[test]
    fn test_reload_is_identical() {
        let (document, vault) = document();
        let reloaded = VaultDocument::from_slice(document.to_yaml().unwrap().as_bytes()).unwrap();
        assert_eq!(reloaded, document);
        assert_eq!(
            vault.open(&reloaded.secrets["DB_PASS"]).unwrap().as_slice(),
            b"s3cr3t"
        );
    }

    #[test]
    fn test_missing_id_falls_back_to_public_key() {
        let (mut document, _) = document();
        document.config.id = None;
        let yaml = document.to_yaml().unwrap();
        assert!(!yaml.contains("id:"));

        let reloaded = VaultDocument::from_slice(yaml.as_bytes()).unwrap();
        let token = reloaded.config.public_key.to_string();
        assert!(token.ends_with(&reloaded.config.vault_id()));
    }

    #[test]
    fn test_rejects_invalid_documents() {
        assert!(VaultDocument::from_slice(b"not: [valid").is_err());
        assert!(VaultDocument::from_slice(b"config: {}").is_err());

        let (mut document, _) = document();
        document.config.hash_length = 9;
        let err = VaultDocument::from_slice(document.to_yaml().unwrap().as_bytes()).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_rejects_bad_secret_name() {
        let (document, _) = document();
        let yaml = document.to_yaml().unwrap().replace("DB_PASS:", "_bad:");
        let err = VaultDocument::from_slice(yaml.as_bytes()).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_rejects_corrupt_token() {
        let (document, _) = document();
        let yaml = document.to_yaml().unwrap().replace("CELLAR_VSS_", "CELLAR_VSS_0");
        let err = VaultDocument::from_slice(yaml.as_bytes()).unwrap_err();
        assert!(err.is_format());
    }
}
