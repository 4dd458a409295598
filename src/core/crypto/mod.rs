//! Cryptographic primitives.
//!
//! Role-tagged X25519 key pairs, a hybrid envelope (ephemeral X25519 +
//! ChaCha20-Poly1305) and the textual tokens both travel as.

pub mod compression;
pub mod encoding;
pub mod envelope;
pub mod hash;
pub mod keys;

use std::fmt;

use crate::error::{CipherError, Result};

pub use envelope::{Ciphered, SealedSecret, WrappedKey};
pub use keys::{generate_key_pair, PublicKey, SecretKey};

/// Role of a key pair. The byte doubles as the role character in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyType {
    /// A named identity that can be granted access.
    Environment,
    /// The key pair a vault seals its secrets under.
    Vault,
    /// An administrative identity.
    Root,
}

impl KeyType {
    pub fn as_byte(self) -> u8 {
        match self {
            KeyType::Environment => b'E',
            KeyType::Vault => b'V',
            KeyType::Root => b'R',
        }
    }

    pub fn as_char(self) -> char {
        char::from(self.as_byte())
    }

    /// # Errors
    ///
    /// Returns `CipherError::InvalidFormat` for an unknown role byte.
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            b'E' => Ok(KeyType::Environment),
            b'V' => Ok(KeyType::Vault),
            b'R' => Ok(KeyType::Root),
            other => Err(CipherError::format(format!("unknown key type: {:#04x}", other)).into()),
        }
    }

    pub(crate) fn from_char(c: char) -> Result<Self> {
        u8::try_from(c)
            .map_err(|_| CipherError::format(format!("unknown key type: {}", c)).into())
            .and_then(Self::from_byte)
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyType::Environment => "environment",
            KeyType::Vault => "vault",
            KeyType::Root => "root",
        };
        f.write_str(name)
    }
}

/// Serialize a type through its `Display` token and parse it back with `FromStr`.
macro_rules! token_serde {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                let token = <String as serde::Deserialize>::deserialize(deserializer)?;
                token.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use token_serde;

/// Split `CELLAR_<tag>_<body>[_<body>]` into its tag and body segments.
pub(crate) fn split_token<'a>(token: &'a str, kind: &str) -> Result<(&'a str, Vec<&'a str>)> {
    let mut parts = token.trim().split('_');
    let prefix = parts.next().unwrap_or_default();
    if prefix != crate::core::constants::APP_PREFIX {
        return Err(CipherError::format(format!("{} has wrong prefix", kind)).into());
    }
    let tag = parts
        .next()
        .ok_or_else(|| CipherError::format(format!("{} is missing its tag", kind)))?;
    let body: Vec<&str> = parts.collect();
    if body.is_empty() {
        return Err(CipherError::format(format!("{} is missing its body", kind)).into());
    }
    Ok((tag, body))
}

/// Parse a tag such as `EPK` into its role and abbreviation.
pub(crate) fn split_tag<'a>(tag: &'a str, kind: &str) -> Result<(KeyType, &'a str)> {
    let mut chars = tag.chars();
    let role = chars
        .next()
        .ok_or_else(|| CipherError::format(format!("{} has an empty tag", kind)))?;
    Ok((KeyType::from_char(role)?, chars.as_str()))
}
