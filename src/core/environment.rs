//! Environments: named identities that can be granted vault access.

use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::constants::ENV_SECRET_KEY;
use crate::core::crypto::{KeyType, PublicKey, SecretKey};
use crate::error::{CipherError, Result};

/// Who an environment stands for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvKind {
    /// A machine identity (CI job, deployed service).
    Service,
    /// A person.
    #[default]
    User,
}

impl fmt::Display for EnvKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvKind::Service => f.write_str("service"),
            EnvKind::User => f.write_str("user"),
        }
    }
}

impl FromStr for EnvKind {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "service" => Ok(EnvKind::Service),
            "user" => Ok(EnvKind::User),
            other => Err(CipherError::format(format!("unknown environment kind: {}", other)).into()),
        }
    }
}

/// A named identity and its public key.
///
/// `binding` is an opaque provider string; only the provider registry reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub kind: EnvKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub public_key: PublicKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
}

impl Environment {
    /// # Errors
    ///
    /// Returns `CipherError::InvalidFormat` if `public_key` has the vault role.
    pub fn new(name: impl Into<String>, kind: EnvKind, public_key: PublicKey) -> Result<Self> {
        if public_key.key_type() == KeyType::Vault {
            return Err(CipherError::format("an environment cannot use a vault key").into());
        }
        Ok(Self {
            name: name.into(),
            email: None,
            kind,
            tags: Vec::new(),
            public_key,
            binding: None,
        })
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn add_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
    }

    /// Environments are identified by their public key token.
    pub fn id(&self) -> String {
        self.public_key.to_string()
    }

    /// Case-insensitive search over name, email, kind and tags.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        let hit = |field: &str| field.to_lowercase().contains(&query);

        hit(&self.name)
            || self.email.as_deref().is_some_and(hit)
            || hit(&self.kind.to_string())
            || self.tags.iter().any(|t| hit(t))
    }
}

/// Read a raw secret key token from `CELLAR_SECRET_KEY`.
///
/// Returns `Ok(None)` when the variable is unset or empty.
///
/// # Errors
///
/// Returns a format error if the variable holds something other than a secret key.
pub fn secret_key_from_env() -> Result<Option<SecretKey>> {
    match env::var(ENV_SECRET_KEY) {
        Ok(token) if !token.trim().is_empty() => Ok(Some(token.trim().parse()?)),
        _ => Ok(None),
    }
}
