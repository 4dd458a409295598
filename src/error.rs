//! Error types.
//!
//! Errors are grouped by concern so callers can tell corrupt data apart from a
//! wrong key, a locked vault, or a naming conflict.

use thiserror::Error;

/// Top-level error for every cellar operation.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Malformed tokens, documents, or identifiers.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            Error::Cipher(CipherError::InvalidFormat(_))
                | Error::Cipher(CipherError::UnsupportedVersion(_))
                | Error::Secret(SecretError::InvalidName(_))
                | Error::Reference(ReferenceError::Document(_))
                | Error::Yaml(_)
                | Error::Json(_)
        )
    }

    /// A key does not fit the data, or authentication failed.
    pub fn is_crypto(&self) -> bool {
        matches!(
            self,
            Error::Cipher(CipherError::DecryptionFailed)
                | Error::Cipher(CipherError::KeyMismatch)
                | Error::Vault(VaultError::NotAccessible)
        )
    }

    /// The caller may retry with `force` or a different name.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Error::Reference(ReferenceError::Conflict(_))
                | Error::Reference(ReferenceError::MaxAttempts(_))
        )
    }

    /// The operation needs an unlocked vault.
    pub fn is_locked(&self) -> bool {
        matches!(self, Error::Vault(VaultError::Locked))
    }
}

/// Key, envelope, and token errors.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("unsupported cryptography version: {0}")]
    UnsupportedVersion(u8),

    #[error("given secret key cannot decrypt the data")]
    KeyMismatch,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("entropy source failure: {0}")]
    Entropy(String),

    #[error("hashing failed: {0}")]
    Hash(String),
}

impl CipherError {
    pub(crate) fn format(reason: impl Into<String>) -> Self {
        CipherError::InvalidFormat(reason.into())
    }
}

/// Vault lifecycle and access-control errors.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("the vault is currently locked")]
    Locked,

    #[error("vault is not accessible using the given secret key")]
    NotAccessible,

    #[error("vault cannot be shared with another vault")]
    ShareWithVault,

    #[error("vault exists already: {0}")]
    AlreadyExists(String),

    #[error("vault not found: {0}")]
    NotFound(String),
}

/// Secret store errors.
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("invalid secret name '{0}': must start with a letter, contain only letters, digits and underscores, and not end with an underscore")]
    InvalidName(String),

    #[error("secret not found: {0}")]
    NotFound(String),

    #[error("secret '{0}' is not valid UTF-8")]
    NotUtf8(String),
}

/// Reference engine errors.
#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("secret exists already: {0} (use force to overwrite)")]
    Conflict(String),

    #[error("could not find an unused secret name after {0} attempts")]
    MaxAttempts(u32),

    #[error("unsupported document: {0}")]
    Document(String),
}

/// Identity provider errors.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    Unknown(String),

    #[error("provider registered already: {0}")]
    AlreadyRegistered(String),

    #[error("missing provider input: {0}")]
    MissingInput(&'static str),

    #[error("invalid environment binding: {0}")]
    InvalidBinding(String),

    #[error("provider failed: {0}")]
    Failed(String),
}

/// Settings errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("no secret key available: set CELLAR_SECRET_KEY or CELLAR_ENV_BINDING")]
    MissingSecretKey,

    #[error("no vault given and no default vault configured")]
    NoVault,

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
