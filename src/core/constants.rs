//! Constants used throughout cellar.
//!
//! Centralizes magic strings and configuration values.

/// Prefix of every textual token (keys, wrapped keys, sealed secrets, references).
pub const APP_PREFIX: &str = "CELLAR";

/// Current key and ciphertext format version.
pub const CRYPTO_VERSION: u8 = 1;

/// Upper bound for the rotation-detection hash length in bytes.
pub const HASH_MAX_LENGTH: u8 = 4;

/// Attempts allowed when picking a random secret name during referencing.
pub const MAX_REFERENCE_ATTEMPTS: u32 = 10;

/// Random bytes behind an auto-generated secret name.
pub const RANDOM_NAME_BYTES: usize = 8;

/// Random bytes behind a vault id.
pub const VAULT_ID_BYTES: usize = 20;

/// Replacement for string leaves when referencing in preview mode.
pub const PREVIEW_PLACEHOLDER: &str = "CELLAR_SECRET_PREVIEW";

/// Project settings file name (.cellar.toml).
pub const SETTINGS_FILE: &str = ".cellar.toml";

/// Global settings location relative to HOME (~/.cellar/config.toml).
pub const GLOBAL_SETTINGS_FILE: &str = ".cellar/config.toml";

/// Environment variable holding a raw secret key token.
pub const ENV_SECRET_KEY: &str = "CELLAR_SECRET_KEY";

/// Environment variable holding an environment binding string.
pub const ENV_BINDING: &str = "CELLAR_ENV_BINDING";

/// Environment variable holding the password for the password provider.
pub const ENV_PASSWORD: &str = "CELLAR_PASSWORD";

/// Environment variable controlling log output.
pub const ENV_LOG: &str = "CELLAR_LOG";
