//! Identity providers.
//!
//! A provider binds an environment's secret key to something the environment
//! holds (a password, a cloud KMS key) and recovers it later. Providers are
//! registered on an explicit [`ProviderRegistry`]; there is no global state.
//!
//! ## Adding a New Provider
//!
//! 1. Implement the `Provider` trait
//! 2. Add the implementation in a new file (e.g., `kms.rs`)
//! 3. Register it in `ProviderRegistry::with_defaults`

mod password;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::constants::APP_PREFIX;
use crate::core::crypto::{encoding, generate_key_pair, KeyType, SecretKey};
use crate::core::environment::{EnvKind, Environment};
use crate::error::{ProviderError, Result};

pub use password::{PasswordProvider, PASSWORD_INPUT, PASSWORD_PROVIDER};

/// Named provider inputs, such as `password`.
pub type Inputs = BTreeMap<String, Zeroizing<Vec<u8>>>;

const BINDING_ABBREV: &str = "EB";

/// Capability interface every identity provider implements.
pub trait Provider: Send + Sync {
    /// Registry name, stored in bindings.
    fn name(&self) -> &str;

    /// Protect `key` and return an opaque reference to store in the binding.
    fn bind(&self, key: &SecretKey, inputs: &Inputs) -> Result<Vec<u8>>;

    /// Recover the secret key from a reference produced by [`Provider::bind`].
    fn unbind(&self, reference: &[u8], inputs: &Inputs) -> Result<SecretKey>;
}

/// Fetch a required input.
pub(crate) fn input<'a>(inputs: &'a Inputs, name: &'static str) -> Result<&'a [u8]> {
    inputs
        .get(name)
        .map(|v| v.as_slice())
        .ok_or_else(|| ProviderError::MissingInput(name).into())
}

#[derive(Serialize, Deserialize)]
struct Binding {
    #[serde(rename = "p")]
    provider: String,
    #[serde(rename = "r")]
    reference: String,
}

/// Encode a binding string: `CELLAR_EB_<base58(json)>`.
pub fn encode_binding(provider: &str, reference: &[u8]) -> Result<String> {
    let binding = Binding {
        provider: provider.to_string(),
        reference: encoding::encode_plain(reference),
    };
    let json = serde_json::to_vec(&binding)?;
    Ok(format!(
        "{}_{}_{}",
        APP_PREFIX,
        BINDING_ABBREV,
        encoding::encode(&json)
    ))
}

/// Decode a binding string into its provider name and reference.
///
/// # Errors
///
/// Returns `ProviderError::InvalidBinding` for anything malformed.
pub fn decode_binding(binding: &str) -> Result<(String, Vec<u8>)> {
    let invalid = |reason: &str| ProviderError::InvalidBinding(reason.to_string());

    let parts: Vec<&str> = binding.trim().split('_').collect();
    if parts.len() != 3 || parts[0] != APP_PREFIX || parts[1] != BINDING_ABBREV {
        return Err(invalid("expected CELLAR_EB_<data>").into());
    }
    let json = encoding::decode(parts[2]).map_err(|_| invalid("bad base58"))?;
    let decoded: Binding = serde_json::from_slice(&json).map_err(|_| invalid("bad payload"))?;
    let reference = bs58::decode(&decoded.reference)
        .into_vec()
        .map_err(|_| invalid("bad reference"))?;
    Ok((decoded.provider, reference))
}

/// Registered providers, keyed by name.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Box<dyn Provider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in providers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.providers.insert(
            PASSWORD_PROVIDER.to_string(),
            Box::new(PasswordProvider::new()),
        );
        registry
    }

    /// # Errors
    ///
    /// Returns `ProviderError::AlreadyRegistered` if the name is taken.
    pub fn register(&mut self, provider: Box<dyn Provider>) -> Result<()> {
        let name = provider.name().to_string();
        if self.providers.contains_key(&name) {
            return Err(ProviderError::AlreadyRegistered(name).into());
        }
        debug!(provider = %name, "registered provider");
        self.providers.insert(name, provider);
        Ok(())
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    fn get(&self, name: &str) -> Result<&dyn Provider> {
        self.providers
            .get(name)
            .map(|p| &**p)
            .ok_or_else(|| ProviderError::Unknown(name.to_string()).into())
    }

    /// Create an environment whose fresh secret key is bound through `provider`.
    pub fn new_environment(
        &self,
        provider: &str,
        name: &str,
        kind: EnvKind,
        inputs: &Inputs,
    ) -> Result<Environment> {
        let provider = self.get(provider)?;
        let key = generate_key_pair(KeyType::Environment)?;
        let reference = provider.bind(&key, inputs)?;

        let mut environment = Environment::new(name, kind, key.public_key().clone())?;
        environment.binding = Some(encode_binding(provider.name(), &reference)?);
        debug!(
            provider = provider.name(),
            environment = name,
            key = %key.public_key().fingerprint(),
            "bound environment"
        );
        Ok(environment)
    }

    /// Recover the secret key behind a binding string.
    pub fn unbind(&self, binding: &str, inputs: &Inputs) -> Result<SecretKey> {
        let (provider, reference) = decode_binding(binding)?;
        self.get(&provider)?.unbind(&reference, inputs)
    }

    /// Recover an environment's secret key.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::InvalidBinding` if the environment has no
    /// binding, and `ProviderError::Failed` if the recovered key does not
    /// belong to the environment.
    pub fn secret_key(&self, environment: &Environment, inputs: &Inputs) -> Result<SecretKey> {
        let binding = environment
            .binding
            .as_deref()
            .ok_or_else(|| ProviderError::InvalidBinding("environment has no binding".into()))?;
        let key = self.unbind(binding, inputs)?;
        if key.public_key() != &environment.public_key {
            return Err(
                ProviderError::Failed("recovered key does not match the environment".into())
                    .into(),
            );
        }
        Ok(key)
    }
}
