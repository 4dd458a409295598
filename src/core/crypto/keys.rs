//! Role-tagged X25519 key pairs and their tokens.
//!
//! A key token looks like `CELLAR_EPK_<body>` where the body is the base58check
//! encoding of `version ‖ flag ‖ role ‖ key`. The flag is `1` for public keys
//! and `0` for secret keys.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey as DalekPublic, StaticSecret};
use zeroize::Zeroizing;

use super::envelope::Encrypter;
use super::{encoding, split_tag, split_token, token_serde, KeyType};
use crate::core::constants::CRYPTO_VERSION;
use crate::error::{CipherError, Result};

/// Raw X25519 key length.
pub const KEY_SIZE: usize = 32;

const KEY_BYTES_LEN: usize = 3 + KEY_SIZE;
const PUBLIC_FLAG: u8 = 1;
const SECRET_FLAG: u8 = 0;
const PUBLIC_ABBREV: &str = "PK";
const SECRET_ABBREV: &str = "SK";

/// Generate a fresh key pair for `role`.
///
/// The public half is available through [`SecretKey::public_key`].
///
/// # Errors
///
/// Returns `CipherError::Entropy` if the system entropy source fails.
pub fn generate_key_pair(role: KeyType) -> Result<SecretKey> {
    let raw = Zeroizing::new(encoding::random_bytes::<KEY_SIZE>()?);
    Ok(SecretKey::from_raw(CRYPTO_VERSION, role, *raw))
}

/// Public half of a key pair.
///
/// Holds a lazily built encryption context, so repeated encryptions to the same
/// recipient reuse one key agreement.
#[derive(Clone)]
pub struct PublicKey {
    version: u8,
    key_type: KeyType,
    key: DalekPublic,
    encrypter: OnceLock<Encrypter>,
}

impl PublicKey {
    pub(crate) fn from_raw(version: u8, key_type: KeyType, raw: [u8; KEY_SIZE]) -> Self {
        Self {
            version,
            key_type,
            key: DalekPublic::from(raw),
            encrypter: OnceLock::new(),
        }
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    /// The raw 32-byte X25519 key, also used as the key identifier.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        self.key.as_bytes()
    }

    pub(crate) fn dalek(&self) -> &DalekPublic {
        &self.key
    }

    pub(crate) fn encrypter(&self) -> Result<&Encrypter> {
        if let Some(encrypter) = self.encrypter.get() {
            return Ok(encrypter);
        }
        let encrypter = Encrypter::new(self)?;
        Ok(self.encrypter.get_or_init(|| encrypter))
    }

    /// Token body bytes: `version ‖ 1 ‖ role ‖ key`.
    pub fn to_bytes(&self) -> Vec<u8> {
        key_bytes(self.version, PUBLIC_FLAG, self.key_type, self.as_bytes())
    }

    /// Short display identifier. Never used for access decisions.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.to_bytes());
        encoding::encode_plain(&digest[..8])
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.key_type == other.key_type
            && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for PublicKey {}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.version.hash(state);
        self.key_type.hash(state);
        self.as_bytes().hash(state);
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("key_type", &self.key_type)
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            format_key_token(self.key_type, PUBLIC_ABBREV, &self.to_bytes())
        )
    }
}

impl FromStr for PublicKey {
    type Err = crate::error::Error;

    fn from_str(token: &str) -> Result<Self> {
        let (version, key_type, raw) = parse_key_token(token, PUBLIC_ABBREV, PUBLIC_FLAG)?;
        Ok(Self::from_raw(version, key_type, *raw))
    }
}

token_serde!(PublicKey);

/// Secret half of a key pair. Key material is zeroized on drop.
///
/// Deliberately not `Serialize`; use [`SecretKey::to_token`] explicitly.
#[derive(Clone)]
pub struct SecretKey {
    version: u8,
    key_type: KeyType,
    secret: StaticSecret,
    public: PublicKey,
}

impl SecretKey {
    fn from_raw(version: u8, key_type: KeyType, raw: [u8; KEY_SIZE]) -> Self {
        let secret = StaticSecret::from(raw);
        let public = PublicKey::from_raw(
            version,
            key_type,
            DalekPublic::from(&secret).to_bytes(),
        );
        Self {
            version,
            key_type,
            secret,
            public,
        }
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub(crate) fn diffie_hellman(&self, peer: &DalekPublic) -> x25519_dalek::SharedSecret {
        self.secret.diffie_hellman(peer)
    }

    /// Serialized form: `version ‖ 0 ‖ role ‖ key`.
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        let raw = Zeroizing::new(self.secret.to_bytes());
        Zeroizing::new(key_bytes(self.version, SECRET_FLAG, self.key_type, &raw))
    }

    /// # Errors
    ///
    /// Returns `CipherError::InvalidFormat` if the bytes are not a secret key.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (version, key_type, raw) = parse_key_bytes(bytes, SECRET_FLAG)?;
        Ok(Self::from_raw(version, key_type, *raw))
    }

    /// The `CELLAR_<role>SK_...` token.
    pub fn to_token(&self) -> Zeroizing<String> {
        Zeroizing::new(format_key_token(
            self.key_type,
            SECRET_ABBREV,
            &self.to_bytes(),
        ))
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.public == other.public
    }
}

impl Eq for SecretKey {}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("key_type", &self.key_type)
            .field("public", &self.public.fingerprint())
            .finish_non_exhaustive()
    }
}

impl FromStr for SecretKey {
    type Err = crate::error::Error;

    fn from_str(token: &str) -> Result<Self> {
        let (version, key_type, raw) = parse_key_token(token, SECRET_ABBREV, SECRET_FLAG)?;
        Ok(Self::from_raw(version, key_type, *raw))
    }
}

fn key_bytes(version: u8, flag: u8, key_type: KeyType, raw: &[u8; KEY_SIZE]) -> Vec<u8> {
    let mut out = Vec::with_capacity(KEY_BYTES_LEN);
    out.push(version);
    out.push(flag);
    out.push(key_type.as_byte());
    out.extend_from_slice(raw);
    out
}

fn format_key_token(key_type: KeyType, abbrev: &str, bytes: &[u8]) -> String {
    format!(
        "{}_{}{}_{}",
        crate::core::constants::APP_PREFIX,
        key_type.as_char(),
        abbrev,
        encoding::encode(bytes)
    )
}

fn parse_key_bytes(bytes: &[u8], flag: u8) -> Result<(u8, KeyType, Zeroizing<[u8; KEY_SIZE]>)> {
    if bytes.len() != KEY_BYTES_LEN {
        return Err(CipherError::format(format!(
            "key must be {} bytes, got {}",
            KEY_BYTES_LEN,
            bytes.len()
        ))
        .into());
    }

    let version = bytes[0];
    if version == 0 {
        return Err(CipherError::format("key version 0").into());
    }
    if version > CRYPTO_VERSION {
        return Err(CipherError::UnsupportedVersion(version).into());
    }
    if bytes[1] != flag {
        let expected = if flag == PUBLIC_FLAG { "public" } else { "secret" };
        return Err(CipherError::format(format!("not a {} key", expected)).into());
    }
    let key_type = KeyType::from_byte(bytes[2])?;

    let mut raw = Zeroizing::new([0u8; KEY_SIZE]);
    raw.copy_from_slice(&bytes[3..]);
    Ok((version, key_type, raw))
}

fn parse_key_token(
    token: &str,
    abbrev: &str,
    flag: u8,
) -> Result<(u8, KeyType, Zeroizing<[u8; KEY_SIZE]>)> {
    let (tag, body) = split_token(token, "key")?;
    let (role, tag_abbrev) = split_tag(tag, "key")?;
    if tag_abbrev != abbrev || body.len() != 1 {
        return Err(CipherError::format(format!("expected a {} token", abbrev)).into());
    }

    let bytes = Zeroizing::new(encoding::decode(body[0])?);
    let (version, key_type, raw) = parse_key_bytes(&bytes, flag)?;
    if key_type != role {
        return Err(CipherError::format("key role does not match its token prefix").into());
    }
    Ok((version, key_type, raw))
}
