//! Hybrid envelope encryption.
//!
//! Each recipient handle derives one symmetric key from an ephemeral X25519
//! agreement and reuses it; every message gets a fresh nonce. The ciphertext
//! layout is `ephemeral public (32) ‖ nonce (12) ‖ ChaCha20-Poly1305 output`.

use std::fmt;
use std::str::FromStr;

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use sha2::{Digest, Sha256};
use tracing::trace;
use x25519_dalek::{PublicKey as DalekPublic, StaticSecret};
use zeroize::Zeroizing;

use super::keys::KEY_SIZE;
use super::{compression, encoding, hash, split_tag, split_token, token_serde, KeyType};
use super::{PublicKey, SecretKey};
use crate::core::constants::{APP_PREFIX, CRYPTO_VERSION};
use crate::error::{CipherError, Result};

const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;
const HEADER_SIZE: usize = 2 + KEY_SIZE;
const KDF_DOMAIN: &[u8] = b"CELLAR_ENVELOPE_V1";

const WRAPPED_KEY_ABBREV: &str = "WK";
const SEALED_SECRET_ABBREV: &str = "SS";

/// Encryption context cached on a [`PublicKey`].
#[derive(Clone)]
pub(crate) struct Encrypter {
    ephemeral: [u8; KEY_SIZE],
    aead: ChaCha20Poly1305,
}

impl Encrypter {
    pub(crate) fn new(recipient: &PublicKey) -> Result<Self> {
        let secret = StaticSecret::from(*Zeroizing::new(encoding::random_bytes::<KEY_SIZE>()?));
        let ephemeral = DalekPublic::from(&secret);
        let shared = secret.diffie_hellman(recipient.dalek());
        if !shared.was_contributory() {
            return Err(CipherError::EncryptionFailed("low order recipient key".into()).into());
        }

        let key = derive_key(shared.as_bytes(), ephemeral.as_bytes(), recipient.as_bytes());
        trace!(recipient = %recipient.fingerprint(), "derived envelope key");
        Ok(Self {
            ephemeral: ephemeral.to_bytes(),
            aead: ChaCha20Poly1305::new(Key::from_slice(key.as_slice())),
        })
    }
}

fn derive_key(
    shared: &[u8; KEY_SIZE],
    ephemeral: &[u8; KEY_SIZE],
    recipient: &[u8; KEY_SIZE],
) -> Zeroizing<[u8; 32]> {
    let mut hasher = Sha256::new();
    hasher.update(KDF_DOMAIN);
    hasher.update(shared);
    hasher.update(ephemeral);
    hasher.update(recipient);
    Zeroizing::new(hasher.finalize().into())
}

/// A self-describing ciphertext addressed to one public key.
#[derive(Clone, PartialEq, Eq)]
pub struct Ciphered {
    version: u8,
    key_type: KeyType,
    key_id: [u8; KEY_SIZE],
    ciphertext: Vec<u8>,
}

impl Ciphered {
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Role of the public key this was encrypted to.
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Raw public key this was encrypted to.
    pub fn key_id(&self) -> &[u8; KEY_SIZE] {
        &self.key_id
    }

    /// Whether `key` is the recipient, judged by identifier alone.
    pub fn is_for(&self, key: &PublicKey) -> bool {
        self.key_type == key.key_type() && &self.key_id == key.as_bytes()
    }

    /// Rebuild the recipient public key from the identifier.
    pub fn recipient(&self) -> PublicKey {
        PublicKey::from_raw(self.version, self.key_type, self.key_id)
    }

    /// `version ‖ role ‖ key id ‖ ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.ciphertext.len());
        out.push(self.version);
        out.push(self.key_type.as_byte());
        out.extend_from_slice(&self.key_id);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// # Errors
    ///
    /// Returns `CipherError::InvalidFormat` for truncated input or an unknown
    /// role, and `CipherError::UnsupportedVersion` for a newer version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE + KEY_SIZE + NONCE_SIZE + TAG_SIZE {
            return Err(CipherError::format("ciphertext is truncated").into());
        }
        let version = bytes[0];
        if version == 0 {
            return Err(CipherError::format("ciphertext version 0").into());
        }
        if version > CRYPTO_VERSION {
            return Err(CipherError::UnsupportedVersion(version).into());
        }
        let key_type = KeyType::from_byte(bytes[1])?;
        let mut key_id = [0u8; KEY_SIZE];
        key_id.copy_from_slice(&bytes[2..HEADER_SIZE]);

        Ok(Self {
            version,
            key_type,
            key_id,
            ciphertext: bytes[HEADER_SIZE..].to_vec(),
        })
    }
}

impl fmt::Debug for Ciphered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ciphered")
            .field("version", &self.version)
            .field("key_type", &self.key_type)
            .field("recipient", &self.recipient().fingerprint())
            .field("len", &self.ciphertext.len())
            .finish()
    }
}

impl PublicKey {
    /// Encrypt `plaintext` to this key.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::Entropy` or `CipherError::EncryptionFailed`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Ciphered> {
        let encrypter = self.encrypter()?;
        let nonce = encoding::random_bytes::<NONCE_SIZE>()?;
        let packed = Zeroizing::new(compression::compress(plaintext)?);
        let sealed = encrypter
            .aead
            .encrypt(Nonce::from_slice(&nonce), packed.as_slice())
            .map_err(|e| CipherError::EncryptionFailed(e.to_string()))?;

        let mut ciphertext = Vec::with_capacity(KEY_SIZE + NONCE_SIZE + sealed.len());
        ciphertext.extend_from_slice(&encrypter.ephemeral);
        ciphertext.extend_from_slice(&nonce);
        ciphertext.extend_from_slice(&sealed);

        trace!(
            plaintext_len = plaintext.len(),
            ciphertext_len = ciphertext.len(),
            "encrypted"
        );

        Ok(Ciphered {
            version: CRYPTO_VERSION,
            key_type: self.key_type(),
            key_id: *self.as_bytes(),
            ciphertext,
        })
    }

    /// Wrap a secret key for this recipient.
    pub fn wrap_key(&self, key: &SecretKey) -> Result<WrappedKey> {
        Ok(WrappedKey {
            ciphered: self.encrypt(&key.to_bytes())?,
        })
    }

    /// Seal a value, attaching a rotation hash of `hash_length` bytes (0 for none).
    pub fn seal(&self, value: &[u8], hash_length: u8) -> Result<SealedSecret> {
        let digest = hash::hash(value, hash_length)?;
        Ok(SealedSecret {
            ciphered: self.encrypt(value)?,
            hash: if digest.is_empty() { None } else { Some(digest) },
        })
    }
}

impl SecretKey {
    /// Decrypt a ciphertext addressed to this key.
    ///
    /// # Errors
    ///
    /// - `CipherError::KeyMismatch` if the ciphertext names another key
    /// - `CipherError::UnsupportedVersion` for a newer format
    /// - `CipherError::DecryptionFailed` if authentication fails
    pub fn decrypt(&self, ciphered: &Ciphered) -> Result<Zeroizing<Vec<u8>>> {
        if !ciphered.is_for(self.public_key()) {
            return Err(CipherError::KeyMismatch.into());
        }
        if ciphered.version > CRYPTO_VERSION {
            return Err(CipherError::UnsupportedVersion(ciphered.version).into());
        }
        if ciphered.ciphertext.len() < KEY_SIZE + NONCE_SIZE + TAG_SIZE {
            return Err(CipherError::DecryptionFailed.into());
        }

        let (ephemeral, rest) = ciphered.ciphertext.split_at(KEY_SIZE);
        let (nonce, sealed) = rest.split_at(NONCE_SIZE);
        let mut ephemeral_raw = [0u8; KEY_SIZE];
        ephemeral_raw.copy_from_slice(ephemeral);

        let shared = self.diffie_hellman(&DalekPublic::from(ephemeral_raw));
        if !shared.was_contributory() {
            return Err(CipherError::DecryptionFailed.into());
        }
        let key = derive_key(
            shared.as_bytes(),
            &ephemeral_raw,
            self.public_key().as_bytes(),
        );

        let packed = Zeroizing::new(
            ChaCha20Poly1305::new(Key::from_slice(key.as_slice()))
                .decrypt(Nonce::from_slice(nonce), sealed)
                .map_err(|_| CipherError::DecryptionFailed)?,
        );
        let plaintext = Zeroizing::new(compression::decompress(&packed)?);

        trace!(plaintext_len = plaintext.len(), "decrypted");
        Ok(plaintext)
    }

    /// Recover a secret key wrapped for this key.
    pub fn unwrap_key(&self, wrapped: &WrappedKey) -> Result<SecretKey> {
        let bytes = self.decrypt(&wrapped.ciphered)?;
        SecretKey::from_bytes(&bytes).map_err(|_| CipherError::DecryptionFailed.into())
    }

    /// Open a sealed secret.
    pub fn open(&self, sealed: &SealedSecret) -> Result<Zeroizing<Vec<u8>>> {
        self.decrypt(&sealed.ciphered)
    }
}

/// A secret key encrypted to one recipient.
#[derive(Clone, PartialEq, Eq)]
pub struct WrappedKey {
    ciphered: Ciphered,
}

impl WrappedKey {
    pub fn ciphered(&self) -> &Ciphered {
        &self.ciphered
    }

    pub fn is_for(&self, key: &PublicKey) -> bool {
        self.ciphered.is_for(key)
    }

    pub fn recipient(&self) -> PublicKey {
        self.ciphered.recipient()
    }
}

impl fmt::Debug for WrappedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WrappedKey").field(&self.ciphered).finish()
    }
}

impl fmt::Display for WrappedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}{}_{}",
            APP_PREFIX,
            self.ciphered.key_type.as_char(),
            WRAPPED_KEY_ABBREV,
            encoding::encode(&self.ciphered.to_bytes())
        )
    }
}

impl FromStr for WrappedKey {
    type Err = crate::error::Error;

    fn from_str(token: &str) -> Result<Self> {
        let (tag, body) = split_token(token, "wrapped key")?;
        let (role, abbrev) = split_tag(tag, "wrapped key")?;
        if abbrev != WRAPPED_KEY_ABBREV || body.len() != 1 {
            return Err(CipherError::format("expected a wrapped key token").into());
        }
        let ciphered = Ciphered::from_bytes(&encoding::decode(body[0])?)?;
        if ciphered.key_type != role {
            return Err(CipherError::format("wrapped key role does not match its prefix").into());
        }
        Ok(Self { ciphered })
    }
}

token_serde!(WrappedKey);

/// An encrypted value with an optional short rotation hash.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedSecret {
    ciphered: Ciphered,
    hash: Option<Vec<u8>>,
}

impl SealedSecret {
    pub fn ciphered(&self) -> &Ciphered {
        &self.ciphered
    }

    pub fn hash(&self) -> Option<&[u8]> {
        self.hash.as_deref()
    }
}

impl fmt::Debug for SealedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedSecret")
            .field("ciphered", &self.ciphered)
            .field("hash", &self.hash.as_deref().map(encoding::encode_plain))
            .finish()
    }
}

impl fmt::Display for SealedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}{}_",
            APP_PREFIX,
            self.ciphered.key_type.as_char(),
            SEALED_SECRET_ABBREV
        )?;
        if let Some(hash) = &self.hash {
            write!(f, "{}_", encoding::encode(hash))?;
        }
        f.write_str(&encoding::encode(&self.ciphered.to_bytes()))
    }
}

impl FromStr for SealedSecret {
    type Err = crate::error::Error;

    fn from_str(token: &str) -> Result<Self> {
        let (tag, body) = split_token(token, "sealed secret")?;
        let (role, abbrev) = split_tag(tag, "sealed secret")?;
        if abbrev != SEALED_SECRET_ABBREV {
            return Err(CipherError::format("expected a sealed secret token").into());
        }

        let (hash, payload) = match body.as_slice() {
            [payload] => (None, *payload),
            [hash, payload] => {
                let hash = encoding::decode(hash)?;
                if hash.len() > usize::from(crate::core::constants::HASH_MAX_LENGTH) {
                    return Err(CipherError::format("sealed secret hash is too long").into());
                }
                (Some(hash), *payload)
            }
            _ => return Err(CipherError::format("sealed secret has too many segments").into()),
        };

        let ciphered = Ciphered::from_bytes(&encoding::decode(payload)?)?;
        if ciphered.key_type != role {
            return Err(CipherError::format("sealed secret role does not match its prefix").into());
        }
        Ok(Self { ciphered, hash })
    }
}

token_serde!(SealedSecret);
