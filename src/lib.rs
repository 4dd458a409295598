//! Cellar - local-first encrypted secrets vaults.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── keys          # Key pair generation
//! │   ├── vault         # new, share, revoke, access
//! │   ├── secrets       # put, get, rm, list, export
//! │   ├── run           # Run a command with secrets in its environment
//! │   ├── reference     # ref/deref of YAML and JSON files
//! │   ├── env           # Provider-bound environments
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── config        # .cellar.toml settings
//!     ├── crypto/       # Keys, tokens, envelope cipher, hashing
//!     ├── environment   # Named identities
//!     ├── provider/     # Secret key bindings (password)
//!     ├── store/        # Persistence backends
//!     │   ├── fs        # Atomic file storage
//!     │   └── memory    # In-memory storage
//!     └── vault/        # Vault document, access ledger, secrets, references
//! ```
//!
//! # Features
//!
//! - X25519 + ChaCha20-Poly1305 envelopes addressed to a per-vault key
//! - Access granted by wrapping the vault key for each accessor
//! - Revocation rotates the vault key and reseals every secret
//! - Writing secrets needs no secret key at all
//! - References let config files be committed without their values

pub mod cli;
pub mod core;
pub mod error;
