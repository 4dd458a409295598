//! Core library components.
//!
//! Key primitives, the envelope cipher, the vault with its access ledger and
//! secret store, and the identity providers that produce secret keys.

pub mod config;
pub mod constants;
pub mod crypto;
pub mod environment;
pub mod provider;
pub mod store;
pub mod validation;
pub mod vault;
