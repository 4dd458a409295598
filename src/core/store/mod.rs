//! Vault document storage.
//!
//! A vault persists by rewriting its whole document through a [`Storage`]
//! backend. Backends only move bytes; they know nothing about the format.
//!
//! ## Adding a New Storage Backend
//!
//! 1. Implement the `Storage` trait
//! 2. Add the implementation in a new file (e.g., `s3.rs`)
//! 3. Re-export from this module

use crate::error::Result;

mod fs;
mod memory;

pub use fs::FileStorage;
pub use memory::MemoryStorage;

/// Byte-level persistence for one vault document.
pub trait Storage: Send {
    /// Read the full document.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::NotFound` if nothing has been saved yet.
    fn load(&self) -> Result<Vec<u8>>;

    /// Replace the full document.
    fn save(&self, bytes: &[u8]) -> Result<()>;

    /// Whether a document has been saved.
    fn exists(&self) -> bool;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}
