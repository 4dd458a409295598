//! In-memory vault storage for tests and embedding.

use std::sync::{Arc, Mutex, MutexGuard};

use super::Storage;
use crate::error::{Result, VaultError};

/// Shared in-memory buffer. Clones see the same document.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    buffer: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last saved document, if any.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.buffer().clone()
    }

    fn buffer(&self) -> MutexGuard<'_, Option<Vec<u8>>> {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Vec<u8>> {
        self.buffer()
            .clone()
            .ok_or_else(|| VaultError::NotFound("memory".to_string()).into())
    }

    fn save(&self, bytes: &[u8]) -> Result<()> {
        *self.buffer() = Some(bytes.to_vec());
        Ok(())
    }

    fn exists(&self) -> bool {
        self.buffer().is_some()
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
