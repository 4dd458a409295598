//! Thread-safe vault handle.

use std::sync::{Arc, Mutex};

use super::Vault;

/// A vault behind a coarse mutex.
///
/// Each [`SharedVault::with`] call holds the lock for the whole operation, so
/// a revoke's rotation never interleaves with other work.
#[derive(Debug, Clone)]
pub struct SharedVault {
    inner: Arc<Mutex<Vault>>,
}

impl SharedVault {
    pub fn new(vault: Vault) -> Self {
        Self {
            inner: Arc::new(Mutex::new(vault)),
        }
    }

    /// Run `f` with exclusive access to the vault.
    pub fn with<T>(&self, f: impl FnOnce(&mut Vault) -> T) -> T {
        // Operations apply their state in one step, so a poisoned lock still
        // guards a consistent vault.
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// Take the vault back if this is the last handle.
    pub fn into_inner(self) -> Option<Vault> {
        Arc::try_unwrap(self.inner)
            .ok()
            .map(|m| m.into_inner().unwrap_or_else(|e| e.into_inner()))
    }
}

impl From<Vault> for SharedVault {
    fn from(vault: Vault) -> Self {
        Self::new(vault)
    }
}
