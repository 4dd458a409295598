//! Test support utilities for cellar integration tests.
//!
//! Provides reusable test environment setup and helper commands.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;

#[allow(unused_imports)]
pub use assertions::*;

use std::path::PathBuf;

use cellar::core::crypto::{generate_key_pair, KeyType, SecretKey};
use tempfile::TempDir;

/// Test environment with isolated temp directories and an owner identity.
///
/// Child processes get HOME, the vault path and the secret key through
/// their own environment, so tests can run in parallel.
pub struct Test {
    /// Temporary directory for the test project
    pub dir: TempDir,
    /// Temporary home directory
    pub home: TempDir,
    /// Identity used by commands that unlock the vault
    pub owner: SecretKey,
}

impl Test {
    /// Create a new environment without a vault.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");
        let owner = generate_key_pair(KeyType::Environment).expect("failed to generate key");

        Self { dir, home, owner }
    }

    /// Create an environment with a vault shared with the owner.
    pub fn init() -> Self {
        let t = Self::new();
        let output = t.new_vault(&[]);
        assert_success(&output);
        t
    }

    /// Create an environment with a vault holding `secrets`.
    pub fn with_secrets(secrets: &[(&str, &str)]) -> Self {
        let t = Self::init();
        for (k, v) in secrets {
            let output = t.put(k, v);
            assert!(
                output.status.success(),
                "Failed to put secret {}: {}",
                k,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        t
    }

    pub fn vault_path(&self) -> PathBuf {
        self.dir.path().join("vault.yaml")
    }

    /// Write a file into the project directory and return its path.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("failed to write file");
        path
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("failed to read file")
    }
}
