//! Command helper methods for Test.

use std::process::Output;

use assert_cmd::Command;
use cellar::core::crypto::SecretKey;

use super::Test;

impl Test {
    /// Create a cellar command with an isolated environment.
    ///
    /// HOME and the working directory point into the test dirs, the vault
    /// path is fixed and colors are off. No secret key is set.
    pub fn bare_cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("cellar").expect("failed to find cellar binary");
        cmd.env("HOME", self.home.path());
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("NO_COLOR", "1");
        cmd.env("CELLAR_VAULT", self.vault_path());
        cmd.env_remove("CELLAR_SECRET_KEY");
        cmd.env_remove("CELLAR_ENV_BINDING");
        cmd.env_remove("CELLAR_PASSWORD");
        cmd.env_remove("CELLAR_LOG");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// A cellar command that unlocks as the owner.
    pub fn cmd(&self) -> Command {
        self.cmd_as(&self.owner)
    }

    /// A cellar command that unlocks as `key`.
    pub fn cmd_as(&self, key: &SecretKey) -> Command {
        let mut cmd = self.bare_cmd();
        cmd.env("CELLAR_SECRET_KEY", key.to_token().as_str());
        cmd
    }

    /// Shortcut for `cellar new`, shared with the owner and `extra`.
    pub fn new_vault(&self, extra: &[&SecretKey]) -> Output {
        let mut cmd = self.cmd();
        cmd.args(["new", "--share", self.owner.public_key().to_string().as_str()]);
        for key in extra {
            cmd.args(["--share", key.public_key().to_string().as_str()]);
        }
        cmd.output().expect("failed to run cellar new")
    }

    /// Shortcut for `cellar put`.
    pub fn put(&self, key: &str, val: &str) -> Output {
        self.bare_cmd()
            .args(["put", key, val])
            .output()
            .expect("failed to run cellar put")
    }

    /// Shortcut for `cellar get`.
    pub fn get(&self, key: &str) -> Output {
        self.cmd()
            .args(["get", key])
            .output()
            .expect("failed to run cellar get")
    }

    /// Shortcut for `cellar rm`.
    pub fn rm(&self, key: &str) -> Output {
        self.bare_cmd()
            .args(["rm", key])
            .output()
            .expect("failed to run cellar rm")
    }

    /// Shortcut for `cellar list`.
    pub fn list(&self) -> Output {
        self.bare_cmd()
            .arg("list")
            .output()
            .expect("failed to run cellar list")
    }

    /// Shortcut for `cellar list --json`.
    pub fn list_json(&self) -> Output {
        self.bare_cmd()
            .args(["list", "--json"])
            .output()
            .expect("failed to run cellar list --json")
    }

    /// Shortcut for `cellar share`.
    pub fn share(&self, key: &SecretKey) -> Output {
        self.cmd()
            .args(["share", key.public_key().to_string().as_str()])
            .output()
            .expect("failed to run cellar share")
    }

    /// Shortcut for `cellar revoke`.
    pub fn revoke(&self, key: &SecretKey) -> Output {
        self.cmd()
            .args(["revoke", key.public_key().to_string().as_str()])
            .output()
            .expect("failed to run cellar revoke")
    }

    /// Shortcut for `cellar ref`.
    pub fn reference(&self, file: &str, extra: &[&str]) -> Output {
        self.bare_cmd()
            .arg("ref")
            .arg(file)
            .args(extra)
            .output()
            .expect("failed to run cellar ref")
    }

    /// Shortcut for `cellar deref`.
    pub fn dereference(&self, file: &str, extra: &[&str]) -> Output {
        self.cmd()
            .arg("deref")
            .arg(file)
            .args(extra)
            .output()
            .expect("failed to run cellar deref")
    }

    /// Shortcut for `cellar export --format <format>`.
    pub fn export(&self, format: &str) -> Output {
        self.cmd()
            .args(["export", "--format", format])
            .output()
            .expect("failed to run cellar export")
    }

    /// Shortcut for `cellar run -- <command>`.
    pub fn run(&self, command: &[&str]) -> Output {
        self.cmd()
            .args(["run", "--"])
            .args(command)
            .output()
            .expect("failed to run cellar run")
    }
}
