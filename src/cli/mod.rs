//! Command-line interface.

pub mod completions;
pub mod env;
pub mod identity;
pub mod keys;
pub mod output;
pub mod reference;
pub mod run;
pub mod secrets;
pub mod vault;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::core::config::Settings;
use crate::core::provider::ProviderRegistry;
use crate::core::vault::Vault;
use crate::error::Result;

/// Cellar - local-first encrypted secrets vaults.
#[derive(Parser)]
#[command(
    name = "cellar",
    about = "Local-first encrypted secrets vaults",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Vault file (defaults to the one in .cellar.toml)
    #[arg(long, global = true, env = "CELLAR_VAULT")]
    pub vault: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Generate a key pair
    Keygen {
        /// Role of the key pair
        #[arg(long, value_enum, default_value = "environment")]
        role: Role,
    },

    /// Create a new vault
    New {
        /// Rotation hash length in bytes (0-4)
        #[arg(long)]
        hash_length: Option<u8>,
        /// Public key to share the vault with (repeatable)
        #[arg(long = "share", value_name = "PUBLIC_KEY")]
        share: Vec<String>,
        /// Record the vault as the default in ./.cellar.toml
        #[arg(long = "default")]
        make_default: bool,
    },

    /// Store a secret
    Put {
        /// Secret name (e.g., DB_PASS)
        name: String,
        /// Secret value
        value: String,
    },

    /// Print a secret
    Get {
        /// Secret name
        name: String,
    },

    /// Delete a secret
    Rm {
        /// Secret name
        name: String,
    },

    /// List secret names
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print every secret at once
    Export {
        /// Output format
        #[arg(long, value_enum, default_value = "env")]
        format: ExportFormat,
    },

    /// Run a command with the secrets as environment variables
    Run {
        /// Command and arguments
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },

    /// Grant a public key access
    Share {
        /// Public key token
        public_key: String,
    },

    /// Revoke access and rotate the vault key
    Revoke {
        /// Public key tokens
        #[arg(required = true)]
        public_keys: Vec<String>,
    },

    /// List identities with access
    Access,

    /// Move a file's values into the vault, leaving references behind
    Ref {
        /// YAML or JSON file
        file: PathBuf,
        /// Name secrets with this prefix plus the value's path
        #[arg(long, conflicts_with = "random")]
        prefix: Option<String>,
        /// Give secrets random names
        #[arg(long)]
        random: bool,
        /// Overwrite existing secrets
        #[arg(long)]
        force: bool,
        /// Print the result without changing anything
        #[arg(long)]
        preview: bool,
        /// Write JSON (default: by file extension)
        #[arg(long)]
        json: bool,
    },

    /// Replace references in files with secret values
    Deref {
        /// Files or directories containing references
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Print the result without writing the file
        #[arg(long)]
        preview: bool,
    },

    /// Manage environments
    Env {
        #[command(subcommand)]
        action: EnvAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Key pair roles a user may generate.
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum Role {
    Environment,
    Root,
}

/// Formats accepted by `export`.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    /// `NAME="value"` lines
    Env,
    Json,
    Yaml,
}

/// Environment subcommands.
#[derive(Subcommand)]
pub enum EnvAction {
    /// Create a password-bound environment
    New {
        /// Environment name
        name: String,
        /// Contact email
        #[arg(long)]
        email: Option<String>,
        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Mark as a service (machine) identity
        #[arg(long)]
        service: bool,
        /// Also write the environment to this file
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Show environments saved with `env new --out`
    List {
        /// Environment files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Only show environments whose name, email, type or tags match
        #[arg(long, short)]
        query: Option<String>,
    },
}

/// Execute a command.
pub fn execute(command: Command, vault_path: Option<PathBuf>) -> Result<()> {
    use Command::*;

    let ctx = Context::new(vault_path)?;
    match command {
        Keygen { role } => keys::keygen(role),
        New {
            hash_length,
            share,
            make_default,
        } => vault::new(&ctx, hash_length, &share, make_default),
        Put { name, value } => secrets::put(&ctx, &name, &value),
        Get { name } => secrets::get(&ctx, &name),
        Rm { name } => secrets::rm(&ctx, &name),
        List { json } => secrets::list(&ctx, json),
        Export { format } => secrets::export(&ctx, format),
        Run { command } => run::execute(&ctx, &command),
        Share { public_key } => vault::share(&ctx, &public_key),
        Revoke { public_keys } => vault::revoke(&ctx, &public_keys),
        Access => vault::access(&ctx),
        Ref {
            file,
            prefix,
            random,
            force,
            preview,
            json,
        } => reference::reference(&ctx, &file, prefix, random, force, preview, json),
        Deref { paths, preview } => reference::dereference(&ctx, &paths, preview),
        Env { action } => match action {
            EnvAction::New {
                name,
                email,
                tags,
                service,
                out,
            } => env::new(&ctx, &name, email, tags, service, out.as_deref()),
            EnvAction::List { files, query } => env::list(&files, query.as_deref()),
        },
        Completions { shell } => completions::execute(shell),
    }
}

/// Settings, providers and the selected vault path for one invocation.
pub struct Context {
    pub settings: Settings,
    pub registry: ProviderRegistry,
    vault: Option<PathBuf>,
}

impl Context {
    fn new(vault: Option<PathBuf>) -> Result<Self> {
        Ok(Self {
            settings: Settings::load()?,
            registry: ProviderRegistry::with_defaults(),
            vault,
        })
    }

    /// The vault file this invocation works on.
    pub fn vault_path(&self) -> Result<PathBuf> {
        self.settings.vault_path(self.vault.as_deref())
    }

    /// Open the vault, locked.
    pub fn open(&self) -> Result<Vault> {
        Vault::open(&self.vault_path()?)
    }

    /// Open the vault and unlock it with the caller's secret key.
    pub fn unlock(&self) -> Result<Vault> {
        let mut vault = self.open()?;
        let key = identity::resolve_secret_key(&self.registry)?;
        vault.unlock(&key)?;
        Ok(vault)
    }
}

/// Display form of a path argument.
pub(crate) fn display(path: &Path) -> String {
    path.display().to_string()
}
