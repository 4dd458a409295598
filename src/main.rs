//! Cellar - local-first encrypted secrets vaults.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cellar::cli::output;
use cellar::cli::{execute, Cli};
use cellar::core::constants::ENV_LOG;
use cellar::error::{ConfigError, Error, VaultError};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("cellar=debug")
        } else {
            EnvFilter::new("cellar=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).without_time())
        .init();

    if let Err(e) = execute(cli.command, cli.vault) {
        let suggestion = match &e {
            Error::Config(ConfigError::NoVault) => {
                Some("pass --vault <FILE> or set vault in .cellar.toml")
            }
            Error::Vault(VaultError::NotFound(_)) => Some("run: cellar new --share <PUBLIC_KEY>"),
            Error::Vault(VaultError::NotAccessible) => {
                Some("ask someone with access to run: cellar share <PUBLIC_KEY>")
            }
            Error::Vault(VaultError::Locked) => Some("set CELLAR_SECRET_KEY or CELLAR_ENV_BINDING"),
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
