//! Run command.
//!
//! Executes a command with decrypted secrets injected as environment variables.

use tracing::debug;

use crate::cli::Context;
use crate::error::{ConfigError, Result};

/// Run `command` with every secret set in its environment, then exit with
/// the child's status.
pub fn execute(ctx: &Context, command: &[String]) -> Result<()> {
    let exit_code = run_with_secrets(ctx, command)?;
    std::process::exit(exit_code);
}

fn run_with_secrets(ctx: &Context, command: &[String]) -> Result<i32> {
    let Some((program, args)) = command.split_first() else {
        return Err(ConfigError::InvalidValue {
            field: "command",
            reason: "no command given".to_string(),
        }
        .into());
    };

    let mut vault = ctx.unlock()?;
    let secrets = vault.get_all_secret_strings()?;

    let mut cmd = std::process::Command::new(program);
    cmd.args(args);
    for (name, value) in &secrets {
        cmd.env(name, value.as_str());
    }
    debug!(program = %program, secrets = secrets.len(), "running command");

    let status = cmd.status()?;
    // Killed by a signal: no code, report failure.
    Ok(status.code().unwrap_or(1))
}
