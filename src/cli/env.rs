//! Environment commands.

use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{display, identity, output, Context};
use crate::core::environment::{EnvKind, Environment};
use crate::core::provider::PASSWORD_PROVIDER;
use crate::error::Result;

/// Create a password-bound environment and print it.
pub fn new(
    ctx: &Context,
    name: &str,
    email: Option<String>,
    tags: Vec<String>,
    service: bool,
    out: Option<&Path>,
) -> Result<()> {
    let kind = if service { EnvKind::Service } else { EnvKind::User };
    let inputs = identity::password_inputs()?;

    let mut environment = ctx
        .registry
        .new_environment(PASSWORD_PROVIDER, name, kind, &inputs)?;
    environment.email = email;
    environment.add_tags(tags);
    let yaml = serde_yaml::to_string(&environment)?;

    output::success(&format!("created environment {}", output::key(name)));
    output::kv("public:", &environment.public_key);
    if let Some(binding) = &environment.binding {
        output::kv("binding:", binding);
    }
    if let Some(path) = out {
        fs::write(path, &yaml)?;
        output::kv("saved to:", display(path));
    }
    output::section("environment");
    output::data(yaml.trim_end());
    output::dimmed("export the binding as CELLAR_ENV_BINDING to unlock with this password");
    Ok(())
}

/// Print saved environments, keeping those that match `query`.
pub fn list(files: &[PathBuf], query: Option<&str>) -> Result<()> {
    let mut shown = 0usize;
    for file in files {
        let environment: Environment = serde_yaml::from_str(&fs::read_to_string(file)?)?;
        if query.is_some_and(|q| !environment.matches(q)) {
            continue;
        }
        shown += 1;
        output::header(&format!("{} ({})", environment.name, environment.kind));
        output::kv("public:", &environment.public_key);
        if let Some(email) = &environment.email {
            output::kv("email:", email);
        }
        if !environment.tags.is_empty() {
            output::kv("tags:", environment.tags.join(", "));
        }
    }

    if shown == 0 {
        output::dimmed("no matching environments");
    }
    Ok(())
}
