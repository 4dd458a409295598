//! Secret references in external documents.
//!
//! Referencing moves every string leaf of a YAML or JSON document into the
//! vault and leaves a `{{CELLAR_VID_<vault id>.<name>}}` token in its place.
//! Dereferencing works on the raw text and swaps this vault's tokens back
//! for their values.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_yaml::Value;
use tracing::debug;
use zeroize::Zeroizing;

use super::Vault;
use crate::core::constants::{
    APP_PREFIX, MAX_REFERENCE_ATTEMPTS, PREVIEW_PLACEHOLDER, RANDOM_NAME_BYTES,
};
use crate::core::crypto::{encoding, SealedSecret};
use crate::core::validation::{sanitize_secret_name, SECRET_NAME_PATTERN};
use crate::error::{ReferenceError, Result, SecretError};

/// How referenced secrets are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Naming {
    /// Derive the name from the leaf's path, joined with `__`.
    Path { prefix: Option<String> },
    /// Generate `ref_<random>` names.
    Random,
}

impl Default for Naming {
    fn default() -> Self {
        Naming::Path { prefix: None }
    }
}

/// Output format of a referenced document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocumentFormat {
    #[default]
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Pick the format from a file extension, defaulting to YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceOptions {
    pub naming: Naming,
    /// Overwrite existing secrets instead of failing with a conflict.
    pub force: bool,
    /// Show the document shape without touching the vault.
    pub preview: bool,
    pub format: DocumentFormat,
}

fn reference_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        let pattern = format!(
            r#"(?P<open>['"]?)\{{\{{\s*{}_VID_(?P<vault>[1-9A-HJ-NP-Za-km-z]+)\.(?P<name>{})\s*\}}\}}(?P<close>['"]?)"#,
            APP_PREFIX, SECRET_NAME_PATTERN
        );
        Regex::new(&pattern).expect("reference token pattern is valid")
    })
}

/// Whether `text` contains a reference token of any vault.
pub fn contains_reference(text: &str) -> bool {
    reference_regex().is_match(text)
}

fn reference_token(vault_id: &str, name: &str) -> String {
    format!("{{{{{}_VID_{}.{}}}}}", APP_PREFIX, vault_id, name)
}

/// Quote character enclosing byte offset `pos` of `text`, if any.
///
/// Only the current line is scanned. A quote opens a scalar when it follows
/// the line start, whitespace, or one of `:[{,-`.
fn enclosing_quote(text: &str, pos: usize) -> Option<char> {
    let line_start = text[..pos].rfind('\n').map_or(0, |i| i + 1);
    let mut chars = text[line_start..pos].chars().peekable();
    let mut quote = None;
    let mut prev: Option<char> = None;
    while let Some(c) = chars.next() {
        match quote {
            None if (c == '"' || c == '\'')
                && prev.map_or(true, |p| p.is_whitespace() || ":[{,-".contains(p)) =>
            {
                quote = Some(c);
            }
            Some('"') if c == '\\' => {
                chars.next();
            }
            Some('"') if c == '"' => quote = None,
            Some('\'') if c == '\'' => {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                } else {
                    quote = None;
                }
            }
            _ => {}
        }
        prev = Some(c);
    }
    quote
}

/// Render a resolved value in place of a token so the surrounding scalar
/// still parses to the original string.
fn splice_value(
    document: &str,
    start: usize,
    captures: &Captures<'_>,
    value: &str,
) -> Result<String> {
    let open = &captures["open"];
    let close = &captures["close"];
    let outer = enclosing_quote(document, start);
    let quote = enclosing_quote(document, start + open.len());

    // A token that is the whole quoted scalar is re-emitted double-quoted.
    if outer.is_none() && quote.is_some() && quote == open.chars().next() && open == close {
        return Ok(serde_json::to_string(value)?);
    }

    let escaped = match quote {
        Some('"') => {
            let quoted = serde_json::to_string(value)?;
            quoted[1..quoted.len() - 1].to_string()
        }
        Some(_) => {
            if value.contains('\n') {
                return Err(ReferenceError::Document(format!(
                    "multi-line value of {} cannot go inside a single-quoted scalar",
                    &captures["name"]
                ))
                .into());
            }
            value.replace('\'', "''")
        }
        None => value.to_string(),
    };
    Ok(format!("{}{}{}", open, escaped, close))
}

/// State of one referencing pass.
struct Pass<'a> {
    vault: &'a Vault,
    options: &'a ReferenceOptions,
    vault_id: String,
    staged: BTreeMap<String, (SealedSecret, Zeroizing<Vec<u8>>)>,
    taken: HashSet<String>,
}

impl Pass<'_> {
    fn walk(&mut self, value: &mut Value, path: &mut Vec<String>) -> Result<()> {
        match value {
            Value::String(text) => {
                if contains_reference(text) {
                    return Ok(());
                }
                if self.options.preview {
                    *text = PREVIEW_PLACEHOLDER.to_string();
                    return Ok(());
                }
                let name = self.next_name(path)?;
                let secret = Zeroizing::new(std::mem::take(text).into_bytes());
                let sealed = self
                    .vault
                    .public_key()
                    .seal(&secret, self.vault.hash_length())?;
                *text = reference_token(&self.vault_id, &name);
                self.staged.insert(name, (sealed, secret));
            }
            Value::Mapping(mapping) => {
                for (key, child) in mapping.iter_mut() {
                    path.push(path_segment(key)?);
                    self.walk(child, path)?;
                    path.pop();
                }
            }
            Value::Sequence(items) => {
                for (index, child) in items.iter_mut().enumerate() {
                    path.push(index.to_string());
                    self.walk(child, path)?;
                    path.pop();
                }
            }
            Value::Tagged(tagged) => self.walk(&mut tagged.value, path)?,
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
        Ok(())
    }

    fn next_name(&mut self, path: &[String]) -> Result<String> {
        match &self.options.naming {
            Naming::Path { prefix } => {
                let joined = prefix
                    .iter()
                    .cloned()
                    .chain(path.iter().cloned())
                    .collect::<Vec<_>>()
                    .join("__");
                let name = sanitize_secret_name(&joined);
                if self.taken.contains(&name)
                    || (self.vault.secret_exists(&name) && !self.options.force)
                {
                    return Err(ReferenceError::Conflict(name).into());
                }
                self.taken.insert(name.clone());
                Ok(name)
            }
            Naming::Random => {
                for _ in 0..MAX_REFERENCE_ATTEMPTS {
                    let name = format!(
                        "ref_{}",
                        encoding::encode_plain(&encoding::random_bytes::<RANDOM_NAME_BYTES>()?)
                    );
                    if !self.taken.contains(&name) && !self.vault.secret_exists(&name) {
                        self.taken.insert(name.clone());
                        return Ok(name);
                    }
                }
                Err(ReferenceError::MaxAttempts(MAX_REFERENCE_ATTEMPTS).into())
            }
        }
    }
}

fn path_segment(key: &Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        _ => Err(ReferenceError::Document("mapping keys must be scalars".to_string()).into()),
    }
}

fn render(value: &Value, format: DocumentFormat) -> Result<String> {
    match format {
        DocumentFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        DocumentFormat::Json => {
            let mut json = serde_json::to_string_pretty(value)?;
            json.push('\n');
            Ok(json)
        }
    }
}

impl Vault {
    /// Move the string leaves of `document` into the vault.
    ///
    /// Leaves that already hold a reference token are skipped, so running this
    /// twice changes nothing. Numbers, booleans and nulls are left in place.
    /// The vault is only written once everything has been staged.
    ///
    /// # Errors
    ///
    /// - `ReferenceError::Conflict` if a derived name exists and `force` is off,
    ///   or two leaves map to the same name
    /// - `ReferenceError::MaxAttempts` if random naming keeps colliding
    /// - `Error::Yaml` / `Error::Json` if the document cannot be parsed or rendered
    pub fn reference_secrets(
        &mut self,
        document: &str,
        options: &ReferenceOptions,
    ) -> Result<String> {
        let mut tree: Value = serde_yaml::from_str(document)?;

        let mut pass = Pass {
            vault: self,
            options,
            vault_id: self.id(),
            staged: BTreeMap::new(),
            taken: HashSet::new(),
        };
        pass.walk(&mut tree, &mut Vec::new())?;
        let staged = pass.staged;

        let output = render(&tree, options.format)?;
        if options.preview {
            debug!("previewed references");
            return Ok(output);
        }
        if staged.is_empty() {
            return Ok(output);
        }

        let unlocked = !self.is_locked();
        let count = staged.len();
        for (name, (sealed, secret)) in staged {
            if unlocked {
                self.cache.insert(name.clone(), secret);
            } else {
                self.cache.remove(&name);
            }
            self.document.secrets.insert(name, sealed);
        }
        debug!(count, "referenced secrets");

        self.persist()?;
        Ok(output)
    }

    /// Replace this vault's reference tokens in `document` with their values.
    ///
    /// Works on the raw text; tokens of other vaults are left alone. Values
    /// are escaped for the quoted scalar they land in, and a token that is a
    /// whole quoted scalar comes back as a double-quoted string.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Locked` if the vault is locked,
    /// `SecretError::NotFound` for a token naming an unknown secret and
    /// `ReferenceError::Document` for a multi-line value inside a
    /// single-quoted scalar.
    pub fn dereference_secrets(&mut self, document: &str) -> Result<String> {
        self.unlocked_key()?;
        let vault_id = self.id();

        let mut failure = None;
        let mut resolved = 0usize;
        let output = reference_regex().replace_all(document, |captures: &Captures<'_>| {
            if failure.is_some() || captures["vault"] != vault_id {
                return captures[0].to_string();
            }
            let rendered = self
                .resolve_reference(&captures["name"])
                .and_then(|value| {
                    let start = captures.get(0).map_or(0, |m| m.start());
                    splice_value(document, start, &captures, &value)
                });
            match rendered {
                Ok(text) => {
                    resolved += 1;
                    text
                }
                Err(e) => {
                    failure = Some(e);
                    String::new()
                }
            }
        });
        if let Some(e) = failure {
            return Err(e);
        }

        debug!(resolved, "dereferenced secrets");
        Ok(output.into_owned())
    }

    fn resolve_reference(&mut self, name: &str) -> Result<Zeroizing<String>> {
        if !self.secret_exists(name) {
            return Err(SecretError::NotFound(name.to_string()).into());
        }
        self.get_secret_string(name)
    }

    /// Reference a file in place. Preview runs leave the file untouched.
    ///
    /// Returns the referenced text.
    pub fn reference_file(&mut self, path: &Path, options: &ReferenceOptions) -> Result<String> {
        let document = fs::read_to_string(path)?;
        let output = self.reference_secrets(&document, options)?;
        if !options.preview {
            fs::write(path, &output)?;
        }
        Ok(output)
    }

    /// Dereference a file in place. Preview runs leave the file untouched.
    ///
    /// Returns the resolved text.
    pub fn dereference_file(&mut self, path: &Path, preview: bool) -> Result<String> {
        let document = fs::read_to_string(path)?;
        let output = self.dereference_secrets(&document)?;
        if !preview {
            fs::write(path, &output)?;
        }
        Ok(output)
    }
}
