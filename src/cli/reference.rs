//! Reference commands (ref, deref).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::cli::{display, output, Context};
use crate::core::vault::{contains_reference, DocumentFormat, Naming, ReferenceOptions};
use crate::error::Result;

const DOCUMENT_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Move a file's values into the vault.
pub fn reference(
    ctx: &Context,
    file: &Path,
    prefix: Option<String>,
    random: bool,
    force: bool,
    preview: bool,
    json: bool,
) -> Result<()> {
    let options = ReferenceOptions {
        naming: if random {
            Naming::Random
        } else {
            Naming::Path { prefix }
        },
        force,
        preview,
        format: if json {
            DocumentFormat::Json
        } else {
            DocumentFormat::from_path(file)
        },
    };

    let mut vault = ctx.open()?;
    let before = vault.secret_names().len();
    let document = vault.reference_file(file, &options)?;

    if preview {
        output::data(&document);
    } else {
        let added = vault.secret_names().len().saturating_sub(before);
        output::success(&format!("referenced {}", display(file)));
        output::kv("new secrets:", added);
    }
    Ok(())
}

/// Resolve references in files, walking any directories given.
pub fn dereference(ctx: &Context, paths: &[PathBuf], preview: bool) -> Result<()> {
    let files = collect_documents(paths)?;
    let mut vault = ctx.unlock()?;

    for file in &files {
        let document = vault.dereference_file(file, preview)?;
        if preview {
            if files.len() > 1 {
                output::section(&display(file));
            }
            output::data(&document);
        } else {
            output::success(&format!("dereferenced {}", display(file)));
        }
    }
    if files.is_empty() {
        output::dimmed("no files with references found");
    }
    Ok(())
}

/// Expand `paths` into the documents to dereference.
///
/// Files are taken as given. Directories are walked for YAML and JSON files
/// that contain at least one reference.
fn collect_documents(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file()
                && is_document(entry.path())
                && contains_reference(&fs::read_to_string(entry.path())?)
            {
                files.push(entry.into_path());
            }
        }
    }
    debug!(count = files.len(), "collected documents");
    Ok(files)
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.iter().any(|d| ext.eq_ignore_ascii_case(d)))
}
