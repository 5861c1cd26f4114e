//! File adapters
//!
//! Loading and saving of document trees, and discovery of API documents on
//! disk. The conversion and enhancement engines never touch the filesystem.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::batch::BatchOptions;
use crate::error::Result;

/// Serialized form of a document tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// `.json` files are JSON, everything else is read as YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

/// Load a YAML or JSON document, chosen by file extension
pub fn load_document(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    let value = match Format::from_path(path) {
        Format::Json => serde_json::from_str(&content)?,
        Format::Yaml => serde_yaml::from_str(&content)?,
    };
    Ok(value)
}

/// Load a JSON file (type system tree or converted JSON Schema)
pub fn load_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write a document as YAML or JSON, chosen by file extension. Key order is kept.
pub fn save_document(path: &Path, document: &Value) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let content = match Format::from_path(path) {
        Format::Json => serde_json::to_string_pretty(document)? + "\n",
        Format::Yaml => serde_yaml::to_string(document)?,
    };
    fs::write(path, content)?;
    Ok(())
}

/// Find API documents under `dir`: files with a configured extension whose
/// content mentions one of the configured keywords. Sorted by path.
pub fn discover_documents(dir: &Path, options: &BatchOptions) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| has_extension(path, &options.extensions))
        .filter(|path| match fs::read_to_string(path) {
            Ok(content) => {
                let content = content.to_lowercase();
                options.keywords.iter().any(|k| content.contains(&k.to_lowercase()))
            }
            Err(e) => {
                debug!("Skipping unreadable {}: {}", path.display(), e);
                false
            }
        })
        .collect();
    found.sort();
    found
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
