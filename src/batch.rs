//! Batch enhancement
//!
//! Enhances every API document found under a directory, writing results to
//! an output directory with the same relative layout. A failing document is
//! logged and counted; the batch carries on.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::Result;
use crate::io;
use crate::pipeline::Enhancer;
use crate::registry::CanonicalSchemaRegistry;

fn default_extensions() -> Vec<String> {
    vec!["yaml".to_string(), "yml".to_string()]
}

fn default_keywords() -> Vec<String> {
    ["openapi", "swagger", "paths", "components"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Discovery settings; also the `[batch]` configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOptions {
    /// File extensions considered, without the dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// A candidate file must mention one of these (case-insensitive)
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            keywords: default_keywords(),
        }
    }
}

/// One document that could not be enhanced
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<BatchFailure>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Enhance every discovered document under `input_dir` into `output_dir`
pub fn run_batch(
    input_dir: &Path,
    output_dir: &Path,
    enhancer: &Enhancer,
    registry: &CanonicalSchemaRegistry,
    options: &BatchOptions,
) -> Result<BatchSummary> {
    let documents = io::discover_documents(input_dir, options);
    info!("Found {} API documents in {}", documents.len(), input_dir.display());

    fs::create_dir_all(output_dir)?;
    let mut summary = BatchSummary::default();

    for path in documents {
        let relative = path.strip_prefix(input_dir).unwrap_or(&path);
        let output = output_dir.join(relative);

        match enhance_file(&path, &output, enhancer, registry) {
            Ok(()) => {
                info!("Enhanced {}", relative.display());
                summary.succeeded += 1;
            }
            Err(e) => {
                warn!("Failed to enhance {}: {}", path.display(), e);
                summary.failed += 1;
                summary.failures.push(BatchFailure {
                    path,
                    error: e.to_string(),
                });
            }
        }
    }

    info!("Batch complete: {} succeeded, {} failed", summary.succeeded, summary.failed);
    Ok(summary)
}

fn enhance_file(
    input: &Path,
    output: &Path,
    enhancer: &Enhancer,
    registry: &CanonicalSchemaRegistry,
) -> Result<()> {
    let mut document = io::load_document(input)?;
    enhancer.run(&mut document, registry)?;
    io::save_document(output, &document)
}
