//! Schema Enhancer CLI
//!
//! Applies canonical constraints to OpenAPI documents, one at a time or a
//! whole directory.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use schema_enhancer::{
    io, run_batch, CanonicalSchemaRegistry, Enhancer, EnhancerConfig, SchemaConverter,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-enhance")]
#[command(about = "Apply canonical schema validation to OpenAPI documents")]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enhance a single document
    Apply {
        /// OpenAPI document (YAML or JSON)
        document: PathBuf,
        /// Converted JSON Schema, or a raw type system tree
        schema: PathBuf,
        /// Output document
        output: PathBuf,
        /// Disallow additional properties on open object schemas
        #[arg(long)]
        strict: bool,
        /// Write the audit trail (JSON) here
        #[arg(long)]
        audit: Option<PathBuf>,
    },

    /// Enhance every API document under a directory
    Batch {
        /// Directory to search
        input_dir: PathBuf,
        /// Converted JSON Schema, or a raw type system tree
        schema: PathBuf,
        /// Directory for enhanced documents
        output_dir: PathBuf,
        /// Disallow additional properties on open object schemas
        #[arg(long)]
        strict: bool,
        /// Only list the documents that would be processed
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// A converted document has `definitions`; anything with `types` is converted first
fn load_registry(path: &Path, config: &EnhancerConfig) -> anyhow::Result<CanonicalSchemaRegistry> {
    let schema: Value = io::load_json(path).with_context(|| format!("reading {}", path.display()))?;
    if schema.get("types").is_some() {
        let conversion = SchemaConverter::new(config.convert.clone()).convert(&schema)?;
        return Ok(conversion.registry);
    }
    Ok(CanonicalSchemaRegistry::from_json_schema(&schema)?)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = EnhancerConfig::load_from(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Apply { document, schema, output, strict, audit } => {
            config.enhance.strict |= strict;
            let registry = load_registry(&schema, &config)?;
            println!("📋 Loaded {} schema definitions", registry.len());

            let mut tree = io::load_document(&document)
                .with_context(|| format!("reading {}", document.display()))?;
            let report = Enhancer::new(config.enhance)
                .run(&mut tree, &registry)
                .with_context(|| format!("enhancing {}", document.display()))?;
            io::save_document(&output, &tree).with_context(|| format!("writing {}", output.display()))?;

            if let Some(audit_path) = &audit {
                std::fs::write(audit_path, serde_json::to_string_pretty(&report.audit)?)
                    .with_context(|| format!("writing audit trail {}", audit_path.display()))?;
            }

            println!("\n📊 Enhancement Summary:");
            println!("   Base types added: {}", report.base_types_added());
            println!("   Enumerations added: {}", report.enums_added());
            println!("   Schemas enhanced: {}", report.schemas_enhanced);
            println!("   Properties enhanced: {}", report.properties_enhanced());
            if let Some(name) = report.transaction_type() {
                println!("   Transaction type: {}", name);
            }
            println!("✅ Enhanced {} -> {}", document.display(), output.display());
            Ok(())
        }

        Commands::Batch { input_dir, schema, output_dir, strict, dry_run } => {
            if !input_dir.is_dir() {
                bail!("input directory not found: {}", input_dir.display());
            }

            if dry_run {
                let found = io::discover_documents(&input_dir, &config.batch);
                println!("🔍 {} documents would be processed:", found.len());
                for path in found {
                    println!("   {}", path.display());
                }
                return Ok(());
            }

            config.enhance.strict |= strict;
            let registry = load_registry(&schema, &config)?;
            let enhancer = Enhancer::new(config.enhance);
            let summary = run_batch(&input_dir, &output_dir, &enhancer, &registry, &config.batch)?;

            println!("\n📊 Batch Enhancement Complete:");
            println!("   ✅ Successful: {}", summary.succeeded);
            println!("   ❌ Failed: {}", summary.failed);
            for failure in &summary.failures {
                println!("      {}: {}", failure.path.display(), failure.error);
            }
            println!("   📂 Output directory: {}", output_dir.display());

            if summary.succeeded + summary.failed == 0 {
                bail!("no API documents found in {}", input_dir.display());
            }
            if !summary.is_success() {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
