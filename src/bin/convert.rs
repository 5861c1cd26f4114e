//! Schema Converter CLI
//!
//! Converts a type system tree (JSON) into a draft-07 JSON Schema document
//! of canonical definitions.

use anyhow::Context;
use clap::Parser;
use schema_enhancer::{io, EnhancerConfig, SchemaConverter};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-convert")]
#[command(about = "Convert a type system tree to JSON Schema")]
struct Cli {
    /// Type system tree (JSON)
    input: PathBuf,

    /// Output JSON Schema file
    output: PathBuf,

    /// Configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Write the audit trail (JSON) here
    #[arg(long)]
    audit: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
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

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = EnhancerConfig::load_from(cli.config.as_deref()).context("loading configuration")?;

    let type_system = io::load_json(&cli.input)
        .with_context(|| format!("reading type system {}", cli.input.display()))?;

    println!("🔄 Converting {} to {}...", cli.input.display(), cli.output.display());
    let conversion = SchemaConverter::new(config.convert)
        .convert(&type_system)
        .with_context(|| format!("converting {}", cli.input.display()))?;

    let document = conversion.to_json_schema();
    io::save_document(&cli.output, &document)
        .with_context(|| format!("writing {}", cli.output.display()))?;

    if let Some(audit_path) = &cli.audit {
        let audit = serde_json::to_string_pretty(&conversion.audit)?;
        std::fs::write(audit_path, audit)
            .with_context(|| format!("writing audit trail {}", audit_path.display()))?;
    }

    println!("\n📈 Conversion Summary:");
    for line in conversion.summary().to_string().lines() {
        println!("   {}", line);
    }
    println!("✅ Wrote {} ({} audit events)", cli.output.display(), conversion.audit.len());
    Ok(())
}
