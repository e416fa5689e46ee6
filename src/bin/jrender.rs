//! Command-line front end for catalog prompt generation and tree checking.
//!
//! ```bash
//! jrender prompt --out-dir generated
//! jrender validate --tree tree.json --catalog catalog.json
//! ```

use clap::{Parser, Subcommand};
use jrender::{compile_catalog_with, demo, validate_tree_with, Catalog, EngineConfig, UITree};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the grounding prompt and catalog dump
    Prompt {
        /// Catalog definition file; the built-in server catalog when omitted
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Directory receiving catalog-prompt.txt and catalog.json
        #[arg(long, default_value = "generated")]
        out_dir: PathBuf,

        /// Engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Check a UI tree against a catalog
    Validate {
        /// UI tree file
        #[arg(long)]
        tree: PathBuf,

        /// Catalog definition file; the built-in server catalog when omitted
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let default_level = "info";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Prompt { catalog, out_dir, config } => run_prompt(catalog.as_deref(), &out_dir, config.as_deref()),
        Commands::Validate { tree, catalog, config } => run_validate(&tree, catalog.as_deref(), config.as_deref()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_catalog(path: Option<&Path>) -> jrender::Result<Catalog> {
    match path {
        Some(path) => {
            tracing::info!("[JRENDER] Loading catalog from {}", path.display());
            Catalog::from_json_str(&std::fs::read_to_string(path)?)
        }
        None => Ok(demo::server_catalog()?),
    }
}

fn load_config(path: Option<&Path>) -> jrender::Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

fn run_prompt(catalog: Option<&Path>, out_dir: &Path, config: Option<&Path>) -> jrender::Result<ExitCode> {
    let catalog = load_catalog(catalog)?;
    let config = load_config(config)?;

    let compiled = compile_catalog_with(&catalog, &config)?;
    let (prompt, dump) = compiled.write_to(out_dir)?;

    println!("{}", prompt.display());
    println!("{}", dump.display());
    Ok(ExitCode::SUCCESS)
}

fn run_validate(tree: &Path, catalog: Option<&Path>, config: Option<&Path>) -> jrender::Result<ExitCode> {
    let catalog = load_catalog(catalog)?;
    let config = load_config(config)?;
    let tree = UITree::from_json_str(&std::fs::read_to_string(tree)?)?;

    match validate_tree_with(&tree, &catalog, &config) {
        Ok(validated) => {
            println!("valid: {} elements, root '{}'", validated.len(), validated.root_key());
            Ok(ExitCode::SUCCESS)
        }
        Err(report) => {
            for diagnostic in &report.diagnostics {
                println!("{}", diagnostic);
            }
            println!("{}", report);
            Ok(ExitCode::FAILURE)
        }
    }
}
