//! # Prompt Compiler
//!
//! Main entry points for compiling a catalog into the grounding artifacts
//! consumed by the external UI generator.

use crate::catalog::Catalog;
use crate::codegen::{CatalogDumpGenerator, PromptTextGenerator};
use crate::config::EngineConfig;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// File name of the grounding text inside an artifact directory
pub const PROMPT_FILE: &str = "catalog-prompt.txt";

/// File name of the catalog dump inside an artifact directory
pub const DUMP_FILE: &str = "catalog.json";

/// Compiled grounding artifacts for one catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPrompt {
    /// Plain-text grounding document
    pub text: String,
    /// Machine-readable catalog dump carrying the same information
    pub catalog_json: String,
}

impl CompiledPrompt {
    /// Write both artifacts into `dir`, creating it if needed
    ///
    /// # Returns
    ///
    /// * `Ok((prompt_path, dump_path))` - Where the files were written
    /// * `Err(Error::Io)` - The directory or a file could not be written
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<(PathBuf, PathBuf)> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let prompt_path = dir.join(PROMPT_FILE);
        std::fs::write(&prompt_path, &self.text)?;
        tracing::info!("[COMPILE] Prompt written: {}", prompt_path.display());

        let dump_path = dir.join(DUMP_FILE);
        std::fs::write(&dump_path, &self.catalog_json)?;
        tracing::info!("[COMPILE] Catalog JSON written: {}", dump_path.display());

        Ok((prompt_path, dump_path))
    }
}

/// Compile a catalog with the default engine limits
///
/// This is the main entry point of the prompt compiler. It is a pure
/// function of the catalog: compiling an unchanged catalog twice yields
/// byte-identical artifacts, so the result can be cached and diffed.
///
/// # Arguments
///
/// * `catalog` - The catalog to describe
///
/// # Returns
///
/// * `Ok(CompiledPrompt)` - The grounding text and catalog dump
/// * `Err(Error)` - The dump could not be serialized
///
/// # Examples
///
/// ```rust
/// use jrender::{compile_catalog, demo::server_catalog};
///
/// let compiled = compile_catalog(&server_catalog()?)?;
/// assert!(compiled.text.contains("### Select"));
/// # Ok::<(), jrender::Error>(())
/// ```
pub fn compile_catalog(catalog: &Catalog) -> Result<CompiledPrompt> {
    compile_catalog_with(catalog, &EngineConfig::default())
}

/// Compile a catalog, stating the limits of the given configuration
pub fn compile_catalog_with(catalog: &Catalog, config: &EngineConfig) -> Result<CompiledPrompt> {
    tracing::info!("[COMPILE] Starting catalog compilation");
    tracing::info!(
        "[COMPILE] Catalog: {} component types, {} actions",
        catalog.component_count(),
        catalog.actions().count()
    );

    // Phase 1: grounding text
    tracing::info!("[COMPILE] Phase 1: Generating prompt text...");
    let text = PromptTextGenerator::new(catalog, config.max_nodes).generate_prompt();
    tracing::info!("[COMPILE] Prompt text complete ({} bytes)", text.len());

    // Phase 2: machine-readable dump
    tracing::info!("[COMPILE] Phase 2: Generating catalog dump...");
    let catalog_json = CatalogDumpGenerator::new(catalog).generate_dump()?;
    tracing::info!("[COMPILE] Catalog dump complete ({} bytes)", catalog_json.len());

    tracing::info!("[COMPILE] Compilation successful!");

    Ok(CompiledPrompt { text, catalog_json })
}
