//! # Prompt Artifact Generation
//!
//! Text and JSON generators behind the prompt compiler.

mod catalog_dump;
mod prompt_text;

pub use catalog_dump::CatalogDumpGenerator;
pub use prompt_text::PromptTextGenerator;
