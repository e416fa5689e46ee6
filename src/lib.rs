//! # jrender
//!
//! Catalog-governed declarative UI trees. An external generator (typically a
//! language model) emits a flat JSON tree of elements; jrender checks it
//! against a catalog of allowed component types and actions, binds it to a
//! session data store, and drives a host-supplied renderer over it.
//!
//! The same catalog is compiled into a plain-text grounding prompt so the
//! generator only proposes what the validator will accept.
//!
//! ## Quick Start
//!
//! ```rust
//! use jrender::demo::{server_catalog, server_form_tree, server_initial_data};
//! use jrender::{validate_tree, ComponentRegistry, DataStore, ElementView, RegistryMode, Renderer};
//!
//! let catalog = server_catalog()?;
//! let tree = validate_tree(&server_form_tree(), &catalog)?;
//!
//! let registry = ComponentRegistry::new()
//!     .with_fallback(|view: &ElementView<'_>, children: Vec<String>| {
//!         format!("{}({})", view.type_name, children.join(", "))
//!     })
//!     .verify(&catalog, RegistryMode::Lenient)?;
//!
//! let store = DataStore::new(server_initial_data());
//! let pass = Renderer::new(&tree, &registry).render(&store);
//! assert!(pass.output.is_some());
//! # Ok::<(), jrender::Error>(())
//! ```
//!
//! ## Architecture
//!
//! 1. **Catalog** - Component and action schemas, fixed at startup
//! 2. **Validation** - Structure, props and visibility paths, all reported together
//! 3. **Binding** - JSON-pointer reads and writes against the session store
//! 4. **Rendering** - Post-order walk over visible elements through a verified registry
//! 5. **Actions** - Activation of an element runs at most one host handler
//! 6. **Prompt compilation** - Grounding text and catalog dump for the generator

pub mod binding;
pub mod catalog;
pub mod codegen;
pub mod compiler;
pub mod config;
pub mod demo;
pub mod error;
pub mod render;
pub mod schema;
pub mod tree;
pub mod validator;

// Re-export the main API
pub use binding::{BindingPath, DataStore, ListenerId, Lookup, Segment};
pub use catalog::{create_catalog, ActionSpec, Catalog, CatalogBuilder, ComponentKind, ComponentSpec};
pub use compiler::{compile_catalog, compile_catalog_with, CompiledPrompt};
pub use config::{EngineConfig, RegistryMode};
pub use error::{
    ActionError, BindingError, CatalogError, Error, PropsError, RegistryError, Result, SchemaError,
    TreeDiagnostic, TreeStructureError, ValidationReport,
};
pub use render::{
    dispatch_action, dispatch_action_with, ActionHandlers, ActionInvocation, ComponentRegistry, ElementView,
    LiveView, NodeState, RenderPass, Renderer, VerifiedRegistry,
};
pub use schema::Schema;
pub use tree::{ElementNode, UITree, VisibilityCondition};
pub use validator::{validate_tree, validate_tree_with, ValidatedNode, ValidatedTree};
