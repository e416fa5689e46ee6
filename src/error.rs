//! # Error Types
//!
//! Structured failure reasons for every stage of the pipeline. Nothing in
//! this crate rejects input without one of these attached.

use serde::Serialize;
use thiserror::Error;

/// A prop or param field that failed its schema
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{}: expected {expected}, received {received}", field_label(.path))]
pub struct SchemaError {
    /// Field path, e.g. `label` or `options[2]`. Empty for the value itself.
    pub path: String,
    pub expected: String,
    pub received: String,
}

fn field_label(path: &str) -> &str {
    if path.is_empty() {
        "<value>"
    } else {
        path
    }
}

/// Malformed binding path syntax, or a write that cannot be applied
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BindingError {
    #[error("binding path must start with '/': {path:?}")]
    NotAbsolute { path: String },

    #[error("binding path {path:?} has an empty segment at position {position}")]
    EmptySegment { path: String, position: usize },

    #[error("binding path {path:?} has an invalid escape in segment {segment:?}")]
    InvalidEscape { path: String, segment: String },

    #[error("cannot address sequence at {path:?} with non-numeric segment {segment:?}")]
    KeyOnSequence { path: String, segment: String },

    #[error("index {index} in {path:?} is too far past the end of a sequence of length {len}")]
    IndexOutOfRange { path: String, index: usize, len: usize },
}

/// Structural defects of a UI tree
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeStructureError {
    #[error("root element '{root}' does not exist")]
    MissingRoot { root: String },

    #[error("root element '{root}' must not have a parent (found '{parent}')")]
    RootHasParent { root: String, parent: String },

    #[error("element stored under '{key}' declares key '{declared}'")]
    KeyMismatch { key: String, declared: String },

    #[error("element '{parent}' lists missing child '{child}'")]
    MissingChild { parent: String, child: String },

    #[error("element '{child}' is listed by '{parent}' but declares parent {declared:?}")]
    ParentMismatch {
        parent: String,
        child: String,
        declared: Option<String>,
    },

    #[error("cycle: element '{parent}' lists its ancestor '{child}'")]
    Cycle { parent: String, child: String },

    #[error("element '{child}' is reached more than once (again from '{parent}')")]
    SharedChild { parent: String, child: String },

    #[error("element '{key}' is not reachable from the root")]
    Orphan { key: String },

    #[error("element '{key}' has unregistered type '{type_name}'")]
    UnknownType { key: String, type_name: String },

    #[error("element '{key}' of type '{type_name}' cannot have children ({count} listed)")]
    ChildrenNotAllowed {
        key: String,
        type_name: String,
        count: usize,
    },

    #[error("tree has {count} elements, more than the limit of {max}")]
    NodeCountExceeded { count: usize, max: usize },

    #[error("visibility condition on '{key}' nests deeper than {max}")]
    ConditionTooDeep { key: String, max: usize },
}

/// One finding produced by tree validation
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum TreeDiagnostic {
    #[error(transparent)]
    Structure(TreeStructureError),

    #[error("element '{key}' prop {error}")]
    Schema { key: String, error: SchemaError },

    #[error("element '{key}' visibility: {error}")]
    Binding { key: String, error: BindingError },
}

/// Complete, ordered list of findings for a rejected tree
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("tree validation failed with {} diagnostic(s)", .diagnostics.len())]
pub struct ValidationReport {
    pub diagnostics: Vec<TreeDiagnostic>,
}

impl ValidationReport {
    pub fn schema_errors(&self) -> impl Iterator<Item = (&str, &SchemaError)> {
        self.diagnostics.iter().filter_map(|d| match d {
            TreeDiagnostic::Schema { key, error } => Some((key.as_str(), error)),
            _ => None,
        })
    }

    pub fn structure_errors(&self) -> impl Iterator<Item = &TreeStructureError> {
        self.diagnostics.iter().filter_map(|d| match d {
            TreeDiagnostic::Structure(e) => Some(e),
            _ => None,
        })
    }
}

/// Failure of `Catalog::validate_props`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropsError {
    #[error("component type '{0}' is not in the catalog")]
    UnknownComponent(String),

    #[error("{} prop error(s): {}", .0.len(), join_errors(.0))]
    Invalid(Vec<SchemaError>),
}

/// Rejected catalog definition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("component type '{0}' is defined more than once")]
    DuplicateComponent(String),

    #[error("action '{0}' is defined more than once")]
    DuplicateAction(String),

    #[error("props schema of component '{0}' must be an object")]
    PropsNotObject(String),

    #[error("'{owner}' field '{path}': enum has no values")]
    EmptyEnum { owner: String, path: String },

    #[error("'{owner}' field '{path}': min {min} is greater than max {max}")]
    InvalidBounds {
        owner: String,
        path: String,
        min: String,
        max: String,
    },

    #[error("'{owner}' field '{path}': default does not satisfy its schema ({})", join_errors(.errors))]
    InvalidDefault {
        owner: String,
        path: String,
        errors: Vec<SchemaError>,
    },
}

/// Dispatch-time failure. Never aborts rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("no element '{key}' in the tree")]
    UnknownElement { key: String },

    #[error("element '{key}' is hidden and cannot be activated")]
    NotEligible { key: String },

    #[error("element '{key}' does not declare an action")]
    NoAction { key: String },

    #[error("element '{key}' declares unknown action '{action}'")]
    UnknownAction { key: String, action: String },

    #[error("invalid params for action '{action}': {}", join_errors(.errors))]
    InvalidParams {
        action: String,
        errors: Vec<SchemaError>,
    },

    #[error("no handler registered for action '{action}'")]
    MissingHandler { action: String },

    #[error("handler for action '{action}' failed: {reason}")]
    HandlerFailed { action: String, reason: String },
}

/// Drift between the catalog and the component registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("registry out of sync with catalog (missing renderers: {missing:?}, unknown types: {unknown:?})")]
    Drift {
        missing: Vec<String>,
        unknown: Vec<String>,
    },

    #[error("no renderer registered for component type '{type_name}', using placeholder")]
    MissingRenderer { type_name: String },

    #[error("lenient registry mode requires a fallback renderer")]
    MissingFallback,
}

/// Crate-level error
#[derive(Debug, Error)]
pub enum Error {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationReport),

    #[error("Binding error: {0}")]
    Binding(#[from] BindingError),

    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

fn join_errors(errors: &[SchemaError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
