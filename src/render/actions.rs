//! # Action Dispatch
//!
//! Turns the activation of an element into at most one call of the host's
//! handler for the action that element declares.
//!
//! Every refusal is an [`ActionError`]. None of them is fatal: the caller
//! reports it and keeps the rendered UI interactive.

use crate::binding::DataStore;
use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::error::ActionError;
use crate::schema::ValidateOptions;
use crate::validator::ValidatedTree;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// One action call, built at dispatch time and dropped after the handler returns
#[derive(Debug, Clone, PartialEq)]
pub struct ActionInvocation {
    pub name: String,
    /// Params after validation, with defaults filled in
    pub params: Value,
    /// Key of the element that was activated
    pub source: String,
}

pub type ActionHandler = Box<dyn FnMut(&ActionInvocation) -> Result<(), String> + Send>;

/// Action name to handler lookup, supplied by the hosting session
#[derive(Default)]
pub struct ActionHandlers {
    handlers: HashMap<String, ActionHandler>,
}

impl ActionHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for an action, replacing any earlier one
    pub fn on<F>(mut self, action: impl Into<String>, handler: F) -> Self
    where
        F: FnMut(&ActionInvocation) -> Result<(), String> + Send + 'static,
    {
        self.handlers.insert(action.into(), Box::new(handler));
        self
    }

    pub fn contains(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }
}

impl fmt::Debug for ActionHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("ActionHandlers").field("actions", &names).finish()
    }
}

/// Activate an element and run its action handler, with the default configuration
///
/// # Arguments
///
/// * `catalog` - Source of the action's param schema
/// * `tree` - The validated tree the element belongs to
/// * `store` - Current data, used to decide whether the element is visible
/// * `handlers` - The session's handlers
/// * `key` - The activated element
/// * `params` - Params supplied with the activation; `None` means `{}`
///
/// # Returns
///
/// * `Ok(())` - Exactly one handler call was made and it succeeded
/// * `Err(ActionError)` - Why no handler ran, or why it failed
pub fn dispatch_action(
    catalog: &Catalog,
    tree: &ValidatedTree,
    store: &DataStore,
    handlers: &mut ActionHandlers,
    key: &str,
    params: Option<Value>,
) -> Result<(), ActionError> {
    dispatch_action_with(catalog, tree, store, handlers, key, params, &EngineConfig::default())
}

/// Activate an element under an explicit configuration
///
/// `rejectUnknownProps` applies to params the same way it applies to props:
/// undeclared params are rejected, or dropped when it is off.
pub fn dispatch_action_with(
    catalog: &Catalog,
    tree: &ValidatedTree,
    store: &DataStore,
    handlers: &mut ActionHandlers,
    key: &str,
    params: Option<Value>,
    config: &EngineConfig,
) -> Result<(), ActionError> {
    let result = dispatch(catalog, tree, store, handlers, key, params, config);
    if let Err(e) = &result {
        tracing::warn!("[ACTION] {}", e);
    }
    result
}

fn dispatch(
    catalog: &Catalog,
    tree: &ValidatedTree,
    store: &DataStore,
    handlers: &mut ActionHandlers,
    key: &str,
    params: Option<Value>,
    config: &EngineConfig,
) -> Result<(), ActionError> {
    let node = tree.node(key).ok_or_else(|| ActionError::UnknownElement {
        key: key.to_string(),
    })?;

    // A hidden ancestor hides the whole subtree
    let visible = tree
        .lineage(key)
        .all(|n| n.visibility.as_ref().map_or(true, |v| v.evaluate(store)));
    if !visible {
        return Err(ActionError::NotEligible { key: key.to_string() });
    }

    let action = node.action.as_deref().ok_or_else(|| ActionError::NoAction {
        key: key.to_string(),
    })?;

    let spec = catalog.action(action).ok_or_else(|| ActionError::UnknownAction {
        key: key.to_string(),
        action: action.to_string(),
    })?;

    let supplied = params.unwrap_or_else(|| Value::Object(Map::new()));
    let params = spec
        .params
        .validate_with(
            Some(&supplied),
            ValidateOptions {
                reject_unknown: config.reject_unknown_props,
            },
        )
        .map_err(|errors| ActionError::InvalidParams {
            action: action.to_string(),
            errors,
        })?;

    let handler = handlers
        .handlers
        .get_mut(action)
        .ok_or_else(|| ActionError::MissingHandler {
            action: action.to_string(),
        })?;

    let invocation = ActionInvocation {
        name: action.to_string(),
        params,
        source: key.to_string(),
    };
    tracing::info!("[ACTION] Dispatching '{}' from '{}'", invocation.name, key);

    handler(&invocation).map_err(|reason| ActionError::HandlerFailed {
        action: action.to_string(),
        reason,
    })
}
