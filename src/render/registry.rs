//! # Component Registry
//!
//! Maps each catalog component type to the host's rendering function.
//!
//! Registration is by type name, but rendering never looks names up: the
//! registry is verified once against the catalog and turned into a table
//! indexed by [`ComponentKind`], with one entry per catalog type.

use crate::binding::BindingPath;
use crate::catalog::{Catalog, ComponentKind};
use crate::config::RegistryMode;
use crate::error::RegistryError;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Host rendering function: the element plus its already-rendered children
pub type RenderFn<O> = Arc<dyn Fn(&ElementView<'_>, Vec<O>) -> O + Send + Sync>;

/// A binding prop resolved against the current data store
#[derive(Debug, Clone, PartialEq)]
pub struct BoundValue {
    pub prop: String,
    pub path: BindingPath,
    /// `None` when nothing is stored at the path
    pub value: Option<Value>,
}

/// What a rendering function sees of one element
#[derive(Debug, Clone, Copy)]
pub struct ElementView<'a> {
    pub key: &'a str,
    pub type_name: &'a str,
    pub kind: ComponentKind,
    pub props: &'a Map<String, Value>,
    pub bindings: &'a [BoundValue],
}

impl<'a> ElementView<'a> {
    pub fn prop(&self, name: &str) -> Option<&'a Value> {
        self.props.get(name)
    }

    pub fn prop_str(&self, name: &str) -> Option<&'a str> {
        self.props.get(name).and_then(Value::as_str)
    }

    /// Store value behind a binding prop, if the prop is bound and the path holds a value
    pub fn bound(&self, prop: &str) -> Option<&'a Value> {
        self.bindings
            .iter()
            .find(|b| b.prop == prop)
            .and_then(|b| b.value.as_ref())
    }
}

/// Renderers registered by type name, not yet checked against a catalog
pub struct ComponentRegistry<O> {
    renderers: IndexMap<String, RenderFn<O>>,
    fallback: Option<RenderFn<O>>,
}

impl<O> Default for ComponentRegistry<O> {
    fn default() -> Self {
        Self {
            renderers: IndexMap::new(),
            fallback: None,
        }
    }
}

impl<O> ComponentRegistry<O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the renderer for a component type, replacing any earlier one
    pub fn register<F>(mut self, type_name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&ElementView<'_>, Vec<O>) -> O + Send + Sync + 'static,
    {
        self.renderers.insert(type_name.into(), Arc::new(render));
        self
    }

    /// Placeholder used for unregistered types in lenient mode
    pub fn with_fallback<F>(mut self, render: F) -> Self
    where
        F: Fn(&ElementView<'_>, Vec<O>) -> O + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(render));
        self
    }

    /// Check the registry against the catalog and build the lookup table
    ///
    /// # Arguments
    ///
    /// * `catalog` - The catalog trees will be validated against
    /// * `mode` - Whether drift is fatal or downgraded to warnings
    ///
    /// # Returns
    ///
    /// * `Ok(VerifiedRegistry)` - One renderer per catalog type
    /// * `Err(RegistryError)` - Drift in strict mode, or lenient mode without a fallback
    pub fn verify(mut self, catalog: &Catalog, mode: RegistryMode) -> Result<VerifiedRegistry<O>, RegistryError> {
        let missing: Vec<String> = catalog
            .components()
            .filter(|spec| !self.renderers.contains_key(&spec.name))
            .map(|spec| spec.name.clone())
            .collect();
        let unknown: Vec<String> = self
            .renderers
            .keys()
            .filter(|name| catalog.component(name).is_none())
            .cloned()
            .collect();

        let mut warnings = Vec::new();
        match mode {
            RegistryMode::Strict => {
                if !missing.is_empty() || !unknown.is_empty() {
                    return Err(RegistryError::Drift { missing, unknown });
                }
            }
            RegistryMode::Lenient => {
                if !missing.is_empty() && self.fallback.is_none() {
                    return Err(RegistryError::MissingFallback);
                }
                for type_name in &missing {
                    tracing::warn!("[RENDER] No renderer for '{}', using placeholder", type_name);
                    warnings.push(RegistryError::MissingRenderer {
                        type_name: type_name.clone(),
                    });
                }
                if !unknown.is_empty() {
                    tracing::warn!("[RENDER] Renderers for unknown types ignored: {:?}", unknown);
                    warnings.push(RegistryError::Drift {
                        missing: Vec::new(),
                        unknown,
                    });
                }
            }
        }

        let mut table = Vec::with_capacity(catalog.component_count());
        for spec in catalog.components() {
            let render = match self.renderers.swap_remove(&spec.name) {
                Some(render) => render,
                None => match &self.fallback {
                    Some(fallback) => fallback.clone(),
                    None => return Err(RegistryError::MissingFallback),
                },
            };
            table.push((spec.name.clone(), render));
        }

        tracing::info!(
            "[RENDER] Registry verified: {} component types, {} placeholder(s)",
            table.len(),
            missing.len()
        );

        Ok(VerifiedRegistry { table, warnings })
    }
}

/// Total lookup table from [`ComponentKind`] to renderer
pub struct VerifiedRegistry<O> {
    table: Vec<(String, RenderFn<O>)>,
    warnings: Vec<RegistryError>,
}

impl<O> VerifiedRegistry<O> {
    /// Renderer for a kind of the catalog this registry was verified against
    pub fn renderer(&self, kind: ComponentKind, type_name: &str) -> Option<&RenderFn<O>> {
        self.table
            .get(kind.index())
            .filter(|(name, _)| name == type_name)
            .map(|(_, render)| render)
    }

    /// Drift downgraded to warnings in lenient mode
    pub fn warnings(&self) -> &[RegistryError] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
