//! # UI Tree
//!
//! The declarative, data-only description of one interface instance, in the
//! exchange format the external generator produces:
//!
//! ```json
//! { "root": "form-card",
//!   "elements": { "form-card": { "key": "form-card", "type": "Card",
//!                                "props": { ... }, "children": [ ... ],
//!                                "parentKey": null } } }
//! ```
//!
//! Nothing here is trusted. [`crate::validator::validate_tree`] turns a
//! `UITree` into a [`crate::validator::ValidatedTree`] or a full report.

use crate::binding::{BindingPath, DataStore, Lookup};
use crate::error::{BindingError, Result};
use indexmap::IndexMap;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UITree {
    pub root: String,
    /// Repeated keys are a parse error, never a silent overwrite
    #[serde(deserialize_with = "unique_elements")]
    pub elements: IndexMap<String, ElementNode>,
}

fn unique_elements<'de, D>(deserializer: D) -> std::result::Result<IndexMap<String, ElementNode>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ElementsVisitor;

    impl<'de> Visitor<'de> for ElementsVisitor {
        type Value = IndexMap<String, ElementNode>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map from element key to element")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut elements = IndexMap::new();
            while let Some((key, node)) = map.next_entry::<String, ElementNode>()? {
                if elements.contains_key(&key) {
                    return Err(de::Error::custom(format_args!("duplicate element key '{}'", key)));
                }
                elements.insert(key, node);
            }
            Ok(elements)
        }
    }

    deserializer.deserialize_map(ElementsVisitor)
}

impl UITree {
    /// Assemble a tree from nodes, keyed by their own `key`
    pub fn from_elements<I>(root: impl Into<String>, elements: I) -> Self
    where
        I: IntoIterator<Item = ElementNode>,
    {
        Self {
            root: root.into(),
            elements: elements.into_iter().map(|e| (e.key.clone(), e)).collect(),
        }
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub key: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Kept as a raw value so a non-object is a schema error, not a parse failure
    #[serde(default = "empty_props")]
    pub props: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
    #[serde(default)]
    pub parent_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<VisibilityCondition>,
}

fn empty_props() -> Value {
    Value::Object(Map::new())
}

impl ElementNode {
    pub fn new(key: impl Into<String>, type_name: impl Into<String>, props: Value) -> Self {
        Self {
            key: key.into(),
            type_name: type_name.into(),
            props,
            children: Vec::new(),
            parent_key: None,
            visible: None,
        }
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_key = Some(parent.into());
        self
    }

    pub fn with_visibility(mut self, condition: VisibilityCondition) -> Self {
        self.visible = Some(condition);
        self
    }
}

/// Per-node condition gating inclusion in rendered output
///
/// ```json
/// { "equals": { "path": "/server/cpu", "value": "16核" } }
/// { "all": [ { "exists": { "path": "/user" } }, { "not": { ... } } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityCondition {
    /// Path holds a value (a present `null` counts)
    Exists { path: String },
    Equals { path: String, value: Value },
    NotEquals { path: String, value: Value },
    Not(Box<VisibilityCondition>),
    All(Vec<VisibilityCondition>),
    Any(Vec<VisibilityCondition>),
}

impl VisibilityCondition {
    pub fn exists(path: impl Into<String>) -> Self {
        VisibilityCondition::Exists { path: path.into() }
    }

    pub fn equals(path: impl Into<String>, value: impl Into<Value>) -> Self {
        VisibilityCondition::Equals {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Parse every path and bound the nesting depth
    pub(crate) fn compile(&self, max_depth: usize) -> std::result::Result<Visibility, Vec<ConditionIssue>> {
        let mut issues = Vec::new();
        let compiled = self.compile_at(1, max_depth, &mut issues);
        match compiled {
            Some(v) if issues.is_empty() => Ok(v),
            _ => Err(issues),
        }
    }

    fn compile_at(&self, depth: usize, max_depth: usize, issues: &mut Vec<ConditionIssue>) -> Option<Visibility> {
        if depth > max_depth {
            issues.push(ConditionIssue::TooDeep);
            return None;
        }
        match self {
            VisibilityCondition::Exists { path } => parse_path(path, issues).map(Visibility::Exists),
            VisibilityCondition::Equals { path, value } => {
                parse_path(path, issues).map(|p| Visibility::Equals(p, value.clone()))
            }
            VisibilityCondition::NotEquals { path, value } => parse_path(path, issues)
                .map(|p| Visibility::Not(Box::new(Visibility::Equals(p, value.clone())))),
            VisibilityCondition::Not(inner) => inner
                .compile_at(depth + 1, max_depth, issues)
                .map(|v| Visibility::Not(Box::new(v))),
            VisibilityCondition::All(items) | VisibilityCondition::Any(items) => {
                let mut compiled = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(v) = item.compile_at(depth + 1, max_depth, issues) {
                        compiled.push(v);
                    }
                }
                if compiled.len() != items.len() {
                    return None;
                }
                Some(match self {
                    VisibilityCondition::All(_) => Visibility::All(compiled),
                    _ => Visibility::Any(compiled),
                })
            }
        }
    }
}

fn parse_path(raw: &str, issues: &mut Vec<ConditionIssue>) -> Option<BindingPath> {
    match BindingPath::parse(raw) {
        Ok(path) => Some(path),
        Err(e) => {
            issues.push(ConditionIssue::Binding(e));
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConditionIssue {
    Binding(BindingError),
    TooDeep,
}

/// Visibility condition with parsed paths, ready to evaluate
#[derive(Debug, Clone, PartialEq)]
pub enum Visibility {
    Exists(BindingPath),
    Equals(BindingPath, Value),
    Not(Box<Visibility>),
    All(Vec<Visibility>),
    Any(Vec<Visibility>),
}

impl Visibility {
    /// Evaluate against the current store contents. Absent never equals anything.
    pub fn evaluate(&self, store: &DataStore) -> bool {
        match self {
            Visibility::Exists(path) => store.read(path).is_present(),
            Visibility::Equals(path, expected) => match store.read(path) {
                Lookup::Present(actual) => actual == expected,
                Lookup::Absent => false,
            },
            Visibility::Not(inner) => !inner.evaluate(store),
            Visibility::All(items) => items.iter().all(|v| v.evaluate(store)),
            Visibility::Any(items) => items.iter().any(|v| v.evaluate(store)),
        }
    }
}
