//! # Tree Validator
//!
//! Checks an untrusted [`UITree`] against a [`Catalog`] and produces either
//! a [`ValidatedTree`] the renderer can walk, or a [`ValidationReport`] with
//! every finding.
//!
//! Validation runs in phases:
//!
//! 1. **Size check** - element count against the configured ceiling
//! 2. **Key consistency** - each element's `key` matches its mapping key
//! 3. **Root check** - root exists and has no parent
//! 4. **Traversal** - iterative depth-first walk from the root, children in
//!    listed order, checking links, types, props, children capability and
//!    visibility paths per node
//! 5. **Orphan sweep** - elements the walk never reached, with cycles among
//!    them reported separately
//!
//! The walk uses an explicit stack, so deep trees cannot exhaust the call
//! stack. Diagnostics come out in a fixed order for a given tree.

use crate::binding::BindingPath;
use crate::catalog::{Catalog, ComponentKind};
use crate::config::EngineConfig;
use crate::error::{PropsError, TreeDiagnostic, TreeStructureError, ValidationReport};
use crate::schema::ValidateOptions;
use crate::tree::{ConditionIssue, ElementNode, UITree, Visibility};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// An element that passed every check
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedNode {
    pub key: String,
    pub type_name: String,
    pub kind: ComponentKind,
    /// Props with defaults filled in
    pub props: Map<String, Value>,
    pub children: Vec<String>,
    pub parent: Option<String>,
    pub visibility: Option<Visibility>,
    /// Binding props and their parsed paths, in schema declaration order
    pub bindings: Vec<(String, BindingPath)>,
    /// Action named by the `action` prop, if any
    pub action: Option<String>,
}

/// A tree that satisfies every structural and schema invariant
///
/// Only [`validate_tree`] can build one. It is never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTree {
    root: String,
    /// Depth-first order from the root
    nodes: IndexMap<String, ValidatedNode>,
}

impl ValidatedTree {
    pub fn root(&self) -> &ValidatedNode {
        // The root is always the first node visited
        &self.nodes[0]
    }

    pub fn root_key(&self) -> &str {
        &self.root
    }

    pub fn node(&self, key: &str) -> Option<&ValidatedNode> {
        self.nodes.get(key)
    }

    /// Nodes in depth-first order
    pub fn nodes(&self) -> impl Iterator<Item = &ValidatedNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node itself followed by each ancestor up to the root
    pub fn lineage<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a ValidatedNode> + 'a {
        let mut next = self.nodes.get(key);
        std::iter::from_fn(move || {
            let current = next?;
            next = current.parent.as_deref().and_then(|p| self.nodes.get(p));
            Some(current)
        })
    }
}

/// Validate a tree with the default configuration
///
/// # Arguments
///
/// * `tree` - The tree as received from the generator
/// * `catalog` - The catalog it must conform to
///
/// # Returns
///
/// * `Ok(ValidatedTree)` - The tree is safe to render
/// * `Err(ValidationReport)` - Every problem found, in deterministic order
pub fn validate_tree(tree: &UITree, catalog: &Catalog) -> Result<ValidatedTree, ValidationReport> {
    validate_tree_with(tree, catalog, &EngineConfig::default())
}

/// Validate a tree with an explicit configuration
pub fn validate_tree_with(
    tree: &UITree,
    catalog: &Catalog,
    config: &EngineConfig,
) -> Result<ValidatedTree, ValidationReport> {
    tracing::info!(
        "[VALIDATE] Validating tree rooted at '{}' ({} elements)",
        tree.root,
        tree.elements.len()
    );

    let mut validator = TreeValidator {
        tree,
        catalog,
        config,
        diagnostics: Vec::new(),
    };

    let nodes = validator.run();
    let diagnostics = validator.diagnostics;

    if !diagnostics.is_empty() {
        tracing::info!("[VALIDATE] Rejected with {} diagnostic(s)", diagnostics.len());
        return Err(ValidationReport { diagnostics });
    }

    tracing::info!("[VALIDATE] Tree valid ({} nodes)", nodes.len());
    Ok(ValidatedTree {
        root: tree.root.clone(),
        nodes,
    })
}

enum Frame<'t> {
    Enter { key: &'t str, parent: Option<&'t str> },
    Exit(&'t str),
}

struct TreeValidator<'a> {
    tree: &'a UITree,
    catalog: &'a Catalog,
    config: &'a EngineConfig,
    diagnostics: Vec<TreeDiagnostic>,
}

impl<'a> TreeValidator<'a> {
    fn structure(&mut self, error: TreeStructureError) {
        tracing::debug!("[VALIDATE] {}", error);
        self.diagnostics.push(TreeDiagnostic::Structure(error));
    }

    fn run(&mut self) -> IndexMap<String, ValidatedNode> {
        let tree = self.tree;
        let mut validated = IndexMap::new();

        // Phase 1: size ceiling
        if tree.elements.len() > self.config.max_nodes {
            self.structure(TreeStructureError::NodeCountExceeded {
                count: tree.elements.len(),
                max: self.config.max_nodes,
            });
            return validated;
        }

        // Phase 2: key consistency
        for (key, node) in &tree.elements {
            if node.key != *key {
                self.structure(TreeStructureError::KeyMismatch {
                    key: key.clone(),
                    declared: node.key.clone(),
                });
            }
        }

        // Phase 3: root
        let Some(root) = tree.elements.get(&tree.root) else {
            self.structure(TreeStructureError::MissingRoot {
                root: tree.root.clone(),
            });
            return validated;
        };
        if let Some(parent) = &root.parent_key {
            self.structure(TreeStructureError::RootHasParent {
                root: tree.root.clone(),
                parent: parent.clone(),
            });
        }

        // Phase 4: depth-first traversal
        let mut visited: HashSet<&str> = HashSet::new();
        let mut on_path: HashSet<&str> = HashSet::new();
        let mut stack = vec![Frame::Enter {
            key: tree.root.as_str(),
            parent: None,
        }];

        while let Some(frame) = stack.pop() {
            let (key, parent) = match frame {
                Frame::Exit(key) => {
                    on_path.remove(key);
                    continue;
                }
                Frame::Enter { key, parent } => (key, parent),
            };

            let parent_key = parent.unwrap_or_default();
            if on_path.contains(key) {
                self.structure(TreeStructureError::Cycle {
                    parent: parent_key.to_string(),
                    child: key.to_string(),
                });
                continue;
            }
            if visited.contains(key) {
                self.structure(TreeStructureError::SharedChild {
                    parent: parent_key.to_string(),
                    child: key.to_string(),
                });
                continue;
            }
            let Some(node) = tree.elements.get(key) else {
                self.structure(TreeStructureError::MissingChild {
                    parent: parent_key.to_string(),
                    child: key.to_string(),
                });
                continue;
            };
            if parent.is_some() && node.parent_key.as_deref() != parent {
                self.structure(TreeStructureError::ParentMismatch {
                    parent: parent_key.to_string(),
                    child: key.to_string(),
                    declared: node.parent_key.clone(),
                });
            }

            visited.insert(key);
            on_path.insert(key);

            if let Some(checked) = self.check_node(node) {
                validated.insert(key.to_string(), checked);
            }

            stack.push(Frame::Exit(key));
            for child in node.children.iter().rev() {
                stack.push(Frame::Enter {
                    key: child.as_str(),
                    parent: Some(key),
                });
            }
        }

        // Phase 5: orphans, walking each detached subtree for its own cycles
        for key in tree.elements.keys() {
            if !visited.contains(key.as_str()) {
                self.sweep_detached(key, &mut visited);
            }
        }

        validated
    }

    /// Walk elements the root never reached. Each one is an orphan; a link
    /// back onto the current path is a cycle among them.
    fn sweep_detached(&mut self, start: &'a str, visited: &mut HashSet<&'a str>) {
        let tree = self.tree;
        let mut on_path: HashSet<&str> = HashSet::new();
        let mut stack = vec![Frame::Enter {
            key: start,
            parent: None,
        }];

        while let Some(frame) = stack.pop() {
            let (key, parent) = match frame {
                Frame::Exit(key) => {
                    on_path.remove(key);
                    continue;
                }
                Frame::Enter { key, parent } => (key, parent),
            };

            if on_path.contains(key) {
                self.structure(TreeStructureError::Cycle {
                    parent: parent.unwrap_or_default().to_string(),
                    child: key.to_string(),
                });
                continue;
            }
            // Reached earlier, or a dangling reference out of an orphan
            let Some((key, node)) = tree.elements.get_key_value(key) else {
                continue;
            };
            if !visited.insert(key.as_str()) {
                continue;
            }

            self.structure(TreeStructureError::Orphan { key: key.clone() });
            on_path.insert(key.as_str());

            stack.push(Frame::Exit(key.as_str()));
            for child in node.children.iter().rev() {
                stack.push(Frame::Enter {
                    key: child.as_str(),
                    parent: Some(key.as_str()),
                });
            }
        }
    }

    /// Per-node checks. Returns the validated node only when it is clean.
    fn check_node(&mut self, node: &ElementNode) -> Option<ValidatedNode> {
        let catalog = self.catalog;
        let config = self.config;
        let before = self.diagnostics.len();

        let Some(kind) = catalog.kind_of(&node.type_name) else {
            self.structure(TreeStructureError::UnknownType {
                key: node.key.clone(),
                type_name: node.type_name.clone(),
            });
            return None;
        };
        let spec = catalog.component_by_kind(kind)?;

        let options = ValidateOptions {
            reject_unknown: config.reject_unknown_props,
        };
        let props = match catalog.validate_props_with(&node.type_name, &node.props, options) {
            Ok(props) => Some(props),
            Err(PropsError::Invalid(errors)) => {
                for error in errors {
                    self.diagnostics.push(TreeDiagnostic::Schema {
                        key: node.key.clone(),
                        error,
                    });
                }
                None
            }
            Err(PropsError::UnknownComponent(_)) => None,
        };

        if !spec.has_children && !node.children.is_empty() {
            self.structure(TreeStructureError::ChildrenNotAllowed {
                key: node.key.clone(),
                type_name: node.type_name.clone(),
                count: node.children.len(),
            });
        }

        let visibility = match &node.visible {
            None => None,
            Some(condition) => match condition.compile(config.max_condition_depth) {
                Ok(v) => Some(v),
                Err(issues) => {
                    for issue in issues {
                        match issue {
                            ConditionIssue::Binding(error) => self.diagnostics.push(TreeDiagnostic::Binding {
                                key: node.key.clone(),
                                error,
                            }),
                            ConditionIssue::TooDeep => self.structure(TreeStructureError::ConditionTooDeep {
                                key: node.key.clone(),
                                max: config.max_condition_depth,
                            }),
                        }
                    }
                    None
                }
            },
        };

        let props = props?;
        if self.diagnostics.len() != before {
            return None;
        }

        let bindings = spec
            .binding_props()
            .filter_map(|name| {
                let raw = props.get(name)?.as_str()?;
                BindingPath::parse(raw).ok().map(|path| (name.to_string(), path))
            })
            .collect();
        let action = props.get("action").and_then(Value::as_str).map(str::to_string);

        tracing::debug!("[VALIDATE] Node '{}' ({}) ok", node.key, node.type_name);

        Some(ValidatedNode {
            key: node.key.clone(),
            type_name: node.type_name.clone(),
            kind,
            props,
            children: node.children.clone(),
            parent: node.parent_key.clone(),
            visibility,
            bindings,
            action,
        })
    }
}
