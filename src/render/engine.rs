//! # Render Pass
//!
//! Walks a validated tree against a data store snapshot and hands each
//! visible element to its registered renderer.
//!
//! Each node moves through `Pending -> Validated -> Bound -> Rendered` within
//! one pass, or stops at `Hidden` when its visibility condition is false.
//! A hidden node's subtree is never entered. Output is a pure function of
//! the tree, the store contents and the registry.

use super::registry::{BoundValue, ElementView, VerifiedRegistry};
use crate::binding::DataStore;
use crate::error::RegistryError;
use crate::validator::ValidatedTree;
use indexmap::IndexMap;

/// Where a node ended up in one render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Not reached (inside a hidden subtree)
    Pending,
    Validated,
    /// Visibility condition false; terminal for this pass
    Hidden,
    Bound,
    Rendered,
}

/// Result of one render pass
#[derive(Debug, Clone)]
pub struct RenderPass<O> {
    /// Rendered root, or `None` when the root itself is hidden
    pub output: Option<O>,
    /// Final state of every node, in depth-first order
    pub states: IndexMap<String, NodeState>,
    /// Registry drift observed during or before this pass
    pub warnings: Vec<RegistryError>,
    /// Store revision the pass was computed from
    pub revision: u64,
}

impl<O> RenderPass<O> {
    pub fn state(&self, key: &str) -> Option<NodeState> {
        self.states.get(key).copied()
    }

    pub fn is_rendered(&self, key: &str) -> bool {
        self.state(key) == Some(NodeState::Rendered)
    }

    /// Keys that made it into the output, in depth-first order
    pub fn rendered_keys(&self) -> impl Iterator<Item = &str> {
        self.states
            .iter()
            .filter(|(_, state)| **state == NodeState::Rendered)
            .map(|(key, _)| key.as_str())
    }
}

enum Frame<'t> {
    Enter(&'t str),
    Exit {
        key: &'t str,
        mark: usize,
        bindings: Vec<BoundValue>,
    },
}

/// Renders one validated tree through one verified registry
pub struct Renderer<'a, O> {
    tree: &'a ValidatedTree,
    registry: &'a VerifiedRegistry<O>,
}

impl<'a, O> Renderer<'a, O> {
    pub fn new(tree: &'a ValidatedTree, registry: &'a VerifiedRegistry<O>) -> Self {
        Self { tree, registry }
    }

    pub fn tree(&self) -> &'a ValidatedTree {
        self.tree
    }

    /// Render the tree against the current store contents
    pub fn render(&self, store: &DataStore) -> RenderPass<O> {
        tracing::debug!(
            "[RENDER] Render pass over {} nodes at revision {}",
            self.tree.len(),
            store.revision()
        );

        let mut states: IndexMap<String, NodeState> = self
            .tree
            .nodes()
            .map(|node| (node.key.clone(), NodeState::Pending))
            .collect();
        let mut warnings = self.registry.warnings().to_vec();
        let mut outputs: Vec<O> = Vec::new();
        let mut stack = vec![Frame::Enter(self.tree.root_key())];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(key) => {
                    let Some(node) = self.tree.node(key) else {
                        continue;
                    };
                    states.insert(key.to_string(), NodeState::Validated);

                    if let Some(visibility) = &node.visibility {
                        if !visibility.evaluate(store) {
                            tracing::debug!("[RENDER] '{}' hidden", key);
                            states.insert(key.to_string(), NodeState::Hidden);
                            continue;
                        }
                    }

                    let bindings = node
                        .bindings
                        .iter()
                        .map(|(prop, path)| BoundValue {
                            prop: prop.clone(),
                            path: path.clone(),
                            value: store.read(path).cloned(),
                        })
                        .collect();
                    states.insert(key.to_string(), NodeState::Bound);

                    stack.push(Frame::Exit {
                        key,
                        mark: outputs.len(),
                        bindings,
                    });
                    for child in node.children.iter().rev() {
                        stack.push(Frame::Enter(child.as_str()));
                    }
                }
                Frame::Exit { key, mark, bindings } => {
                    let children = outputs.split_off(mark);
                    let Some(node) = self.tree.node(key) else {
                        continue;
                    };
                    let Some(render) = self.registry.renderer(node.kind, &node.type_name) else {
                        tracing::warn!("[RENDER] No renderer for '{}' ({})", key, node.type_name);
                        warnings.push(RegistryError::MissingRenderer {
                            type_name: node.type_name.clone(),
                        });
                        continue;
                    };

                    let view = ElementView {
                        key,
                        type_name: &node.type_name,
                        kind: node.kind,
                        props: &node.props,
                        bindings: &bindings,
                    };
                    outputs.push(render(&view, children));
                    states.insert(key.to_string(), NodeState::Rendered);
                }
            }
        }

        RenderPass {
            output: outputs.pop(),
            states,
            warnings,
            revision: store.revision(),
        }
    }
}
