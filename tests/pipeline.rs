//! End-to-end checks over the server purchase scenario: validation, binding,
//! rendering, actions and prompt compilation working together.

use jrender::demo::{server_catalog, server_form_tree, server_initial_data};
use jrender::{
    compile_catalog, dispatch_action, validate_tree, ActionError, ActionHandlers, ComponentRegistry, DataStore,
    ElementNode, ElementView, LiveView, PropsError, RegistryMode, Renderer, TreeDiagnostic, TreeStructureError,
    UITree, VerifiedRegistry, VisibilityCondition,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use proptest::sample::Index;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

fn outline_registry() -> VerifiedRegistry<String> {
    ComponentRegistry::new()
        .with_fallback(|view: &ElementView<'_>, children: Vec<String>| {
            if children.is_empty() {
                view.key.to_string()
            } else {
                format!("{}[{}]", view.key, children.join(","))
            }
        })
        .verify(&server_catalog().unwrap(), RegistryMode::Lenient)
        .ok()
        .unwrap()
}

#[test]
fn test_server_form_validates_and_renders() {
    let catalog = server_catalog().unwrap();
    let tree = validate_tree(&server_form_tree(), &catalog).unwrap();
    assert_eq!(tree.len(), 5);
    assert_eq!(tree.root_key(), "form-card");

    // Defaults are filled in during validation
    assert_eq!(tree.node("confirm-btn").unwrap().props["variant"], json!("primary"));

    let registry = outline_registry();
    let store = DataStore::new(server_initial_data());
    let pass = Renderer::new(&tree, &registry).render(&store);
    assert_eq!(
        pass.output.as_deref(),
        Some("form-card[cpu-select,memory-select,storage-select,confirm-btn]")
    );
}

#[test]
fn test_validation_is_repeatable() {
    let catalog = server_catalog().unwrap();
    let mut tree = server_form_tree();
    tree.elements.get_mut("cpu-select").unwrap().props = json!({ "options": [], "valuePath": "/server/cpu" });
    tree.elements.get_mut("memory-select").unwrap().parent_key = Some("cpu-select".into());

    let first = validate_tree(&tree, &catalog).unwrap_err();
    let second = validate_tree(&tree, &catalog).unwrap_err();
    assert_eq!(first, second);
    assert!(first.diagnostics.len() >= 2);
}

#[test]
fn test_missing_select_label_is_a_single_field_error() {
    let catalog = server_catalog().unwrap();
    let props = json!({ "options": ["2核", "4核"], "valuePath": "/server/cpu" });

    let Err(PropsError::Invalid(errors)) = catalog.validate_props("Select", &props) else {
        panic!("missing label must be rejected");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "label");
    assert_eq!(errors[0].expected, "string");
}

#[test]
fn test_every_bad_field_is_reported() {
    let catalog = server_catalog().unwrap();
    let props = json!({ "label": 7, "options": ["ok", 3], "valuePath": "server/cpu" });

    let Err(PropsError::Invalid(errors)) = catalog.validate_props("Select", &props) else {
        panic!("invalid props must be rejected");
    };
    let paths: Vec<_> = errors.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["label", "options[1]", "valuePath"]);
}

#[test]
fn test_cycle_and_orphan_are_distinguished() {
    let catalog = server_catalog().unwrap();
    let tree = UITree::from_elements(
        "root",
        [
            ElementNode::new("root", "Grid", json!({})).with_children(["a"]),
            ElementNode::new("a", "Grid", json!({})).with_parent("root").with_children(["root"]),
            ElementNode::new("stray", "Text", json!({ "content": "x" })).with_parent("root"),
        ],
    );

    let report = validate_tree(&tree, &catalog).unwrap_err();
    let structure: Vec<_> = report.structure_errors().collect();
    assert!(structure
        .iter()
        .any(|e| matches!(e, TreeStructureError::Cycle { child, .. } if child == "root")));
    assert!(structure
        .iter()
        .any(|e| matches!(e, TreeStructureError::Orphan { key } if key == "stray")));
}

#[test]
fn test_tree_round_trips_through_json() {
    let source = server_form_tree().to_json_pretty().unwrap();
    let parsed = UITree::from_json_str(&source).unwrap();
    assert_eq!(parsed, server_form_tree());
    assert!(source.contains("\"parentKey\": \"form-card\""));
}

#[test]
fn test_binding_round_trip_and_absence() {
    let mut store = DataStore::default();
    store.write_str("/server/cpu", json!("8核")).unwrap();

    assert_eq!(store.read_str("/server/cpu").unwrap().cloned(), Some(json!("8核")));
    assert!(!store.read_str("/server/memory").unwrap().is_present());

    store.write_str("/server/memory", Value::Null).unwrap();
    assert_eq!(store.read_str("/server/memory").unwrap().cloned(), Some(Value::Null));
}

#[test]
fn test_confirm_order_dispatch() {
    let catalog = server_catalog().unwrap();
    let tree = validate_tree(&server_form_tree(), &catalog).unwrap();
    let store = DataStore::new(server_initial_data());

    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    let mut handlers = ActionHandlers::new().on("confirm_order", move |inv| {
        assert_eq!(inv.params, json!({}));
        *counter.lock().unwrap() += 1;
        Ok(())
    });

    dispatch_action(&catalog, &tree, &store, &mut handlers, "confirm-btn", None).unwrap();
    assert_eq!(*calls.lock().unwrap(), 1);

    // A generator that invents an action passes validation but never reaches a handler
    let mut invented = server_form_tree();
    invented.elements.get_mut("confirm-btn").unwrap().props["action"] = json!("unknown_action");
    let invented = validate_tree(&invented, &catalog).unwrap();
    let err = dispatch_action(&catalog, &invented, &store, &mut handlers, "confirm-btn", None).unwrap_err();
    assert!(matches!(err, ActionError::UnknownAction { ref action, .. } if action == "unknown_action"));
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[test]
fn test_visibility_follows_store_writes() {
    let catalog = server_catalog().unwrap();
    let mut tree = server_form_tree();
    tree.elements
        .get_mut("form-card")
        .unwrap()
        .children
        .push("gpu-note".into());
    tree.elements.insert(
        "gpu-note".into(),
        ElementNode::new("gpu-note", "Text", json!({ "content": "GPU 可选" }))
            .with_parent("form-card")
            .with_visibility(VisibilityCondition::equals("/server/cpu", "16核")),
    );
    let tree = validate_tree(&tree, &catalog).unwrap();
    let registry = outline_registry();

    let mut store = DataStore::new(server_initial_data());
    let mut view = LiveView::attach(Renderer::new(&tree, &registry), &mut store);
    assert!(!view.current(&store).is_rendered("gpu-note"));

    store.write_str("/server/cpu", json!("16核")).unwrap();
    assert!(view.current(&store).is_rendered("gpu-note"));

    store.write_str("/server/cpu", json!("4核")).unwrap();
    assert!(!view.current(&store).is_rendered("gpu-note"));
    assert!(view.detach(&mut store));
}

#[test]
fn test_visibility_path_errors_surface_at_validation() {
    let catalog = server_catalog().unwrap();
    let mut tree = server_form_tree();
    tree.elements.get_mut("confirm-btn").unwrap().visible = Some(VisibilityCondition::exists("server//cpu"));

    let report = validate_tree(&tree, &catalog).unwrap_err();
    assert!(report
        .diagnostics
        .iter()
        .all(|d| matches!(d, TreeDiagnostic::Binding { key, .. } if key == "confirm-btn")));
}

#[test]
fn test_compiled_prompt_is_stable_and_complete() {
    let catalog = server_catalog().unwrap();
    let first = compile_catalog(&catalog).unwrap();
    let second = compile_catalog(&catalog).unwrap();
    assert_eq!(first, second);

    for component in catalog.components() {
        assert!(first.text.contains(&format!("### {}\n", component.name)));
    }
    assert!(first.text.contains("### confirm_order\nDescription: 确认订单配置\n"));

    let dump: Value = serde_json::from_str(&first.catalog_json).unwrap();
    assert_eq!(dump["actions"]["confirm_order"]["description"], json!("确认订单配置"));
    assert_eq!(dump["components"]["Card"]["hasChildren"], json!(true));
}

/// Ways a generated tree's links can be broken
#[derive(Debug, Clone, Copy)]
enum Corruption {
    /// An element names the wrong parent
    WrongParent,
    /// An element is listed a second time, possibly under itself or a descendant
    ExtraChild,
    /// An element is dropped from its parent's child list
    Unlisted,
}

fn corruption() -> impl Strategy<Value = Corruption> {
    prop_oneof![
        Just(Corruption::WrongParent),
        Just(Corruption::ExtraChild),
        Just(Corruption::Unlisted),
    ]
}

/// Random tree of `Grid`s: element `i` hangs under one of `0..i`
fn random_tree(parents: &[Index], damage: Option<(Corruption, Index, Index)>) -> UITree {
    let n = parents.len();
    let key = |i: usize| format!("g{}", i);
    let mut elements: Vec<ElementNode> = (0..n)
        .map(|i| ElementNode::new(key(i), "Grid", json!({})))
        .collect();
    for i in 1..n {
        let parent = parents[i].index(i);
        elements[i].parent_key = Some(key(parent));
        elements[parent].children.push(key(i));
    }

    if let Some((kind, a, b)) = damage {
        if n > 1 {
            let a = 1 + a.index(n - 1);
            let b = b.index(n);
            match kind {
                Corruption::WrongParent => elements[a].parent_key = Some(key(b)),
                Corruption::ExtraChild => elements[b].children.push(key(a)),
                Corruption::Unlisted => {
                    let target = key(a);
                    for element in &mut elements {
                        element.children.retain(|child| *child != target);
                    }
                }
            }
        }
    }

    UITree::from_elements(key(0), elements)
}

proptest! {
    #[test]
    fn prop_validation_is_idempotent_and_sound(
        parents in prop::collection::vec(any::<Index>(), 1..40),
        damage in prop::option::of((corruption(), any::<Index>(), any::<Index>())),
    ) {
        let catalog = server_catalog().unwrap();
        let tree = random_tree(&parents, damage);

        let first = validate_tree(&tree, &catalog);
        let second = validate_tree(&tree, &catalog);
        prop_assert_eq!(&first, &second);
        if damage.is_none() {
            prop_assert!(first.is_ok());
        }

        if let Ok(validated) = first {
            let mut seen = HashSet::new();
            for node in validated.nodes() {
                prop_assert!(seen.insert(node.key.clone()), "{} visited twice", node.key);
                for child in &node.children {
                    let child = validated.node(child).unwrap();
                    prop_assert_eq!(child.parent.as_deref(), Some(node.key.as_str()));
                }
            }
            prop_assert_eq!(seen.len(), tree.elements.len());
            prop_assert_eq!(validated.root_key(), "g0");
        }
    }

    #[test]
    fn prop_written_values_read_back(
        keys in prop::collection::vec("[a-z]{1,6}", 1..5),
        value in any::<i64>(),
    ) {
        let path = format!("/{}", keys.join("/"));
        let mut store = DataStore::new(server_initial_data());
        store.write_str(&path, json!(value)).unwrap();
        prop_assert_eq!(store.read_str(&path).unwrap().cloned(), Some(json!(value)));
    }

    #[test]
    fn prop_grid_columns_bounds(columns in -10.0f64..10.0) {
        let result = server_catalog().unwrap().validate_props("Grid", &json!({ "columns": columns }));
        prop_assert_eq!(result.is_ok(), (1.0..=4.0).contains(&columns));
    }

    #[test]
    fn prop_chain_depth_never_overflows(depth in 1usize..400) {
        let mut elements = Vec::with_capacity(depth);
        for i in 0..depth {
            let mut node = ElementNode::new(format!("n{}", i), "Grid", json!({}));
            if i > 0 {
                node = node.with_parent(format!("n{}", i - 1));
            }
            if i + 1 < depth {
                node = node.with_children([format!("n{}", i + 1)]);
            }
            elements.push(node);
        }
        let tree = UITree::from_elements("n0", elements);
        let validated = validate_tree(&tree, &server_catalog().unwrap()).unwrap();
        prop_assert_eq!(validated.len(), depth);
    }
}
