//! # Catalog
//!
//! The immutable registry of component types and actions a UI tree may use.
//!
//! A catalog is built once and never mutated. Definition order is fixed at
//! construction and is the enumeration order everywhere else (renderer
//! lookup table, compiled prompt, catalog dump). Share it across threads
//! behind an `Arc`; every method takes `&self`.

use crate::error::{CatalogError, PropsError, Result};
use crate::schema::{Schema, ValidateOptions};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Dense index of a component type, assigned in definition order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentKind(usize);

impl ComponentKind {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSpec {
    pub name: String,
    /// Object descriptor for the element's props
    pub props: Schema,
    pub has_children: bool,
}

impl ComponentSpec {
    pub fn new(name: impl Into<String>, props: Schema) -> Self {
        Self {
            name: name.into(),
            props,
            has_children: false,
        }
    }

    /// Mark the type as a container
    pub fn with_children(mut self) -> Self {
        self.has_children = true;
        self
    }

    /// Names of props that hold data-store bindings, in declaration order
    pub fn binding_props(&self) -> impl Iterator<Item = &str> {
        self.props
            .fields()
            .into_iter()
            .flatten()
            .filter(|(_, schema)| schema.is_binding())
            .map(|(name, _)| name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionSpec {
    pub name: String,
    pub description: String,
    pub params: Schema,
}

impl ActionSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, params: Schema) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params,
        }
    }
}

/// Registry of permitted component types and actions
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    components: IndexMap<String, ComponentSpec>,
    actions: IndexMap<String, ActionSpec>,
}

/// Build a catalog, rejecting duplicate names and malformed descriptors
///
/// # Arguments
///
/// * `components` - Component types, in definition order
/// * `actions` - Actions, in definition order
///
/// # Returns
///
/// * `Ok(Catalog)` - The immutable catalog
/// * `Err(CatalogError)` - The first definition mistake found
pub fn create_catalog<C, A>(components: C, actions: A) -> Result<Catalog, CatalogError>
where
    C: IntoIterator<Item = ComponentSpec>,
    A: IntoIterator<Item = ActionSpec>,
{
    let mut component_map = IndexMap::new();
    for spec in components {
        if spec.props.fields().is_none() {
            return Err(CatalogError::PropsNotObject(spec.name));
        }
        spec.props.lint(&spec.name)?;
        if component_map.contains_key(&spec.name) {
            return Err(CatalogError::DuplicateComponent(spec.name));
        }
        component_map.insert(spec.name.clone(), spec);
    }

    let mut action_map = IndexMap::new();
    for spec in actions {
        spec.params.lint(&spec.name)?;
        if action_map.contains_key(&spec.name) {
            return Err(CatalogError::DuplicateAction(spec.name));
        }
        action_map.insert(spec.name.clone(), spec);
    }

    tracing::info!(
        "[JRENDER] Catalog built: {} component types, {} actions",
        component_map.len(),
        action_map.len()
    );

    Ok(Catalog {
        components: component_map,
        actions: action_map,
    })
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Build from the mapping form used by catalog definition files
    pub fn from_definition(definition: CatalogDefinition) -> Result<Self, CatalogError> {
        let components = definition.components.into_iter().map(|(name, def)| ComponentSpec {
            name,
            props: def.props,
            has_children: def.has_children,
        });
        let actions = definition
            .actions
            .into_iter()
            .map(|(name, def)| ActionSpec::new(name, def.description, def.params));
        create_catalog(components, actions)
    }

    /// Parse a catalog definition document
    pub fn from_json_str(source: &str) -> Result<Self> {
        let definition: CatalogDefinition = serde_json::from_str(source)?;
        Ok(Self::from_definition(definition)?)
    }

    /// The mapping form of this catalog, in definition order
    pub fn to_definition(&self) -> CatalogDefinition {
        CatalogDefinition {
            components: self
                .components
                .values()
                .map(|spec| {
                    (
                        spec.name.clone(),
                        ComponentDefinition {
                            props: spec.props.clone(),
                            has_children: spec.has_children,
                        },
                    )
                })
                .collect(),
            actions: self
                .actions
                .values()
                .map(|spec| {
                    (
                        spec.name.clone(),
                        ActionDefinition {
                            description: spec.description.clone(),
                            params: spec.params.clone(),
                        },
                    )
                })
                .collect(),
        }
    }

    pub fn component(&self, type_name: &str) -> Option<&ComponentSpec> {
        self.components.get(type_name)
    }

    pub fn kind_of(&self, type_name: &str) -> Option<ComponentKind> {
        self.components.get_index_of(type_name).map(ComponentKind)
    }

    pub fn component_by_kind(&self, kind: ComponentKind) -> Option<&ComponentSpec> {
        self.components.get_index(kind.0).map(|(_, spec)| spec)
    }

    /// Component types in definition order
    pub fn components(&self) -> impl Iterator<Item = &ComponentSpec> {
        self.components.values()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn action(&self, name: &str) -> Option<&ActionSpec> {
        self.actions.get(name)
    }

    /// Actions in definition order
    pub fn actions(&self) -> impl Iterator<Item = &ActionSpec> {
        self.actions.values()
    }

    /// Validate an element's props against its type's schema
    ///
    /// Reports every failing field, not just the first. On success the
    /// returned props have defaults filled in.
    pub fn validate_props(&self, type_name: &str, props: &Value) -> Result<Map<String, Value>, PropsError> {
        self.validate_props_with(type_name, props, ValidateOptions::default())
    }

    pub fn validate_props_with(
        &self,
        type_name: &str,
        props: &Value,
        options: ValidateOptions,
    ) -> Result<Map<String, Value>, PropsError> {
        let spec = self
            .component(type_name)
            .ok_or_else(|| PropsError::UnknownComponent(type_name.to_string()))?;
        match spec.props.validate_with(Some(props), options) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Ok(Map::new()),
            Err(errors) => Err(PropsError::Invalid(errors)),
        }
    }
}

/// Incremental catalog construction
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    components: Vec<ComponentSpec>,
    actions: Vec<ActionSpec>,
}

impl CatalogBuilder {
    /// Leaf component type
    pub fn component(mut self, name: impl Into<String>, props: Schema) -> Self {
        self.components.push(ComponentSpec::new(name, props));
        self
    }

    /// Component type that accepts children
    pub fn container(mut self, name: impl Into<String>, props: Schema) -> Self {
        self.components.push(ComponentSpec::new(name, props).with_children());
        self
    }

    pub fn action(mut self, name: impl Into<String>, description: impl Into<String>, params: Schema) -> Self {
        self.actions.push(ActionSpec::new(name, description, params));
        self
    }

    pub fn build(self) -> Result<Catalog, CatalogError> {
        create_catalog(self.components, self.actions)
    }
}

/// Catalog definition surface (`components` / `actions` mappings)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogDefinition {
    #[serde(default)]
    pub components: IndexMap<String, ComponentDefinition>,
    #[serde(default)]
    pub actions: IndexMap<String, ActionDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ComponentDefinition {
    pub props: Schema,
    #[serde(default)]
    pub has_children: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionDefinition {
    #[serde(default)]
    pub description: String,
    #[serde(default = "Schema::empty_object")]
    pub params: Schema,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::server_catalog;
    use serde_json::json;

    #[test]
    fn test_rejects_duplicates() {
        let err = Catalog::builder()
            .component("Text", Schema::object([("content", Schema::string())]))
            .component("Text", Schema::empty_object())
            .build()
            .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateComponent("Text".into()));

        let err = Catalog::builder()
            .action("confirm_order", "", Schema::empty_object())
            .action("confirm_order", "again", Schema::empty_object())
            .build()
            .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateAction("confirm_order".into()));
    }

    #[test]
    fn test_rejects_non_object_props() {
        let err = Catalog::builder()
            .component("Label", Schema::string())
            .build()
            .unwrap_err();
        assert_eq!(err, CatalogError::PropsNotObject("Label".into()));
    }

    #[test]
    fn test_kinds_follow_definition_order() {
        let catalog = server_catalog().unwrap();
        let names: Vec<_> = catalog.components().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Card", "Metric", "Button", "Text", "Grid", "Chart", "Select"]);
        let select = catalog.kind_of("Select").unwrap();
        assert_eq!(select.index(), 6);
        assert_eq!(catalog.component_by_kind(select).unwrap().name, "Select");
        assert!(catalog.kind_of("Slider").is_none());
    }

    #[test]
    fn test_validate_props() {
        let catalog = server_catalog().unwrap();
        let props = catalog
            .validate_props("Button", &json!({ "label": "确认配置", "action": "confirm_order" }))
            .unwrap();
        assert_eq!(props["variant"], json!("primary"));

        assert_eq!(
            catalog.validate_props("Slider", &json!({})),
            Err(PropsError::UnknownComponent("Slider".into()))
        );

        let Err(PropsError::Invalid(errors)) = catalog.validate_props("Grid", &json!({ "columns": 9 })) else {
            panic!("expected schema errors");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "columns");
    }

    #[test]
    fn test_binding_props() {
        let catalog = server_catalog().unwrap();
        let select = catalog.component("Select").unwrap();
        assert_eq!(select.binding_props().collect::<Vec<_>>(), vec!["valuePath"]);
        let card = catalog.component("Card").unwrap();
        assert_eq!(card.binding_props().count(), 0);
    }

    #[test]
    fn test_definition_document() {
        let catalog = Catalog::from_json_str(
            r#"{
                "components": {
                    "Card": { "props": { "type": "object", "fields": { "title": { "type": "string" } } }, "hasChildren": true },
                    "Text": { "props": { "type": "object", "fields": {} } }
                },
                "actions": { "refresh": { "description": "Reload data" } }
            }"#,
        )
        .unwrap();

        assert!(catalog.component("Card").unwrap().has_children);
        assert!(!catalog.component("Text").unwrap().has_children);
        assert_eq!(catalog.action("refresh").unwrap().params, Schema::empty_object());

        let again = Catalog::from_definition(catalog.to_definition()).unwrap();
        assert_eq!(again, catalog);
    }
}
