//! # Prompt Text Generator
//!
//! Generates the plain-text grounding document handed to the external UI
//! generator. Output depends only on the catalog and the limits passed in,
//! and enumerates everything in catalog definition order.

use crate::catalog::{ActionSpec, Catalog, ComponentSpec};
use crate::schema::Schema;

/// Grounding-text generator for one catalog
pub struct PromptTextGenerator<'a> {
    catalog: &'a Catalog,
    max_nodes: usize,
}

impl<'a> PromptTextGenerator<'a> {
    pub fn new(catalog: &'a Catalog, max_nodes: usize) -> Self {
        Self { catalog, max_nodes }
    }

    /// Generate the complete document
    pub fn generate_prompt(&self) -> String {
        let mut text = String::new();

        text.push_str("# UI Component Catalog\n\n");
        text.push_str("Describe the user interface as a JSON UI tree. Use only the component types\n");
        text.push_str("and actions listed below; anything else is rejected before rendering.\n\n");

        text.push_str(&self.generate_tree_format_section());
        text.push_str(&self.generate_visibility_section());

        text.push_str(&format!("## Components ({})\n\n", self.catalog.component_count()));
        for component in self.catalog.components() {
            text.push_str(&self.generate_component(component));
        }

        let actions: Vec<_> = self.catalog.actions().collect();
        text.push_str(&format!("## Actions ({})\n\n", actions.len()));
        if actions.is_empty() {
            text.push_str("No actions are available.\n");
        } else {
            text.push_str("Trigger an action by giving an element an \"action\" prop naming it.\n\n");
            for action in actions {
                text.push_str(&self.generate_action(action));
            }
        }

        text
    }

    fn generate_tree_format_section(&self) -> String {
        let mut text = String::new();
        text.push_str("## Tree Format\n\n");
        text.push_str("{\n");
        text.push_str("  \"root\": \"<key of the root element>\",\n");
        text.push_str("  \"elements\": {\n");
        text.push_str("    \"<key>\": {\n");
        text.push_str("      \"key\": \"<same key>\",\n");
        text.push_str("      \"type\": \"<component type>\",\n");
        text.push_str("      \"props\": { ... },\n");
        text.push_str("      \"children\": [\"<child key>\", ...],\n");
        text.push_str("      \"parentKey\": \"<parent key or null>\"\n");
        text.push_str("    }\n");
        text.push_str("  }\n");
        text.push_str("}\n\n");
        text.push_str("Rules:\n");
        text.push_str("- Keys are unique. Every element is reachable from the root exactly once.\n");
        text.push_str("- \"children\" lists child keys in display order; each child's \"parentKey\" names the element listing it.\n");
        text.push_str("- The root's \"parentKey\" is null.\n");
        text.push_str("- Only component types that accept children may list children.\n");
        text.push_str(&format!("- At most {} elements per tree.\n\n", self.max_nodes));
        text
    }

    fn generate_visibility_section(&self) -> String {
        let mut text = String::new();
        text.push_str("## Visibility\n\n");
        text.push_str("An element may carry a \"visible\" condition over the session data. When it is\n");
        text.push_str("false the element and its children are not shown. Conditions:\n");
        text.push_str("- {\"exists\": {\"path\": \"/a/b\"}}\n");
        text.push_str("- {\"equals\": {\"path\": \"/a/b\", \"value\": <json>}}\n");
        text.push_str("- {\"not_equals\": {\"path\": \"/a/b\", \"value\": <json>}}\n");
        text.push_str("- {\"not\": <condition>}, {\"all\": [<condition>, ...]}, {\"any\": [<condition>, ...]}\n\n");
        text
    }

    fn generate_component(&self, component: &ComponentSpec) -> String {
        let mut text = format!("### {}\n", component.name);
        text.push_str(&format!(
            "Accepts children: {}\n",
            if component.has_children { "yes" } else { "no" }
        ));
        text.push_str(&generate_fields("Props", &component.props));
        text.push('\n');
        text
    }

    fn generate_action(&self, action: &ActionSpec) -> String {
        let mut text = format!("### {}\n", action.name);
        if !action.description.is_empty() {
            text.push_str(&format!("Description: {}\n", action.description));
        }
        text.push_str(&generate_fields("Params", &action.params));
        text.push('\n');
        text
    }
}

/// One line per declared field, or the bare shape for non-object schemas
fn generate_fields(title: &str, schema: &Schema) -> String {
    let Some(fields) = schema.fields() else {
        return format!("{}: {}\n", title, schema.describe());
    };
    if fields.is_empty() {
        return format!("{}: none\n", title);
    }

    let mut text = format!("{}:\n", title);
    for (name, field) in fields {
        let presence = if field.is_optional() { "optional" } else { "required" };
        match field.default_value() {
            Some(default) => text.push_str(&format!(
                "- {}: {} ({}, default {})\n",
                name,
                field.describe(),
                presence,
                default
            )),
            None => text.push_str(&format!("- {}: {} ({})\n", name, field.describe(), presence)),
        }
    }
    text
}
