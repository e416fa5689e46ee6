//! # Catalog Dump Generator
//!
//! Generates the machine-readable twin of the prompt text: the catalog in
//! its definition-surface form, which [`Catalog::from_json_str`] reads back.

use crate::catalog::Catalog;
use crate::error::Result;

pub struct CatalogDumpGenerator<'a> {
    catalog: &'a Catalog,
}

impl<'a> CatalogDumpGenerator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Pretty-printed JSON, newline-terminated
    pub fn generate_dump(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(&self.catalog.to_definition())?;
        json.push('\n');
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::server_catalog;
    use serde_json::{json, Value};

    #[test]
    fn test_dump_shape() {
        let catalog = server_catalog().unwrap();
        let dump = CatalogDumpGenerator::new(&catalog).generate_dump().unwrap();
        let value: Value = serde_json::from_str(&dump).unwrap();

        let names: Vec<_> = value["components"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(names, vec!["Card", "Metric", "Button", "Text", "Grid", "Chart", "Select"]);
        assert_eq!(value["components"]["Card"]["hasChildren"], json!(true));
        assert_eq!(
            value["components"]["Grid"]["props"]["fields"]["columns"],
            json!({ "type": "optional", "inner": { "type": "number", "min": 1.0, "max": 4.0 }, "default": 2 })
        );
        assert_eq!(value["actions"]["confirm_order"]["description"], json!("确认订单配置"));
    }

    #[test]
    fn test_dump_reads_back() {
        let catalog = server_catalog().unwrap();
        let dump = CatalogDumpGenerator::new(&catalog).generate_dump().unwrap();
        assert_eq!(Catalog::from_json_str(&dump).unwrap(), catalog);
    }
}
