//! # Server Purchase Demo
//!
//! A complete scenario used by the CLI defaults and the tests: a catalog of
//! dashboard/form components, a generated server-configuration form, and the
//! session data it binds to.

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::schema::Schema;
use crate::tree::{ElementNode, UITree};
use serde_json::{json, Value};

/// Catalog offered to the generator for the server purchase flow
pub fn server_catalog() -> Result<Catalog, CatalogError> {
    Catalog::builder()
        .container(
            "Card",
            Schema::object([
                ("title", Schema::string()),
                ("description", Schema::string().nullable()),
            ]),
        )
        .component(
            "Metric",
            Schema::object([
                ("label", Schema::string()),
                ("valuePath", Schema::path()),
                ("format", Schema::enumeration(["currency", "percent", "number"])),
            ]),
        )
        .component(
            "Button",
            Schema::object([
                ("label", Schema::string()),
                ("action", Schema::string()),
                (
                    "variant",
                    Schema::enumeration(["primary", "secondary", "danger"]).with_default("primary"),
                ),
            ]),
        )
        .component(
            "Text",
            Schema::object([
                ("content", Schema::string()),
                ("size", Schema::enumeration(["sm", "base", "lg", "xl"]).with_default("base")),
            ]),
        )
        .container(
            "Grid",
            Schema::object([("columns", Schema::number_range(1.0, 4.0).with_default(2))]),
        )
        .component(
            "Chart",
            Schema::object([
                ("type", Schema::enumeration(["bar", "line", "pie"])),
                ("title", Schema::string()),
                ("dataPath", Schema::path()),
            ]),
        )
        .component(
            "Select",
            Schema::object([
                ("label", Schema::string()),
                ("options", Schema::array(Schema::string())),
                ("valuePath", Schema::path()),
            ]),
        )
        .action("confirm_order", "确认订单配置", Schema::empty_object())
        .build()
}

/// The server configuration form a generator returns for "我想买一台服务器"
pub fn server_form_tree() -> UITree {
    let select = |key: &str, label: &str, options: &[&str], path: &str| {
        ElementNode::new(
            key,
            "Select",
            json!({ "label": label, "options": options, "valuePath": path }),
        )
        .with_parent("form-card")
    };

    UITree::from_elements(
        "form-card",
        [
            ElementNode::new(
                "form-card",
                "Card",
                json!({ "title": "🖥️ 服务器配置", "description": "请选择您需要的服务器规格" }),
            )
            .with_children(["cpu-select", "memory-select", "storage-select", "confirm-btn"]),
            select("cpu-select", "CPU 规格", &["2核", "4核", "8核", "16核"], "/server/cpu"),
            select("memory-select", "内存大小", &["4GB", "8GB", "16GB", "32GB"], "/server/memory"),
            select(
                "storage-select",
                "存储空间",
                &["100GB SSD", "200GB SSD", "500GB SSD", "1TB SSD"],
                "/server/storage",
            ),
            ElementNode::new(
                "confirm-btn",
                "Button",
                json!({ "label": "确认配置", "action": "confirm_order", "variant": "primary" }),
            )
            .with_parent("form-card"),
        ],
    )
}

/// Session data the form starts from
pub fn server_initial_data() -> Value {
    json!({
        "server": {
            "cpu": "4核",
            "memory": "8GB",
            "storage": "200GB SSD"
        }
    })
}
