//! # Schema Engine
//!
//! A small descriptor language for component props and action params, and
//! the single interpreter that checks arbitrary JSON values against it.
//!
//! Descriptors are plain data so the catalog stays introspectable: the
//! prompt compiler walks the same [`Schema`] values the validator does.
//!
//! Validation is exhaustive. [`Schema::validate`] never stops at the first
//! bad field; it returns either the fully validated value (with defaults
//! substituted) or every field-level [`SchemaError`] it found.

use crate::binding::BindingPath;
use crate::error::{CatalogError, SchemaError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schema {
    String,
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Boolean,
    /// Closed set of string literals
    Enum { values: Vec<String> },
    Array { items: Box<Schema> },
    /// String holding a well-formed binding path into the data store
    Path,
    Object { fields: IndexMap<String, Schema> },
    /// Absence allowed; `default` is substituted when present
    Optional {
        inner: Box<Schema>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
    },
    /// Explicit null allowed. Absence is still an error.
    Nullable { inner: Box<Schema> },
}

/// Knobs for a validation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Report object fields the schema does not declare. When false they are dropped.
    pub reject_unknown: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self { reject_unknown: true }
    }
}

impl Schema {
    pub fn string() -> Self {
        Schema::String
    }

    pub fn number() -> Self {
        Schema::Number { min: None, max: None }
    }

    /// Number within inclusive bounds
    pub fn number_range(min: f64, max: f64) -> Self {
        Schema::Number {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn boolean() -> Self {
        Schema::Boolean
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Schema::Enum {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array {
            items: Box::new(items),
        }
    }

    pub fn path() -> Self {
        Schema::Path
    }

    pub fn object<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Schema)>,
        S: Into<String>,
    {
        Schema::Object {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Object with no fields
    pub fn empty_object() -> Self {
        Schema::Object {
            fields: IndexMap::new(),
        }
    }

    pub fn optional(self) -> Self {
        Schema::Optional {
            inner: Box::new(self),
            default: None,
        }
    }

    /// Optional with a default substituted on absence
    pub fn with_default(self, default: impl Into<Value>) -> Self {
        Schema::Optional {
            inner: Box::new(self),
            default: Some(default.into()),
        }
    }

    pub fn nullable(self) -> Self {
        Schema::Nullable {
            inner: Box::new(self),
        }
    }

    /// Declared fields, if this is an object descriptor
    pub fn fields(&self) -> Option<&IndexMap<String, Schema>> {
        match self {
            Schema::Object { fields } => Some(fields),
            _ => None,
        }
    }

    /// Whether a value may be absent
    pub fn is_optional(&self) -> bool {
        match self {
            Schema::Optional { .. } => true,
            Schema::Nullable { inner } => inner.is_optional(),
            _ => false,
        }
    }

    /// Default substituted on absence, if any
    pub fn default_value(&self) -> Option<&Value> {
        match self {
            Schema::Optional { default, inner } => default.as_ref().or_else(|| inner.default_value()),
            Schema::Nullable { inner } => inner.default_value(),
            _ => None,
        }
    }

    /// Whether values of this shape are data-store bindings
    pub fn is_binding(&self) -> bool {
        match self {
            Schema::Path => true,
            Schema::Optional { inner, .. } | Schema::Nullable { inner } => inner.is_binding(),
            _ => false,
        }
    }

    /// Human-readable shape, used in error messages and the compiled prompt
    pub fn describe(&self) -> String {
        match self {
            Schema::String => "string".to_string(),
            Schema::Number { min, max } => match (min, max) {
                (Some(min), Some(max)) => format!("number between {} and {}", min, max),
                (Some(min), None) => format!("number >= {}", min),
                (None, Some(max)) => format!("number <= {}", max),
                (None, None) => "number".to_string(),
            },
            Schema::Boolean => "boolean".to_string(),
            Schema::Enum { values } => values
                .iter()
                .map(|v| format!("\"{}\"", v))
                .collect::<Vec<_>>()
                .join(" | "),
            Schema::Array { items } => format!("array of {}", items.describe()),
            Schema::Path => "binding path (e.g. \"/server/cpu\")".to_string(),
            Schema::Object { fields } => {
                if fields.is_empty() {
                    "{}".to_string()
                } else {
                    let inner = fields
                        .iter()
                        .map(|(name, schema)| {
                            let mark = if schema.is_optional() { "?" } else { "" };
                            format!("{}{}: {}", name, mark, schema.describe())
                        })
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{{ {} }}", inner)
                }
            }
            Schema::Optional { inner, .. } => inner.describe(),
            Schema::Nullable { inner } => format!("{} | null", inner.describe()),
        }
    }

    /// Validate a present value with default options
    pub fn validate(&self, value: &Value) -> Result<Value, Vec<SchemaError>> {
        self.validate_with(Some(value), ValidateOptions::default())
    }

    /// Validate a possibly-absent value
    ///
    /// Returns the validated value with defaults filled in. An optional
    /// schema without a default that receives nothing validates to `Null`.
    pub fn validate_with(
        &self,
        value: Option<&Value>,
        options: ValidateOptions,
    ) -> Result<Value, Vec<SchemaError>> {
        let mut errors = Vec::new();
        let checked = self.check(value, "", options, &mut errors);
        if errors.is_empty() {
            Ok(checked.unwrap_or(Value::Null))
        } else {
            Err(errors)
        }
    }

    /// Core interpreter. `None` in the return means "leave the field out";
    /// callers decide success by whether `errors` grew.
    fn check(
        &self,
        value: Option<&Value>,
        path: &str,
        options: ValidateOptions,
        errors: &mut Vec<SchemaError>,
    ) -> Option<Value> {
        match self {
            Schema::Optional { inner, default } => match value {
                None => default.clone(),
                Some(v) => inner.check(Some(v), path, options, errors),
            },
            Schema::Nullable { inner } => match value {
                Some(Value::Null) => Some(Value::Null),
                None if !inner.is_optional() => {
                    errors.push(mismatch(path, self, None));
                    None
                }
                _ => inner.check(value, path, options, errors),
            },
            _ => {
                let Some(value) = value else {
                    errors.push(mismatch(path, self, None));
                    return None;
                };
                self.check_present(value, path, options, errors)
            }
        }
    }

    fn check_present(
        &self,
        value: &Value,
        path: &str,
        options: ValidateOptions,
        errors: &mut Vec<SchemaError>,
    ) -> Option<Value> {
        match (self, value) {
            (Schema::String, Value::String(_)) | (Schema::Boolean, Value::Bool(_)) => {
                Some(value.clone())
            }
            (Schema::Number { min, max }, Value::Number(n)) => {
                let within = n.as_f64().is_some_and(|x| {
                    min.map_or(true, |min| x >= min) && max.map_or(true, |max| x <= max)
                });
                if within {
                    Some(value.clone())
                } else {
                    errors.push(mismatch(path, self, Some(value)));
                    None
                }
            }
            (Schema::Enum { values }, Value::String(s)) if values.contains(s) => Some(value.clone()),
            (Schema::Path, Value::String(s)) => match BindingPath::parse(s) {
                Ok(_) => Some(value.clone()),
                Err(e) => {
                    errors.push(SchemaError {
                        path: path.to_string(),
                        expected: format!("binding path ({})", e),
                        received: describe_value(Some(value)),
                    });
                    None
                }
            },
            (Schema::Array { items }, Value::Array(elements)) => {
                let before = errors.len();
                let mut out = Vec::with_capacity(elements.len());
                for (i, element) in elements.iter().enumerate() {
                    let child = format!("{}[{}]", path, i);
                    if let Some(v) = items.check(Some(element), &child, options, errors) {
                        out.push(v);
                    }
                }
                (errors.len() == before).then(|| Value::Array(out))
            }
            (Schema::Object { fields }, Value::Object(map)) => {
                let before = errors.len();
                let mut out = Map::new();
                for (name, schema) in fields {
                    let child = join_field(path, name);
                    if let Some(v) = schema.check(map.get(name), &child, options, errors) {
                        out.insert(name.clone(), v);
                    }
                }
                if options.reject_unknown {
                    for (name, v) in map {
                        if !fields.contains_key(name) {
                            errors.push(SchemaError {
                                path: join_field(path, name),
                                expected: "no such field".to_string(),
                                received: describe_value(Some(v)),
                            });
                        }
                    }
                }
                (errors.len() == before).then(|| Value::Object(out))
            }
            _ => {
                errors.push(mismatch(path, self, Some(value)));
                None
            }
        }
    }

    /// Check the descriptor itself for definition mistakes
    pub(crate) fn lint(&self, owner: &str) -> Result<(), CatalogError> {
        self.lint_at(owner, "")
    }

    fn lint_at(&self, owner: &str, path: &str) -> Result<(), CatalogError> {
        match self {
            Schema::Enum { values } if values.is_empty() => Err(CatalogError::EmptyEnum {
                owner: owner.to_string(),
                path: path.to_string(),
            }),
            Schema::Number {
                min: Some(min),
                max: Some(max),
            } if min > max => Err(CatalogError::InvalidBounds {
                owner: owner.to_string(),
                path: path.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            }),
            Schema::Array { items } => items.lint_at(owner, &format!("{}[]", path)),
            Schema::Object { fields } => {
                for (name, schema) in fields {
                    schema.lint_at(owner, &join_field(path, name))?;
                }
                Ok(())
            }
            Schema::Optional { inner, default } => {
                inner.lint_at(owner, path)?;
                if let Some(default) = default {
                    inner
                        .validate(default)
                        .map_err(|errors| CatalogError::InvalidDefault {
                            owner: owner.to_string(),
                            path: path.to_string(),
                            errors,
                        })?;
                }
                Ok(())
            }
            Schema::Nullable { inner } => inner.lint_at(owner, path),
            _ => Ok(()),
        }
    }
}

fn join_field(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn mismatch(path: &str, schema: &Schema, value: Option<&Value>) -> SchemaError {
    SchemaError {
        path: path.to_string(),
        expected: schema.describe(),
        received: describe_value(value),
    }
}

/// Short rendering of a received value; containers are not dumped in full
pub(crate) fn describe_value(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Object(_)) => "object".to_string(),
        Some(Value::Array(_)) => "array".to_string(),
        Some(scalar) => scalar.to_string(),
    }
}
