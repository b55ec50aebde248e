//! Schema snapshots resolved at a point in migration history
//!
//! A `ProjectState` is an explicit value describing the models of one app at
//! one migration target. Tests read models from the snapshot that matches the
//! current migration state instead of from a live, mutable registry.

pub mod loader;

pub use loader::{SchemaLoader, YamlSnapshotLoader};

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Field definition of a model at a given migration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldState {
    /// Field name (filled from the map key when loaded from YAML)
    #[serde(default)]
    pub name: String,

    /// Column type, e.g. `integer`, `string(255)`, `decimal(10,2)`
    #[serde(rename = "type")]
    pub field_type: String,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default)]
    pub primary_key: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl FieldState {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            nullable: false,
            primary_key: false,
            default: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn default_value(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Model definition at a given migration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    /// Model name as declared (case preserved)
    #[serde(default)]
    pub name: String,

    /// Database table name
    #[serde(default)]
    pub table: String,

    #[serde(default)]
    pub fields: IndexMap<String, FieldState>,
}

impl ModelState {
    /// Create a model whose table is the lowercased name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            table: name.to_lowercase(),
            name,
            fields: IndexMap::new(),
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn field(mut self, field: FieldState) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldState> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }
}

/// Resolved models of one app at one migration target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    #[serde(default)]
    pub app: String,

    /// Models keyed by lowercase name
    #[serde(default)]
    models: IndexMap<String, ModelState>,
}

impl ProjectState {
    pub fn new(app: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            models: IndexMap::new(),
        }
    }

    /// Add or replace a model
    pub fn with_model(mut self, model: ModelState) -> Self {
        self.insert_model(model);
        self
    }

    pub fn insert_model(&mut self, model: ModelState) {
        self.models.insert(model.name.to_lowercase(), model);
    }

    /// Look up a model by name, ignoring case
    pub fn get_model(&self, name: &str) -> Result<&ModelState> {
        self.models.get(&name.to_lowercase()).ok_or_else(|| {
            Error::model_not_found(format!("App '{}' doesn't have a '{}' model", self.app, name))
        })
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.models.contains_key(&name.to_lowercase())
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelState> {
        self.models.values()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice_state() -> ProjectState {
        ProjectState::new("billing").with_model(
            ModelState::new("Invoice")
                .table("billing_invoice")
                .field(FieldState::new("id", "serial").primary_key())
                .field(FieldState::new("amount", "decimal(10,2)")),
        )
    }

    #[test]
    fn test_model_lookup_ignores_case() {
        let state = invoice_state();
        assert!(state.has_model("invoice"));
        let model = state.get_model("INVOICE").unwrap();
        assert_eq!(model.name, "Invoice");
        assert_eq!(model.table, "billing_invoice");
        assert_eq!(model.field_names(), vec!["id", "amount"]);
    }

    #[test]
    fn test_missing_model() {
        let err = invoice_state().get_model("Payment").unwrap_err();
        assert!(matches!(err, Error::ModelNotFound(_)));
        assert!(err.to_string().contains("'billing'"));
    }

    #[test]
    fn test_field_builder() {
        let field = FieldState::new("due_date", "date")
            .nullable()
            .default_value(serde_json::Value::Null);
        assert!(field.nullable);
        assert!(!field.primary_key);
        assert_eq!(field.default, Some(serde_json::Value::Null));
    }
}
