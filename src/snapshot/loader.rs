//! Snapshot resolution for an (app, migration) pair

use super::{ModelState, ProjectState};
use crate::error::{Error, ErrorContext, Result};
use crate::migrations::MigrationTarget;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Capability that resolves the schema of an app at a migration target
pub trait SchemaLoader {
    fn state_at(&self, app: &str, target: &MigrationTarget) -> Result<ProjectState>;
}

impl<T: SchemaLoader + ?Sized> SchemaLoader for &T {
    fn state_at(&self, app: &str, target: &MigrationTarget) -> Result<ProjectState> {
        (**self).state_at(app, target)
    }
}

impl<T: SchemaLoader + ?Sized> SchemaLoader for Box<T> {
    fn state_at(&self, app: &str, target: &MigrationTarget) -> Result<ProjectState> {
        (**self).state_at(app, target)
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    models: IndexMap<String, ModelState>,
}

/// Loads snapshots from `<root>/<app>/<migration>.yaml`
///
/// ```yaml
/// models:
///   Invoice:
///     table: billing_invoice
///     fields:
///       id: { type: serial, primary_key: true }
///       total: { type: "decimal(10,2)", nullable: true }
/// ```
///
/// A named target matches a file stem exactly or, failing that, as a unique
/// prefix (`0006` finds `0006_invoice_total.yaml`).
#[derive(Debug, Clone)]
pub struct YamlSnapshotLoader {
    root: PathBuf,
}

impl YamlSnapshotLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Snapshot files of an app, sorted by migration name
    fn snapshot_files(&self, app: &str) -> Result<Vec<(String, PathBuf)>> {
        let app_dir = self.root.join(app);
        if !app_dir.is_dir() {
            return Err(Error::database_migration(format!(
                "No snapshot directory for app '{}': {}",
                app,
                app_dir.display()
            )));
        }

        let mut files = Vec::new();
        let entries = fs::read_dir(&app_dir)
            .with_context(|| format!("Failed to read snapshot directory {}", app_dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if !is_yaml {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                files.push((stem.to_string(), path.clone()));
            }
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }

    fn resolve_path(&self, app: &str, target: &MigrationTarget) -> Result<Option<PathBuf>> {
        match target {
            MigrationTarget::Zero => Ok(None),
            MigrationTarget::Latest => self
                .snapshot_files(app)?
                .pop()
                .map(|(_, path)| Some(path))
                .ok_or_else(|| {
                    Error::database_migration(format!("App '{}' has no migration snapshots", app))
                }),
            MigrationTarget::Named(name) => {
                let files = self.snapshot_files(app)?;
                if let Some((_, path)) = files.iter().find(|(stem, _)| stem == name) {
                    return Ok(Some(path.clone()));
                }

                let mut candidates = files.iter().filter(|(stem, _)| stem.starts_with(name.as_str()));
                match (candidates.next(), candidates.next()) {
                    (Some((_, path)), None) => Ok(Some(path.clone())),
                    (Some(_), Some(_)) => Err(Error::database_migration(format!(
                        "More than one migration matches '{}' in app '{}'",
                        name, app
                    ))),
                    (None, _) => Err(Error::database_migration(format!(
                        "Cannot find a migration matching '{}' from app '{}'",
                        name, app
                    ))),
                }
            }
        }
    }

    fn parse_file(app: &str, path: &Path) -> Result<ProjectState> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let file: SnapshotFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;

        let mut state = ProjectState::new(app);
        for (name, mut model) in file.models {
            if model.table.is_empty() {
                model.table = format!("{}_{}", app, name.to_lowercase());
            }
            for (field_name, field) in model.fields.iter_mut() {
                field.name = field_name.clone();
            }
            model.name = name;
            state.insert_model(model);
        }
        Ok(state)
    }
}

impl SchemaLoader for YamlSnapshotLoader {
    fn state_at(&self, app: &str, target: &MigrationTarget) -> Result<ProjectState> {
        let state = match self.resolve_path(app, target)? {
            Some(path) => {
                log::debug!("Loading {} snapshot at {} from {}", app, target, path.display());
                Self::parse_file(app, &path)?
            }
            None => ProjectState::new(app),
        };
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_snapshot(root: &Path, app: &str, name: &str, content: &str) {
        let dir = root.join(app);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    fn billing_dir() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        write_snapshot(
            temp_dir.path(),
            "billing",
            "0005_add_invoice.yaml",
            r#"
models:
  Invoice:
    fields:
      id: { type: serial, primary_key: true }
      amount: { type: "decimal(10,2)" }
"#,
        );
        write_snapshot(
            temp_dir.path(),
            "billing",
            "0006_invoice_total.yaml",
            r#"
models:
  Invoice:
    table: invoices
    fields:
      id: { type: serial, primary_key: true }
      amount: { type: "decimal(10,2)" }
      total: { type: "decimal(12,2)", nullable: true, default: 0 }
"#,
        );
        write_snapshot(temp_dir.path(), "billing", "README.txt", "not a snapshot");
        temp_dir
    }

    #[test]
    fn test_named_prefix_resolution() {
        let temp_dir = billing_dir();
        let loader = YamlSnapshotLoader::new(temp_dir.path());

        let state = loader.state_at("billing", &MigrationTarget::parse("0005")).unwrap();
        let invoice = state.get_model("Invoice").unwrap();
        assert_eq!(invoice.table, "billing_invoice");
        assert_eq!(invoice.field_names(), vec!["id", "amount"]);
        assert_eq!(invoice.get_field("id").unwrap().name, "id");
        assert!(invoice.get_field("id").unwrap().primary_key);
    }

    #[test]
    fn test_latest_and_zero() {
        let temp_dir = billing_dir();
        let loader = YamlSnapshotLoader::new(temp_dir.path());

        let latest = loader.state_at("billing", &MigrationTarget::Latest).unwrap();
        let invoice = latest.get_model("invoice").unwrap();
        assert_eq!(invoice.table, "invoices");
        let total = invoice.get_field("total").unwrap();
        assert!(total.nullable);
        assert_eq!(total.default, Some(serde_json::json!(0)));

        let zero = loader.state_at("billing", &MigrationTarget::Zero).unwrap();
        assert!(zero.is_empty());
        assert_eq!(zero.app, "billing");

        // Zero needs no snapshot directory
        let zero = loader.state_at("shipping", &MigrationTarget::Zero).unwrap();
        assert!(zero.is_empty());
    }

    #[test]
    fn test_unknown_and_ambiguous_targets() {
        let temp_dir = billing_dir();
        let loader = YamlSnapshotLoader::new(temp_dir.path());

        let err = loader.state_at("billing", &MigrationTarget::parse("0099")).unwrap_err();
        assert!(err.to_string().contains("0099"));

        let err = loader.state_at("billing", &MigrationTarget::parse("000")).unwrap_err();
        assert!(err.to_string().contains("More than one migration"));

        let err = loader.state_at("shipping", &MigrationTarget::Latest).unwrap_err();
        assert!(matches!(err, Error::DatabaseMigration(_)));
    }

    #[test]
    fn test_invalid_yaml_keeps_context() {
        let temp_dir = TempDir::new().unwrap();
        write_snapshot(temp_dir.path(), "billing", "0001_initial.yaml", "models: [unclosed");
        let loader = YamlSnapshotLoader::new(temp_dir.path());

        let err = loader.state_at("billing", &MigrationTarget::parse("0001")).unwrap_err();
        assert!(matches!(err, Error::WithContext { .. }));
        assert_eq!(err.error_code(), "E_YAML");
    }
}
