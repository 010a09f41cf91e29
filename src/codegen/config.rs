//! Configuration schema for `codegenex.json`.
//!
//! The file is optional. A missing or malformed file yields the defaults, and
//! empty strings count as absent. The value is built once at startup and
//! handed to [`Manager`](crate::codegen::Manager) by reference.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::codegen::naming;

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "codegenex.json";

/// Process-wide generator configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding generated model files
    pub model_dir: PathBuf,
    /// Directory holding generated migration scripts
    pub migration_dir: PathBuf,
    /// Directory holding generated repositories; repository generation is
    /// skipped when unset
    pub repository_dir: Option<PathBuf>,
    /// Go module path used for imports between generated packages
    pub package_name: String,
    /// Also give the "many" side of a reference a direct accessor
    /// (`Author *Author`)
    pub belongs_to_accessor: bool,
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_migration_dir() -> PathBuf {
    PathBuf::from("migrations")
}

fn default_package_name() -> String {
    "myapp".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            model_dir: default_model_dir(),
            migration_dir: default_migration_dir(),
            repository_dir: None,
            package_name: default_package_name(),
            belongs_to_accessor: false,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::debug!("Ignoring malformed config {}: {}", path.display(), e);
                Config::default()
            }),
            Err(e) => {
                tracing::debug!("No config at {} ({}), using defaults", path.display(), e);
                Config::default()
            }
        }
    }

    /// Parse configuration from JSON text.
    pub fn from_json(contents: &str) -> Result<Self, String> {
        let config: Config = serde_json::from_str(contents)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        Ok(config.normalized())
    }

    /// Replace empty values with their defaults.
    fn normalized(mut self) -> Self {
        if self.model_dir.as_os_str().is_empty() {
            self.model_dir = default_model_dir();
        }
        if self.migration_dir.as_os_str().is_empty() {
            self.migration_dir = default_migration_dir();
        }
        if self
            .repository_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            self.repository_dir = None;
        }
        if self.package_name.is_empty() {
            self.package_name = default_package_name();
        }
        self
    }

    /// Go package name of the generated models (last component of `model_dir`).
    pub fn model_package(&self) -> String {
        package_from_dir(&self.model_dir, "models")
    }

    /// Go package name of the generated repositories.
    pub fn repository_package(&self) -> String {
        match &self.repository_dir {
            Some(dir) => package_from_dir(dir, "repositories"),
            None => "repositories".to_string(),
        }
    }

    /// Path of the model file for `model`.
    pub fn model_path(&self, model: &str) -> PathBuf {
        self.model_dir.join(naming::model_file_name(model))
    }

    /// Path of the repository file for `model`, when repositories are enabled.
    pub fn repository_path(&self, model: &str) -> Option<PathBuf> {
        self.repository_dir
            .as_ref()
            .map(|dir| dir.join(naming::repository_file_name(model)))
    }

    pub fn migration_path(&self, file_name: &str) -> PathBuf {
        self.migration_dir.join(file_name)
    }

    /// Import path of the model package, as seen from the repositories.
    pub fn model_import_path(&self) -> String {
        let relative: Vec<String> = self
            .model_dir
            .components()
            .filter_map(|component| match component {
                std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        // Absolute model dirs cannot be mapped onto the module; fall back to
        // the package name alone.
        if self.model_dir.is_absolute() || relative.is_empty() {
            return format!("{}/{}", self.package_name, self.model_package());
        }
        format!("{}/{}", self.package_name, relative.join("/"))
    }
}

fn package_from_dir(dir: &Path, fallback: &str) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().replace(['-', '.'], "_"))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.model_dir, PathBuf::from("models"));
        assert_eq!(config.migration_dir, PathBuf::from("migrations"));
        assert_eq!(config.repository_dir, None);
        assert_eq!(config.package_name, "myapp");
        assert!(!config.belongs_to_accessor);
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_json(
            r#"{"model_dir": "internal/models", "repository_dir": "internal/repo", "package_name": ""}"#,
        )
        .unwrap();
        assert_eq!(config.model_dir, PathBuf::from("internal/models"));
        assert_eq!(config.migration_dir, PathBuf::from("migrations"));
        assert_eq!(config.repository_dir, Some(PathBuf::from("internal/repo")));
        assert_eq!(config.package_name, "myapp");
        assert_eq!(config.model_package(), "models");
        assert_eq!(config.repository_package(), "repo");
        assert_eq!(config.model_import_path(), "myapp/internal/models");
        assert_eq!(
            config.model_path("BlogPost"),
            PathBuf::from("internal/models/blog_post.go")
        );
        assert_eq!(
            config.repository_path("Post"),
            Some(PathBuf::from("internal/repo/post_repo.go"))
        );
        assert_eq!(Config::default().repository_path("Post"), None);
    }

    #[test]
    fn test_empty_repository_dir_is_unset() {
        let config = Config::from_json(r#"{"repository_dir": ""}"#).unwrap();
        assert_eq!(config.repository_dir, None);
    }

    #[test]
    fn test_malformed_config_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codegenex.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Config::load(&path), Config::default());
        assert_eq!(Config::load(dir.path().join("missing.json")), Config::default());
    }
}
