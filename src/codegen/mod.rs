//! Scaffolding engines.
//!
//! Each run turns `(entity, action, fields)` into a SQL migration, a Go model
//! and, when configured, a Go repository. Existing model and repository files
//! are edited through [`go_source`], never patched as text.

pub mod config;
pub mod field_parser;
pub mod fs_utils;
pub mod go_source;
pub mod inflection;
pub mod manager;
pub mod migration;
pub mod model;
pub mod naming;
pub mod relations;
pub mod report;
pub mod repository;
pub mod templates;
pub mod types;

// Re-export key types
pub use config::{Config, DEFAULT_CONFIG_FILE};
pub use field_parser::{parse_action, parse_field, parse_fields};
pub use manager::Manager;
pub use report::{Artifact, ArtifactKind, Report, Warning};
pub use templates::{RenderFn, RenderInput, TemplateSet};
pub use types::{Action, Field, FieldType, Primitive};
