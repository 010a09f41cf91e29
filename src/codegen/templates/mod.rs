//! Render targets.
//!
//! Every artifact is produced by a named render function registered in a
//! [`TemplateSet`]. The engines hand a plan to [`TemplateSet::render`] and
//! write back whatever text comes out.

pub mod migration_sql;
pub mod model_go;
pub mod repository_go;

use indexmap::IndexMap;

use crate::codegen::migration::MigrationPlan;
use crate::codegen::model::{ModelEnum, ModelPlan};
use crate::codegen::repository::{RelationStub, RepositoryPlan};
use crate::codegen::types::Action;
use crate::error::{CodegenError, Result};

pub const MIGRATION_CREATE: &str = "migration/create";
pub const MIGRATION_ADD_FIELDS: &str = "migration/add_fields";
pub const MIGRATION_REMOVE_FIELDS: &str = "migration/remove_fields";
pub const MIGRATION_DROP: &str = "migration/drop";
pub const MODEL: &str = "model";
pub const MODEL_ENUM: &str = "model/enum";
pub const REPOSITORY: &str = "repository";
pub const REPOSITORY_HAS_MANY: &str = "repository/has_many";

/// Data contract handed to a render function.
#[derive(Debug, Clone, Copy)]
pub enum RenderInput<'a> {
    Migration(&'a MigrationPlan),
    Model(&'a ModelPlan),
    Enum(&'a ModelEnum),
    Repository(&'a RepositoryPlan),
    Relation(&'a RelationStub),
}

impl RenderInput<'_> {
    fn describe(&self) -> &'static str {
        match self {
            RenderInput::Migration(_) => "migration plan",
            RenderInput::Model(_) => "model plan",
            RenderInput::Enum(_) => "enum declaration",
            RenderInput::Repository(_) => "repository plan",
            RenderInput::Relation(_) => "relation stub",
        }
    }
}

pub type RenderFn = fn(&RenderInput<'_>) -> std::result::Result<String, String>;

/// Error text for a render function handed the wrong kind of input.
pub(crate) fn unexpected_input(expected: &str, input: &RenderInput<'_>) -> String {
    format!("expected a {}, got a {}", expected, input.describe())
}

/// Render target for a migration action.
pub fn migration_template(action: Action) -> &'static str {
    match action {
        Action::Create => MIGRATION_CREATE,
        Action::AddFields => MIGRATION_ADD_FIELDS,
        Action::RemoveFields => MIGRATION_REMOVE_FIELDS,
        Action::Drop => MIGRATION_DROP,
        Action::Unknown => "migration/unknown",
    }
}

/// Named render targets, in registration order.
#[derive(Clone)]
pub struct TemplateSet {
    templates: IndexMap<String, RenderFn>,
}

impl TemplateSet {
    pub fn empty() -> Self {
        TemplateSet {
            templates: IndexMap::new(),
        }
    }

    /// The built-in SQL and Go targets.
    pub fn builtin() -> Self {
        let mut set = Self::empty();
        set.register(MIGRATION_CREATE, migration_sql::render_create);
        set.register(MIGRATION_ADD_FIELDS, migration_sql::render_add_fields);
        set.register(MIGRATION_REMOVE_FIELDS, migration_sql::render_remove_fields);
        set.register(MIGRATION_DROP, migration_sql::render_drop);
        set.register(MODEL, model_go::render_model);
        set.register(MODEL_ENUM, model_go::render_enum);
        set.register(REPOSITORY, repository_go::render_repository);
        set.register(REPOSITORY_HAS_MANY, repository_go::render_has_many);
        set
    }

    /// Register (or replace) a render target.
    pub fn register(&mut self, name: &str, render: RenderFn) {
        self.templates.insert(name.to_string(), render);
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.templates.shift_remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn render(&self, name: &str, input: &RenderInput<'_>) -> Result<String> {
        let render = self
            .templates
            .get(name)
            .ok_or_else(|| CodegenError::render(name, "template not registered"))?;
        render(input).map_err(|message| CodegenError::render(name, message))
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::builtin()
    }
}
