//! Action dispatch.
//!
//! One run handles one `(entity, action, fields)` triple and walks the
//! engines in a fixed order: migration, model (which propagates relations),
//! then repository. The first fatal error stops the run; whatever was
//! written before it stays on disk.

use crate::codegen::config::Config;
use crate::codegen::field_parser::parse_fields;
use crate::codegen::report::Report;
use crate::codegen::templates::TemplateSet;
use crate::codegen::types::{Action, Field};
use crate::codegen::{migration, model, repository};
use crate::error::{CodegenError, Result};

/// `YYYYMMDDHHMMSS`, the migration file name prefix.
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

pub struct Manager<'a> {
    config: &'a Config,
    templates: TemplateSet,
    timestamp: Option<String>,
}

impl<'a> Manager<'a> {
    pub fn new(config: &'a Config) -> Self {
        Manager {
            config,
            templates: TemplateSet::builtin(),
            timestamp: None,
        }
    }

    /// Use a custom set of render targets.
    pub fn with_templates(mut self, templates: TemplateSet) -> Self {
        self.templates = templates;
        self
    }

    /// Pin the migration timestamp instead of reading the clock.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Parse the raw command line pieces and execute them.
    ///
    /// # Arguments
    ///
    /// * `entity` - Entity name (`post`, `BlogPost`, `blog_posts`)
    /// * `action` - `create`, `add_fields`, `remove_fields` or `drop`
    /// * `tokens` - Field tokens in the `name:type:option` DSL
    pub fn run<S: AsRef<str>>(&self, entity: &str, action: &str, tokens: &[S]) -> Result<Report> {
        let parsed = Action::parse(action);
        if parsed == Action::Unknown {
            return Err(CodegenError::UnknownAction(action.to_string()));
        }
        self.execute(entity, parsed, &parse_fields(tokens))
    }

    pub fn execute(&self, entity: &str, action: Action, fields: &[Field]) -> Result<Report> {
        if action == Action::Unknown {
            return Err(CodegenError::UnknownAction(action.as_str().to_string()));
        }
        let entity = entity.trim();
        if entity.is_empty() {
            return Err(CodegenError::Usage("entity name must not be empty".to_string()));
        }
        if action.requires_fields() && fields.is_empty() {
            return Err(CodegenError::Usage(format!(
                "{} needs at least one field",
                action.as_str()
            )));
        }

        let timestamp = self
            .timestamp
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format(TIMESTAMP_FORMAT).to_string());
        tracing::info!(
            "{} {} ({} fields, timestamp {})",
            action.as_str(),
            entity,
            fields.len(),
            timestamp
        );

        let mut report = Report::new();
        migration::generate(
            self.config,
            &self.templates,
            entity,
            action,
            fields,
            &timestamp,
            &mut report,
        )?;
        model::evolve(self.config, &self.templates, entity, action, fields, &mut report)?;
        repository::evolve(self.config, &self.templates, entity, action, fields, &mut report)?;

        Ok(report)
    }
}
