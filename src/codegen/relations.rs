//! Relation Propagation Engine.
//!
//! A reference field on one model implies a collection on the model it
//! points at: `Post.AuthorID` gives `Author` a `Posts []*Post` attribute.
//! The referenced model is edited in place when its file exists. When it does
//! not exist yet the edit is skipped with a warning; creating that model
//! later picks the relation up from the `ref` tags on disk.

use crate::codegen::config::Config;
use crate::codegen::fs_utils;
use crate::codegen::model::{self, Relation};
use crate::codegen::naming;
use crate::codegen::report::Report;
use crate::codegen::types::Field;
use crate::error::Result;

/// Give every model referenced from `fields` a has-many collection of `model`.
pub fn propagate(config: &Config, model: &str, fields: &[Field], report: &mut Report) -> Result<()> {
    for field in fields.iter().filter(|f| f.is_reference) {
        let target = naming::referenced_model(field);
        let relation = Relation::has_many(model, &field.name);
        link_has_many(config, &target, &relation, report)?;
    }
    Ok(())
}

/// Add `relation` to the model `target`. Returns whether the file changed.
///
/// A missing file is a warning. A file that exists but cannot be parsed, or
/// that does not declare the `target` struct, is an error.
pub fn link_has_many(config: &Config, target: &str, relation: &Relation, report: &mut Report) -> Result<bool> {
    let path = config.model_path(target);
    let Some(source) = fs_utils::read_if_exists(&path)? else {
        report.warn(
            &path,
            format!(
                "{} model not found, {}.{} not added",
                target, target, relation.attribute
            ),
        );
        return Ok(false);
    };

    let mut file = model::parse_source(&path, &source)?;
    let decl = model::model_struct_mut(&mut file, target, &path)?;
    if decl.has_field(&relation.attribute) {
        tracing::debug!("{} already has {}", target, relation.attribute);
        return Ok(false);
    }
    decl.push_field(model::has_many_attribute(relation));

    let changed = fs_utils::write_if_changed(&path, &source, &file.render())?;
    if changed {
        tracing::info!("Linked {}.{} -> {}", target, relation.attribute, relation.model);
        report.updated(&path);
    }
    Ok(changed)
}
