//! Go model render targets.

use std::fmt::{self, Write};

use crate::codegen::go_source::{self, Decl, GoFile, StructDecl};
use crate::codegen::model::{self, ModelEnum, ModelPlan};
use crate::codegen::templates::{unexpected_input, RenderInput};

/// First line of every generated Go file.
pub const GENERATED_HEADER: &str = "// Code generated by codegenex.";

fn go_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn enum_source(model_enum: &ModelEnum) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "// {} enumerates the values of {}.{}.",
        model_enum.name, model_enum.model, model_enum.attribute
    )?;
    writeln!(out, "type {} string", model_enum.name)?;

    if model_enum.constants.is_empty() {
        return Ok(out);
    }

    let width = model_enum
        .constants
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0);
    writeln!(out)?;
    writeln!(out, "const (")?;
    for constant in &model_enum.constants {
        writeln!(
            out,
            "\t{:<width$} {} = {}",
            constant.name,
            model_enum.name,
            go_string(&constant.value),
            width = width
        )?;
    }
    writeln!(out, ")")?;
    Ok(out)
}

fn model_source(plan: &ModelPlan) -> Result<String, String> {
    let mut file = GoFile::new(&plan.package);
    file.package_doc.push(GENERATED_HEADER.to_string());
    for import in &plan.imports {
        file.add_import(import);
    }

    for model_enum in &plan.enums {
        let text = enum_source(model_enum).map_err(|e| e.to_string())?;
        let decls = go_source::parse_decls(&text)
            .map_err(|e| format!("enum {}: {}", model_enum.name, e))?;
        file.decls.extend(decls);
    }

    let mut decl = StructDecl::new(&plan.name);
    decl.doc.push(format!(
        "// {} represents a row in the {} table.",
        plan.name, plan.table
    ));
    for field in &plan.fields {
        decl.push_field(model::data_attribute(field));
    }
    if plan.belongs_to_accessor {
        for relation in &plan.belongs_to {
            if !decl.has_field(&relation.attribute) {
                decl.push_field(model::belongs_to_attribute(relation));
            }
        }
    }
    for relation in &plan.has_many {
        if !decl.has_field(&relation.attribute) {
            decl.push_field(model::has_many_attribute(relation));
        }
    }
    file.decls.push(Decl::Struct(decl));

    Ok(file.render())
}

pub fn render_model(input: &RenderInput<'_>) -> Result<String, String> {
    match input {
        RenderInput::Model(plan) => model_source(plan),
        other => Err(unexpected_input("model plan", other)),
    }
}

pub fn render_enum(input: &RenderInput<'_>) -> Result<String, String> {
    match input {
        RenderInput::Enum(model_enum) => enum_source(model_enum).map_err(|e| e.to_string()),
        other => Err(unexpected_input("enum declaration", other)),
    }
}
