//! Model Evolution Engine.
//!
//! Owns the Go model file of one entity. `create` renders a fresh file from a
//! [`ModelPlan`]; `add_fields` and `remove_fields` parse the file that is on
//! disk into a [`GoFile`], edit the model struct in memory and render the
//! whole file again; `drop` deletes it.
//!
//! Attributes carry `json`/`db` struct tags, and reference attributes a `ref`
//! tag naming the referenced table. Later runs read those tags back instead of
//! guessing from attribute names.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::codegen::config::Config;
use crate::codegen::fs_utils;
use crate::codegen::go_source::{self, Decl, GoFile, OtherDecl, OtherKind, StructDecl, StructField};
use crate::codegen::naming::{self, CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN};
use crate::codegen::relations;
use crate::codegen::report::Report;
use crate::codegen::templates::{self, RenderInput, TemplateSet};
use crate::codegen::types::{Action, Field, Primitive};
use crate::error::{CodegenError, Result};

const TIME_PACKAGE: &str = "time";

/// Everything the `model` render target needs to write a model file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPlan {
    /// Go package of the model directory
    pub package: String,
    pub name: String,
    pub table: String,
    pub imports: Vec<String>,
    pub enums: Vec<ModelEnum>,
    /// Data attributes, one per column, in column order
    pub fields: Vec<ModelField>,
    /// Models this one holds a foreign key to
    pub belongs_to: Vec<Relation>,
    /// Models holding a foreign key to this one
    pub has_many: Vec<Relation>,
    /// Render a `*<Referenced>` accessor for every belongs-to relation
    pub belongs_to_accessor: bool,
}

/// One data attribute of a model struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelField {
    /// Go attribute name (`AuthorID`)
    pub name: String,
    pub go_type: String,
    pub column: String,
    pub nullable: bool,
    /// Go enum alias backing the attribute
    pub enum_type: Option<String>,
    /// Value of the `ref` tag: referenced table, plus `.column` when it is not `id`
    pub reference: Option<String>,
}

impl ModelField {
    pub fn from_field(model: &str, field: &Field) -> Self {
        ModelField {
            name: naming::go_field_name(&field.name),
            go_type: go_type(model, field),
            column: field.name.clone(),
            nullable: field.is_nullable,
            enum_type: field
                .is_enum
                .then(|| naming::go_enum_type_name(model, &field.name)),
            reference: field.is_reference.then(|| reference_tag(field)),
        }
    }

    fn implicit(column: &str, go_type: &str) -> Self {
        ModelField {
            name: naming::go_field_name(column),
            go_type: go_type.to_string(),
            column: column.to_string(),
            nullable: false,
            enum_type: None,
            reference: None,
        }
    }
}

/// Go side of an enum field: a string alias plus one constant per value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEnum {
    /// Alias type name (`PostStatusType`)
    pub name: String,
    pub model: String,
    /// Attribute the enum belongs to (`Status`)
    pub attribute: String,
    pub constants: Vec<EnumConst>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConst {
    pub name: String,
    pub value: String,
}

impl ModelEnum {
    pub fn from_field(model: &str, field: &Field) -> Self {
        let mut constants: Vec<EnumConst> = Vec::new();
        for value in field.enum_values.iter().filter(|v| !v.is_empty()) {
            let name = naming::go_enum_const_name(model, &field.name, value);
            if constants.iter().all(|c| c.name != name) {
                constants.push(EnumConst {
                    name,
                    value: value.clone(),
                });
            }
        }

        ModelEnum {
            name: naming::go_enum_type_name(model, &field.name),
            model: model.to_string(),
            attribute: naming::go_field_name(&field.name),
            constants,
        }
    }
}

/// A link between two models through a foreign key column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// The model on the other side
    pub model: String,
    /// Attribute holding the relation (`Author`, `Posts`)
    pub attribute: String,
    /// Foreign key column, which lives on the "many" side
    pub column: String,
}

impl Relation {
    /// The "many" side's view of a reference field (`author_id` -> `Author`).
    pub fn belongs_to(field: &Field) -> Self {
        Relation {
            model: naming::referenced_model(field),
            attribute: naming::belongs_to_field_name(&field.name),
            column: field.name.clone(),
        }
    }

    /// The "one" side's view of `child` holding `column`.
    pub fn has_many(child: &str, column: &str) -> Self {
        Relation {
            model: child.to_string(),
            attribute: naming::has_many_field_name(child),
            column: column.to_string(),
        }
    }
}

/// Go type of a field: primitives map to Go builtins, enums to their alias,
/// untyped and unknown fields to `interface{}`.
pub fn go_type(model: &str, field: &Field) -> String {
    let base = if field.is_enum {
        naming::go_enum_type_name(model, &field.name)
    } else {
        match &field.field_type.primitive {
            Primitive::Int => "int64",
            Primitive::String => "string",
            Primitive::Bool => "bool",
            Primitive::Time => "time.Time",
            Primitive::Float => "float64",
            Primitive::Jsonb => "map[string]interface{}",
            Primitive::Untyped | Primitive::Other(_) => "interface{}",
        }
        .to_string()
    };

    if field.field_type.is_array {
        format!("[]{}", base)
    } else {
        base
    }
}

fn reference_tag(field: &Field) -> String {
    let (table, column) = naming::referenced_table(field);
    if column == ID_COLUMN {
        table
    } else {
        format!("{}.{}", table, column)
    }
}

/// Referenced table named by a `ref` tag value.
pub fn reference_table(tag: &str) -> &str {
    tag.split_once('.').map_or(tag, |(table, _)| table)
}

/// Column named by a field's `db` tag, without options.
pub fn db_column(field: &StructField) -> Option<&str> {
    field
        .tag_value("db")
        .map(|value| value.split(',').next().unwrap_or(value))
}

/// `ID int64 \`json:"id" db:"id"\``
pub(crate) fn data_attribute(field: &ModelField) -> StructField {
    let json = if field.nullable {
        format!("{},omitempty", field.column)
    } else {
        field.column.clone()
    };
    let mut tag = vec![("json", json.as_str()), ("db", field.column.as_str())];
    if let Some(reference) = &field.reference {
        tag.push(("ref", reference.as_str()));
    }
    StructField::new(&field.name, &field.go_type).with_tag(go_source::format_tag(&tag))
}

/// `Author *Author \`json:"author,omitempty" db:"-"\``
pub(crate) fn belongs_to_attribute(relation: &Relation) -> StructField {
    relation_attribute(relation, format!("*{}", relation.model))
}

/// `Posts []*Post \`json:"posts,omitempty" db:"-"\``
pub(crate) fn has_many_attribute(relation: &Relation) -> StructField {
    relation_attribute(relation, format!("[]*{}", relation.model))
}

fn relation_attribute(relation: &Relation, ty: String) -> StructField {
    let json = format!("{},omitempty", naming::to_snake_case(&relation.attribute));
    StructField::new(&relation.attribute, &ty)
        .with_tag(go_source::format_tag(&[("json", &json), ("db", "-")]))
}

fn is_relation_attribute(field: &StructField) -> bool {
    db_column(field) == Some("-")
}

fn is_collection_attribute(field: &StructField) -> bool {
    is_relation_attribute(field) && field.ty.starts_with("[]*")
}

/// New data attributes go ahead of the timestamps and the relations.
fn is_trailing_attribute(field: &StructField) -> bool {
    matches!(
        db_column(field),
        Some(CREATED_AT_COLUMN) | Some(UPDATED_AT_COLUMN) | Some("-")
    )
}

/// Attribute already standing for `field`, by Go name or by column.
fn existing_attribute<'a>(decl: &'a StructDecl, field: &ModelField) -> Option<&'a StructField> {
    decl.fields()
        .find(|f| f.has_name(&field.name) || db_column(f) == Some(field.column.as_str()))
}

/// Attribute names backing `column`: tagged with it, or untagged and named
/// after it. Relation attributes never match.
fn attribute_names(decl: &StructDecl, column: &str) -> Vec<String> {
    let go_name = naming::go_field_name(column);
    let mut names = Vec::new();
    for field in decl.fields().filter(|f| !f.is_embedded()) {
        match db_column(field) {
            Some(tagged) if tagged == column => names.extend(field.names.iter().cloned()),
            None if field.has_name(&go_name) => names.push(go_name.clone()),
            _ => {}
        }
    }
    names
}

fn required_imports(fields: &[ModelField]) -> Vec<String> {
    let mut imports = Vec::new();
    if fields.iter().any(|f| f.go_type.contains("time.")) {
        imports.push(TIME_PACKAGE.to_string());
    }
    imports
}

/// Keep the `time` import in step with the attributes.
pub(crate) fn sync_time_import(file: &mut GoFile) {
    if file.uses_package(TIME_PACKAGE) {
        file.add_import(TIME_PACKAGE);
    } else if file.remove_import(TIME_PACKAGE) {
        tracing::debug!("Dropped unused time import");
    }
}

/// Parse Go source read from `path`.
pub(crate) fn parse_source(path: &Path, source: &str) -> Result<GoFile> {
    GoFile::parse(source).map_err(|source| CodegenError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and parse a generated file that must exist.
pub(crate) fn load_go_file(path: &Path, kind: &'static str) -> Result<(String, GoFile)> {
    let source = fs_utils::read_if_exists(path)?.ok_or_else(|| CodegenError::MissingArtifact {
        kind,
        path: path.to_path_buf(),
    })?;
    let file = parse_source(path, &source)?;
    Ok((source, file))
}

/// The model struct `name` declared in `file`.
pub(crate) fn model_struct<'a>(file: &'a GoFile, name: &str, path: &Path) -> Result<&'a StructDecl> {
    match file.type_decl(name) {
        Some(Decl::Struct(decl)) => Ok(decl),
        Some(_) => Err(CodegenError::NotAStruct {
            name: name.to_string(),
            path: path.to_path_buf(),
        }),
        None => Err(CodegenError::TypeNotFound {
            name: name.to_string(),
            path: path.to_path_buf(),
        }),
    }
}

pub(crate) fn model_struct_mut<'a>(
    file: &'a mut GoFile,
    name: &str,
    path: &Path,
) -> Result<&'a mut StructDecl> {
    model_struct(file, name, path)?;
    file.struct_decl_mut(name)
        .ok_or_else(|| CodegenError::TypeNotFound {
            name: name.to_string(),
            path: path.to_path_buf(),
        })
}

/// Build the plan for a freshly created model.
///
/// `id` is injected first and `created_at`/`updated_at` last unless declared.
/// Has-many relations are left empty; [`create`] fills them from the model
/// files already on disk.
pub fn plan_create(config: &Config, entity: &str, fields: &[Field]) -> ModelPlan {
    let name = naming::model_name(entity);
    let mut attributes: Vec<ModelField> = Vec::new();

    if !fields.iter().any(|f| f.is_named(ID_COLUMN)) {
        attributes.push(ModelField::implicit(ID_COLUMN, "int64"));
    }
    for field in fields {
        if attributes.iter().any(|a| a.column == field.name) {
            tracing::debug!("Field {} declared twice, keeping the first", field.name);
            continue;
        }
        attributes.push(ModelField::from_field(&name, field));
    }
    for column in [CREATED_AT_COLUMN, UPDATED_AT_COLUMN] {
        if !fields.iter().any(|f| f.is_named(column)) {
            attributes.push(ModelField::implicit(column, "time.Time"));
        }
    }

    ModelPlan {
        package: config.model_package(),
        table: naming::table_name(entity),
        imports: required_imports(&attributes),
        enums: fields
            .iter()
            .filter(|f| f.is_enum)
            .map(|f| ModelEnum::from_field(&name, f))
            .collect(),
        fields: attributes,
        belongs_to: fields
            .iter()
            .filter(|f| f.is_reference)
            .map(Relation::belongs_to)
            .collect(),
        has_many: Vec::new(),
        belongs_to_accessor: config.belongs_to_accessor,
        name,
    }
}

/// Has-many relations of `table` recorded in the other model files:
/// every struct with an attribute whose `ref` tag points at `table`.
fn existing_children(config: &Config, own_path: &Path, table: &str, report: &mut Report) -> Result<Vec<Relation>> {
    let entries = match fs::read_dir(&config.model_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(CodegenError::io(&config.model_dir, e)),
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "go") && path != own_path)
        .collect();
    paths.sort();

    let mut relations: Vec<Relation> = Vec::new();
    for path in paths {
        let source = fs::read_to_string(&path).map_err(|e| CodegenError::io(&path, e))?;
        let file = match GoFile::parse(&source) {
            Ok(file) => file,
            Err(e) => {
                report.warn(&path, format!("not scanned for relations: {}", e));
                continue;
            }
        };

        for decl in file.structs() {
            let column = decl.fields().find_map(|field| {
                let reference = field.tag_value("ref")?;
                (reference_table(reference) == table).then(|| {
                    db_column(field)
                        .map(str::to_string)
                        .unwrap_or_else(|| naming::column_for_go_field(&field.names.join("")))
                })
            });
            if let Some(column) = column {
                let relation = Relation::has_many(&decl.name, &column);
                if relations.iter().all(|r| r.attribute != relation.attribute) {
                    tracing::debug!("{} references {} via {}", decl.name, table, column);
                    relations.push(relation);
                }
            }
        }
    }

    Ok(relations)
}

/// Render and write a new model file, then link it to its relatives.
pub fn create(
    config: &Config,
    templates: &TemplateSet,
    entity: &str,
    fields: &[Field],
    report: &mut Report,
) -> Result<PathBuf> {
    let mut plan = plan_create(config, entity, fields);
    let path = config.model_path(&plan.name);
    plan.has_many = existing_children(config, &path, &plan.table, report)?;

    let source = templates.render(templates::MODEL, &RenderInput::Model(&plan))?;
    if path.exists() {
        tracing::info!("Overwriting {}", path.display());
    }
    fs_utils::write_file(&path, source)?;
    report.written(&path);

    relations::propagate(config, &plan.name, fields, report)?;
    Ok(path)
}

/// Add attributes to an existing model. Attributes already present are
/// skipped, so running the same command twice changes nothing.
pub fn add_fields(
    config: &Config,
    templates: &TemplateSet,
    entity: &str,
    fields: &[Field],
    report: &mut Report,
) -> Result<()> {
    let model = naming::model_name(entity);
    let path = config.model_path(&model);
    let (source, mut file) = load_go_file(&path, "model")?;

    let decl = model_struct_mut(&mut file, &model, &path)?;
    for field in fields {
        let attribute = ModelField::from_field(&model, field);
        match existing_attribute(decl, &attribute).map(is_relation_attribute) {
            Some(true) => report.warn(
                &path,
                format!(
                    "{} not added: {}.{} is a relation attribute",
                    field.name, model, attribute.name
                ),
            ),
            Some(false) => tracing::debug!("{} already has {}", model, attribute.name),
            None => decl.insert_field_before(data_attribute(&attribute), is_trailing_attribute),
        }

        if config.belongs_to_accessor && field.is_reference {
            let relation = Relation::belongs_to(field);
            if !decl.has_field(&relation.attribute) {
                decl.insert_field_before(belongs_to_attribute(&relation), is_collection_attribute);
            }
        }
    }

    let missing_enums: Vec<ModelEnum> = fields
        .iter()
        .filter(|f| f.is_enum)
        .map(|f| ModelEnum::from_field(&model, f))
        .filter(|e| !file.has_type(&e.name))
        .collect();
    for model_enum in &missing_enums {
        let text = templates.render(templates::MODEL_ENUM, &RenderInput::Enum(model_enum))?;
        let decls = go_source::parse_decls(&text)
            .map_err(|e| CodegenError::render(templates::MODEL_ENUM, e.to_string()))?;
        file.insert_decls_before(&model, decls);
    }

    sync_time_import(&mut file);
    if fs_utils::write_if_changed(&path, &source, &file.render())? {
        report.updated(&path);
    }

    relations::propagate(config, &model, fields, report)
}

fn enum_in_use(file: &GoFile, enum_name: &str) -> bool {
    file.structs().any(|decl| {
        decl.fields()
            .any(|field| field.ty.trim_start_matches(['[', ']', '*']) == enum_name)
    })
}

fn remove_enum_decls(file: &mut GoFile, enum_name: &str) {
    let constant = format!(" {} = ", enum_name);
    file.decls.retain(|decl| match decl {
        Decl::Other(OtherDecl {
            kind: OtherKind::Type(name),
            ..
        }) => name != enum_name,
        Decl::Other(OtherDecl {
            kind: OtherKind::Const,
            text,
            ..
        }) => !text.contains(&constant),
        _ => true,
    });
}

/// Remove attributes from an existing model. Relation attributes are kept,
/// even those that came from a removed reference.
pub fn remove_fields(config: &Config, entity: &str, fields: &[Field], report: &mut Report) -> Result<()> {
    let model = naming::model_name(entity);
    let path = config.model_path(&model);
    let (source, mut file) = load_go_file(&path, "model")?;

    let decl = model_struct_mut(&mut file, &model, &path)?;
    let mut enum_candidates = Vec::new();
    for field in fields {
        let names = attribute_names(decl, &field.name);
        if names.is_empty() {
            tracing::debug!("{} has no attribute for {}", model, field.name);
            continue;
        }
        for name in &names {
            decl.remove_field(name);
        }
        enum_candidates.push(naming::go_enum_type_name(&model, &field.name));
    }

    for enum_name in enum_candidates {
        if file.has_type(&enum_name) && !enum_in_use(&file, &enum_name) {
            remove_enum_decls(&mut file, &enum_name);
        }
    }

    sync_time_import(&mut file);
    if fs_utils::write_if_changed(&path, &source, &file.render())? {
        report.updated(&path);
    }
    Ok(())
}

/// Delete the model file. A file that is already gone is only reported.
pub fn drop(config: &Config, entity: &str, report: &mut Report) -> Result<()> {
    let path = config.model_path(&naming::model_name(entity));
    if fs_utils::remove_file_if_exists(&path)? {
        report.removed(&path);
    } else {
        report.warn(&path, "model file not found, nothing to remove");
    }
    Ok(())
}

/// Run the model branch for `action`.
pub fn evolve(
    config: &Config,
    templates: &TemplateSet,
    entity: &str,
    action: Action,
    fields: &[Field],
    report: &mut Report,
) -> Result<()> {
    match action {
        Action::Create => create(config, templates, entity, fields, report).map(|_| ()),
        Action::AddFields => add_fields(config, templates, entity, fields, report),
        Action::RemoveFields => remove_fields(config, entity, fields, report),
        Action::Drop => drop(config, entity, report),
        Action::Unknown => Err(CodegenError::UnknownAction(action.as_str().to_string())),
    }
}
