//! Repository Evolution Engine.
//!
//! The repository is always regenerated whole from the model file as it
//! stands after model evolution. Relation helpers need the field lists of the
//! related models too, so those files are read as well; when one is missing
//! or malformed the helper is left out and a warning is recorded.
//!
//! The one in-place edit is [`propagate`]: a new reference adds a has-many
//! helper to the repository of the referenced model, if that repository
//! already exists.

use std::path::Path;

use crate::codegen::config::Config;
use crate::codegen::fs_utils;
use crate::codegen::go_source::{self, GoFile, StructDecl};
use crate::codegen::model;
use crate::codegen::naming::{self, CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN};
use crate::codegen::report::Report;
use crate::codegen::templates::{self, RenderInput, TemplateSet};
use crate::codegen::types::{Action, Field};
use crate::error::{CodegenError, Result};

/// Column attributes and collections of a model, as read from its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelShape {
    pub model: String,
    pub table: String,
    pub columns: Vec<ShapeColumn>,
    /// Models listed in `[]*Model` collections
    pub collections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeColumn {
    pub go_field: String,
    pub column: String,
    pub go_type: String,
    /// `ref` tag value
    pub reference: Option<String>,
}

impl ModelShape {
    pub fn from_struct(decl: &StructDecl) -> Self {
        let mut shape = ModelShape {
            model: decl.name.clone(),
            table: naming::table_name(&decl.name),
            columns: Vec::new(),
            collections: Vec::new(),
        };

        for field in decl.fields().filter(|f| !f.is_embedded()) {
            if let Some(element) = field.ty.strip_prefix("[]*") {
                let related = element.rsplit('.').next().unwrap_or(element);
                if !shape.collections.iter().any(|c| c == related) {
                    shape.collections.push(related.to_string());
                }
                continue;
            }

            let tagged = model::db_column(field);
            if tagged == Some("-") || (tagged.is_none() && field.ty.starts_with('*')) {
                continue;
            }
            for name in &field.names {
                let column = match tagged {
                    Some(column) if field.names.len() == 1 => column.to_string(),
                    _ => naming::column_for_go_field(name),
                };
                shape.columns.push(ShapeColumn {
                    go_field: name.clone(),
                    column,
                    go_type: field.ty.clone(),
                    reference: field.tag_value("ref").map(str::to_string),
                });
            }
        }

        shape
    }

    /// Read the shape of `model` from its file.
    pub fn load(config: &Config, model: &str) -> Result<Self> {
        let path = config.model_path(model);
        let (_, file) = model::load_go_file(&path, "model")?;
        Ok(Self::from_struct(model::model_struct(&file, model, &path)?))
    }

    pub fn column(&self, column: &str) -> Option<&ShapeColumn> {
        self.columns.iter().find(|c| c.column == column)
    }

    /// The primary key column, `id` by convention.
    pub fn primary_key(&self) -> Option<&ShapeColumn> {
        self.column(ID_COLUMN)
    }

    /// Column list for a SELECT, optionally qualified with a table alias.
    fn select_list(&self, alias: Option<&str>) -> String {
        self.columns
            .iter()
            .map(|c| match alias {
                Some(alias) => format!("{}.{}", alias, c.column),
                None => c.column.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn scan_targets(&self, var: &str) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| format!("&{}.{}", var, c.go_field))
            .collect()
    }
}

/// Shape of a related model, or `None` with a warning when its file is
/// missing or malformed.
fn related_shape(config: &Config, model: &str, report: &mut Report) -> Option<ModelShape> {
    match ModelShape::load(config, model) {
        Ok(shape) => Some(shape),
        Err(e) => {
            report.warn(
                &config.model_path(model),
                format!("relation helper skipped: {}", e),
            );
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    PrimaryKey,
    CreatedAt,
    UpdatedAt,
    Data,
}

/// Per-column fragments of the CRUD statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBinding {
    pub column: String,
    pub go_field: String,
    pub go_type: String,
    pub role: ColumnRole,
    /// 1-based `$n` shared by INSERT and UPDATE; data columns only
    pub placeholder: Option<usize>,
    /// `post.Title`
    pub insert_value: Option<String>,
    /// `&post.Title`
    pub scan_target: String,
    /// `title = $1`, `updated_at = CURRENT_TIMESTAMP`
    pub update_set: Option<String>,
}

/// `GetBy<Ref>` lookup on a reference column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finder {
    pub method: String,
    pub column: String,
    pub param: String,
    pub param_type: String,
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    BelongsTo,
    HasMany,
}

/// A method fetching related rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationStub {
    pub kind: RelationKind,
    /// Concrete repository type the method is declared on
    pub receiver: String,
    pub method: String,
    pub param: String,
    pub param_type: String,
    pub related_model: String,
    /// Related model as written in the repository package (`models.Author`)
    pub related_type: String,
    pub related_var: String,
    pub query: String,
    pub scan_targets: Vec<String>,
}

impl RelationStub {
    /// Parameter and result list, as written after the method name.
    pub fn signature(&self) -> String {
        let result = match self.kind {
            RelationKind::BelongsTo => format!("*{}", self.related_type),
            RelationKind::HasMany => format!("[]*{}", self.related_type),
        };
        format!(
            "(ctx context.Context, {} {}) ({}, error)",
            self.param, self.param_type, result
        )
    }
}

/// Everything the `repository` render target needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryPlan {
    pub package: String,
    pub imports: Vec<String>,
    pub model: String,
    /// `models.Post`, or `Post` when models and repositories share a package
    pub model_type: String,
    pub var: String,
    pub table: String,
    pub interface_name: String,
    pub struct_name: String,
    pub constructor: String,
    pub primary_key: ColumnBinding,
    pub columns: Vec<ColumnBinding>,
    pub insert_sql: String,
    /// Columns filled in by the database and read back after INSERT
    pub returning: Vec<String>,
    pub select_sql: String,
    pub get_sql: String,
    pub list_sql: String,
    pub update_sql: String,
    pub delete_sql: String,
    pub finders: Vec<Finder>,
    pub relations: Vec<RelationStub>,
}

impl RepositoryPlan {
    pub fn insert_args(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|c| c.insert_value.as_deref())
            .collect()
    }

    pub fn update_args(&self) -> Vec<String> {
        let mut args: Vec<String> = self.insert_args().into_iter().map(str::to_string).collect();
        args.push(format!("{}.{}", self.var, self.primary_key.go_field));
        args
    }

    pub fn scan_targets(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.scan_target.as_str()).collect()
    }

    pub fn returning_targets(&self) -> Vec<String> {
        self.returning
            .iter()
            .filter_map(|column| self.columns.iter().find(|c| &c.column == column))
            .map(|c| c.scan_target.clone())
            .collect()
    }
}

fn role_of(column: &str) -> ColumnRole {
    match column {
        ID_COLUMN => ColumnRole::PrimaryKey,
        CREATED_AT_COLUMN => ColumnRole::CreatedAt,
        UPDATED_AT_COLUMN => ColumnRole::UpdatedAt,
        _ => ColumnRole::Data,
    }
}

fn bind_columns(shape: &ModelShape, var: &str) -> Vec<ColumnBinding> {
    let mut next_placeholder = 0;
    shape
        .columns
        .iter()
        .map(|c| {
            let role = role_of(&c.column);
            let mut binding = ColumnBinding {
                column: c.column.clone(),
                go_field: c.go_field.clone(),
                go_type: c.go_type.clone(),
                role,
                placeholder: None,
                insert_value: None,
                scan_target: format!("&{}.{}", var, c.go_field),
                update_set: None,
            };
            match role {
                ColumnRole::Data => {
                    next_placeholder += 1;
                    binding.placeholder = Some(next_placeholder);
                    binding.insert_value = Some(format!("{}.{}", var, c.go_field));
                    binding.update_set = Some(format!("{} = ${}", c.column, next_placeholder));
                }
                ColumnRole::UpdatedAt => {
                    binding.update_set = Some(format!("{} = CURRENT_TIMESTAMP", c.column));
                }
                ColumnRole::PrimaryKey | ColumnRole::CreatedAt => {}
            }
            binding
        })
        .collect()
}

/// The model's own package qualifier as seen from the repository package.
fn model_qualifier(config: &Config) -> Option<String> {
    match &config.repository_dir {
        Some(dir) if dir == &config.model_dir => None,
        _ => Some(config.model_package()),
    }
}

fn qualified(qualifier: Option<&str>, model: &str) -> String {
    match qualifier {
        Some(package) => format!("{}.{}", package, model),
        None => model.to_string(),
    }
}

fn belongs_to_stub(
    owner: &ModelShape,
    column: &ShapeColumn,
    related: &ModelShape,
    qualifier: Option<&str>,
) -> RelationStub {
    let reference = column.reference.as_deref().unwrap_or_default();
    let target_column = reference.split_once('.').map_or(ID_COLUMN, |(_, c)| c);
    let related_var = naming::local_var_name(&related.model);
    let param_type = owner
        .primary_key()
        .map_or("int64".to_string(), |pk| pk.go_type.clone());

    RelationStub {
        kind: RelationKind::BelongsTo,
        receiver: naming::repository_struct_name(&owner.model),
        method: naming::belongs_to_method_name(&naming::belongs_to_field_name(&column.column)),
        param: naming::id_param_name(&owner.model),
        param_type,
        related_model: related.model.clone(),
        related_type: qualified(qualifier, &related.model),
        query: format!(
            "SELECT {} FROM {} c JOIN {} p ON c.{} = p.{} WHERE c.{} = $1",
            related.select_list(Some("p")),
            owner.table,
            related.table,
            column.column,
            target_column,
            ID_COLUMN
        ),
        scan_targets: related.scan_targets(&related_var),
        related_var,
    }
}

/// Has-many helper on `parent`'s repository returning the `child` rows whose
/// `foreign_key` matches.
pub fn has_many_stub(parent: &str, child: &ModelShape, foreign_key: &str, qualifier: Option<&str>) -> RelationStub {
    let related_var = naming::local_var_name(&child.model);
    let param_type = child
        .column(foreign_key)
        .map_or("int64".to_string(), |c| c.go_type.clone());

    RelationStub {
        kind: RelationKind::HasMany,
        receiver: naming::repository_struct_name(parent),
        method: naming::has_many_method_name(&child.model),
        param: naming::id_param_name(parent),
        param_type,
        related_model: child.model.clone(),
        related_type: qualified(qualifier, &child.model),
        query: format!(
            "SELECT {} FROM {} WHERE {} = $1",
            child.select_list(None),
            child.table,
            foreign_key
        ),
        scan_targets: child.scan_targets(&related_var),
        related_var,
    }
}

/// Foreign key `child` uses to point at `table`.
fn foreign_key_into(child: &ModelShape, table: &str, parent: &str) -> String {
    child
        .columns
        .iter()
        .find(|c| {
            c.reference
                .as_deref()
                .is_some_and(|r| model::reference_table(r) == table)
        })
        .map(|c| c.column.clone())
        .unwrap_or_else(|| naming::default_foreign_key(parent))
}

/// Build the repository plan for `shape`, reading related models as needed.
pub fn plan(config: &Config, shape: &ModelShape, report: &mut Report) -> RepositoryPlan {
    let qualifier = model_qualifier(config);
    let qualifier = qualifier.as_deref();
    let var = naming::local_var_name(&shape.model);
    let columns = bind_columns(shape, &var);

    let primary_key = columns
        .iter()
        .find(|c| c.role == ColumnRole::PrimaryKey)
        .cloned()
        .unwrap_or_else(|| ColumnBinding {
            column: ID_COLUMN.to_string(),
            go_field: naming::go_field_name(ID_COLUMN),
            go_type: "int64".to_string(),
            role: ColumnRole::PrimaryKey,
            placeholder: None,
            insert_value: None,
            scan_target: format!("&{}.{}", var, naming::go_field_name(ID_COLUMN)),
            update_set: None,
        });

    let data: Vec<&ColumnBinding> = columns.iter().filter(|c| c.role == ColumnRole::Data).collect();
    let returning: Vec<String> = columns
        .iter()
        .filter(|c| c.role != ColumnRole::Data)
        .map(|c| c.column.clone())
        .collect();

    let mut insert_sql = if data.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", shape.table)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            shape.table,
            data.iter().map(|c| c.column.as_str()).collect::<Vec<_>>().join(", "),
            data.iter()
                .filter_map(|c| c.placeholder)
                .map(|n| format!("${}", n))
                .collect::<Vec<_>>()
                .join(", ")
        )
    };
    if !returning.is_empty() {
        insert_sql.push_str(&format!(" RETURNING {}", returning.join(", ")));
    }

    let mut sets: Vec<&str> = columns.iter().filter_map(|c| c.update_set.as_deref()).collect();
    let self_assign = format!("{0} = {0}", primary_key.column);
    if sets.is_empty() {
        sets.push(&self_assign);
    }
    let update_sql = format!(
        "UPDATE {} SET {} WHERE {} = ${}",
        shape.table,
        sets.join(", "),
        primary_key.column,
        data.len() + 1
    );

    let select_sql = format!("SELECT {} FROM {}", shape.select_list(None), shape.table);
    let get_sql = format!("{} WHERE {} = $1", select_sql, primary_key.column);
    let list_sql = format!("{} ORDER BY {}", select_sql, primary_key.column);
    let delete_sql = format!("DELETE FROM {} WHERE {} = $1", shape.table, primary_key.column);

    let mut taken: Vec<String> = ["Create", "GetByID", "Update", "Delete", "List"]
        .iter()
        .map(|m| m.to_string())
        .collect();
    let mut claim = |method: &str| {
        if taken.iter().any(|t| t == method) {
            tracing::debug!("{} already declared on {}, skipping", method, shape.model);
            false
        } else {
            taken.push(method.to_string());
            true
        }
    };

    let mut finders = Vec::new();
    for column in shape.columns.iter().filter(|c| c.reference.is_some()) {
        let method = naming::finder_method_name(&column.column);
        if !claim(&method) {
            continue;
        }
        finders.push(Finder {
            method,
            column: column.column.clone(),
            param: naming::go_param_name(&column.column),
            param_type: column.go_type.clone(),
            query: format!("{} WHERE {} = $1", select_sql, column.column),
        });
    }

    let mut relations = Vec::new();
    for column in shape.columns.iter() {
        let Some(reference) = column.reference.as_deref() else {
            continue;
        };
        let related_model = naming::model_name(model::reference_table(reference));
        let Some(related) = related_shape(config, &related_model, report) else {
            continue;
        };
        let stub = belongs_to_stub(shape, column, &related, qualifier);
        if claim(&stub.method) {
            relations.push(stub);
        }
    }
    for child_model in &shape.collections {
        let Some(child) = related_shape(config, child_model, report) else {
            continue;
        };
        let foreign_key = foreign_key_into(&child, &shape.table, &shape.model);
        let stub = has_many_stub(&shape.model, &child, &foreign_key, qualifier);
        if claim(&stub.method) {
            relations.push(stub);
        }
    }

    let mut imports = vec!["context".to_string(), "database/sql".to_string()];
    if qualifier.is_some() {
        imports.push(config.model_import_path());
    }

    RepositoryPlan {
        package: config.repository_package(),
        imports,
        model: shape.model.clone(),
        model_type: qualified(qualifier, &shape.model),
        table: shape.table.clone(),
        interface_name: naming::repository_interface_name(&shape.model),
        struct_name: naming::repository_struct_name(&shape.model),
        constructor: format!("New{}", naming::repository_interface_name(&shape.model)),
        primary_key,
        insert_sql,
        returning,
        select_sql,
        get_sql,
        list_sql,
        update_sql,
        delete_sql,
        finders,
        relations,
        columns,
        var,
    }
}

/// Render `name` and check that the result is Go this tool can edit later.
fn render_go(templates: &TemplateSet, name: &str, input: &RenderInput<'_>) -> Result<GoFile> {
    let text = templates.render(name, input)?;
    GoFile::parse(&text).map_err(|e| CodegenError::render(name, e.to_string()))
}

/// Regenerate the repository of `model` from its model file.
pub fn write(config: &Config, templates: &TemplateSet, path: &Path, model: &str, report: &mut Report) -> Result<()> {
    let shape = ModelShape::load(config, model)?;
    let plan = plan(config, &shape, report);
    tracing::debug!(
        "Repository plan for {}: {} columns, {} finders, {} relation helpers",
        plan.model,
        plan.columns.len(),
        plan.finders.len(),
        plan.relations.len()
    );

    let rendered = render_go(templates, templates::REPOSITORY, &RenderInput::Repository(&plan))?.render();
    match fs_utils::read_if_exists(path)? {
        None => {
            fs_utils::write_file(path, rendered)?;
            report.written(path);
        }
        Some(existing) => {
            if fs_utils::write_if_changed(path, &existing, &rendered)? {
                report.updated(path);
            }
        }
    }
    Ok(())
}

/// Add the has-many helper for `child` to the repository of `parent`.
/// Every problem with that repository is a warning.
fn link_has_many(
    config: &Config,
    templates: &TemplateSet,
    parent: &str,
    child: &ModelShape,
    foreign_key: &str,
    report: &mut Report,
) -> Result<()> {
    let Some(path) = config.repository_path(parent) else {
        return Ok(());
    };
    let source = match fs_utils::read_if_exists(&path)? {
        Some(source) => source,
        None => {
            report.warn(&path, format!("{} repository not found, has-many helper not added", parent));
            return Ok(());
        }
    };
    let mut file = match GoFile::parse(&source) {
        Ok(file) => file,
        Err(e) => {
            report.warn(&path, format!("has-many helper not added: {}", e));
            return Ok(());
        }
    };

    let qualifier = model_qualifier(config);
    let stub = has_many_stub(parent, child, foreign_key, qualifier.as_deref());
    let interface_name = naming::repository_interface_name(parent);
    let Some(interface) = file.interface_decl_mut(&interface_name) else {
        report.warn(&path, format!("interface {} not found, has-many helper not added", interface_name));
        return Ok(());
    };
    if !interface.has_method(&stub.method) {
        interface.push_method(&stub.method, &stub.signature());
    }

    if !file.has_func(Some(&stub.receiver), &stub.method) {
        let text = templates.render(templates::REPOSITORY_HAS_MANY, &RenderInput::Relation(&stub))?;
        let decls = go_source::parse_decls(&text)
            .map_err(|e| CodegenError::render(templates::REPOSITORY_HAS_MANY, e.to_string()))?;
        file.decls.extend(decls);
    }
    file.add_import("context");
    if qualifier.is_some() {
        file.add_import(&config.model_import_path());
    }

    if fs_utils::write_if_changed(&path, &source, &file.render())? {
        report.updated(&path);
    }
    Ok(())
}

/// Give the repositories of every model referenced from `fields` a has-many
/// helper for `model`.
pub fn propagate(
    config: &Config,
    templates: &TemplateSet,
    model: &str,
    fields: &[Field],
    report: &mut Report,
) -> Result<()> {
    let references: Vec<&Field> = fields.iter().filter(|f| f.is_reference).collect();
    if references.is_empty() {
        return Ok(());
    }

    let Some(child) = related_shape(config, model, report) else {
        return Ok(());
    };
    for field in references {
        let parent = naming::referenced_model(field);
        link_has_many(config, templates, &parent, &child, &field.name, report)?;
    }
    Ok(())
}

/// Remove the repository file. A file that is already gone is only reported.
pub fn remove(path: &Path, report: &mut Report) -> Result<()> {
    if fs_utils::remove_file_if_exists(path)? {
        report.removed(path);
    } else {
        report.warn(path, "repository file not found, nothing to remove");
    }
    Ok(())
}

/// Run the repository branch for `action`. Does nothing without a
/// configured `repository_dir`.
pub fn evolve(
    config: &Config,
    templates: &TemplateSet,
    entity: &str,
    action: Action,
    fields: &[Field],
    report: &mut Report,
) -> Result<()> {
    let model = naming::model_name(entity);
    let Some(path) = config.repository_path(&model) else {
        tracing::debug!("repository_dir not set, skipping repository for {}", model);
        return Ok(());
    };

    match action {
        Action::Create | Action::AddFields => {
            write(config, templates, &path, &model, report)?;
            propagate(config, templates, &model, fields, report)
        }
        Action::RemoveFields => write(config, templates, &path, &model, report),
        Action::Drop => remove(&path, report),
        Action::Unknown => Err(CodegenError::UnknownAction(action.as_str().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::field_parser::parse_fields;
    use crate::codegen::report::ArtifactKind;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        let config = Config {
            model_dir: dir.path().join("models"),
            migration_dir: dir.path().join("migrations"),
            repository_dir: Some(dir.path().join("repositories")),
            ..Config::default()
        };
        (dir, config)
    }

    fn create_model(config: &Config, entity: &str, tokens: &[&str]) {
        model::create(
            config,
            &TemplateSet::builtin(),
            entity,
            &parse_fields(tokens),
            &mut Report::new(),
        )
        .unwrap();
    }

    #[test]
    fn test_shape_from_struct() {
        let src = "package models\n\n\
                   type Post struct {\n\
                   \tID       int64\n\
                   \tAuthorID int64 `json:\"author_id\" db:\"author_id\" ref:\"authors\"`\n\
                   \tAuthor   *Author `db:\"-\"`\n\
                   \tEditor   *Author\n\
                   \tComments []*models.Comment `db:\"-\"`\n\
                   }\n";
        let file = GoFile::parse(src).unwrap();
        let shape = ModelShape::from_struct(file.struct_decl("Post").unwrap());

        assert_eq!(shape.table, "posts");
        let columns: Vec<_> = shape.columns.iter().map(|c| c.column.as_str()).collect();
        assert_eq!(columns, vec!["id", "author_id"]);
        assert_eq!(shape.columns[1].reference.as_deref(), Some("authors"));
        assert_eq!(shape.collections, vec!["Comment"]);
    }

    #[test]
    fn test_plan_statements() {
        let (_dir, config) = setup();
        create_model(&config, "post", &["title:string", "author_id:int:ref", "published:bool"]);
        let shape = ModelShape::load(&config, "Post").unwrap();
        let mut report = Report::new();
        let plan = plan(&config, &shape, &mut report);

        assert_eq!(
            plan.insert_sql,
            "INSERT INTO posts (title, author_id, published) VALUES ($1, $2, $3) RETURNING id, created_at, updated_at"
        );
        assert_eq!(
            plan.update_sql,
            "UPDATE posts SET title = $1, author_id = $2, published = $3, updated_at = CURRENT_TIMESTAMP WHERE id = $4"
        );
        assert_eq!(
            plan.get_sql,
            "SELECT id, title, author_id, published, created_at, updated_at FROM posts WHERE id = $1"
        );
        assert_eq!(plan.delete_sql, "DELETE FROM posts WHERE id = $1");
        assert_eq!(
            plan.update_args(),
            vec!["post.Title", "post.AuthorID", "post.Published", "post.ID"]
        );
        assert_eq!(
            plan.returning_targets(),
            vec!["&post.ID", "&post.CreatedAt", "&post.UpdatedAt"]
        );
        assert_eq!(plan.imports, vec!["context", "database/sql", "myapp/models"]);
        assert_eq!(plan.model_type, "models.Post");

        assert_eq!(plan.finders[0].method, "GetByAuthor");
        assert_eq!(plan.finders[0].param, "authorID");
        assert_eq!(
            plan.finders[0].query,
            "SELECT id, title, author_id, published, created_at, updated_at FROM posts WHERE author_id = $1"
        );

        // Author has no model file yet, so no GetAuthor helper.
        assert!(plan.relations.is_empty());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_plan_relation_stubs() {
        let (_dir, config) = setup();
        create_model(&config, "author", &["name:string"]);
        create_model(&config, "post", &["title:string", "author_id:int:ref"]);

        let mut report = Report::new();
        let post = plan(&config, &ModelShape::load(&config, "Post").unwrap(), &mut report);
        let stub = &post.relations[0];
        assert_eq!(stub.kind, RelationKind::BelongsTo);
        assert_eq!(stub.method, "GetAuthor");
        assert_eq!(stub.receiver, "postRepository");
        assert_eq!(
            stub.query,
            "SELECT p.id, p.name, p.created_at, p.updated_at FROM posts c JOIN authors p ON c.author_id = p.id WHERE c.id = $1"
        );
        assert_eq!(
            stub.signature(),
            "(ctx context.Context, postID int64) (*models.Author, error)"
        );

        let author = plan(&config, &ModelShape::load(&config, "Author").unwrap(), &mut report);
        let stub = &author.relations[0];
        assert_eq!(stub.kind, RelationKind::HasMany);
        assert_eq!(stub.method, "GetPosts");
        assert_eq!(
            stub.query,
            "SELECT id, title, author_id, created_at, updated_at FROM posts WHERE author_id = $1"
        );
        assert_eq!(stub.scan_targets[0], "&post.ID");
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_same_package_is_unqualified() {
        let (dir, mut config) = setup();
        config.repository_dir = Some(dir.path().join("models"));
        create_model(&config, "post", &["title"]);

        let plan = plan(&config, &ModelShape::load(&config, "Post").unwrap(), &mut Report::new());
        assert_eq!(plan.model_type, "Post");
        assert_eq!(plan.imports, vec!["context", "database/sql"]);
    }

    #[test]
    fn test_evolve_writes_and_regenerates() {
        let (_dir, config) = setup();
        let templates = TemplateSet::builtin();
        let path = config.repository_path("Post").unwrap();
        create_model(&config, "post", &["title:string"]);

        let mut report = Report::new();
        evolve(&config, &templates, "post", Action::Create, &[], &mut report).unwrap();
        assert!(report.contains(ArtifactKind::Written, &path));
        let source = std::fs::read_to_string(&path).unwrap();
        assert!(source.starts_with("// Code generated by codegenex.\npackage repositories\n"));
        assert!(source.contains("type PostRepository interface {\n"));
        assert!(GoFile::parse(&source).unwrap().has_func(Some("postRepository"), "List"));

        evolve(&config, &templates, "post", Action::RemoveFields, &[], &mut report).unwrap();
        assert!(!report.contains(ArtifactKind::Updated, &path), "nothing changed");

        evolve(&config, &templates, "post", Action::Drop, &[], &mut report).unwrap();
        assert!(!path.exists());
        evolve(&config, &templates, "post", Action::Drop, &[], &mut report).unwrap();
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_propagate_adds_has_many_once() {
        let (_dir, config) = setup();
        let templates = TemplateSet::builtin();
        let mut report = Report::new();

        create_model(&config, "author", &["name:string"]);
        evolve(&config, &templates, "author", Action::Create, &[], &mut report).unwrap();

        let fields = parse_fields(&["title:string", "author_id:int:ref"]);
        create_model(&config, "post", &["title:string", "author_id:int:ref"]);
        propagate(&config, &templates, "Post", &fields, &mut report).unwrap();
        let once = std::fs::read_to_string(config.repository_path("Author").unwrap()).unwrap();
        propagate(&config, &templates, "Post", &fields, &mut report).unwrap();
        let twice = std::fs::read_to_string(config.repository_path("Author").unwrap()).unwrap();

        assert_eq!(once, twice);
        assert_eq!(once.matches("GetPosts(").count(), 2, "interface and implementation");
        assert!(once.contains(
            "\tGetPosts(ctx context.Context, authorID int64) ([]*models.Post, error)\n"
        ));
        assert!(GoFile::parse(&once).unwrap().has_func(Some("authorRepository"), "GetPosts"));
    }

    #[test]
    fn test_propagate_without_parent_repository_warns() {
        let (_dir, config) = setup();
        let mut report = Report::new();
        create_model(&config, "post", &["author_id:int:ref"]);

        propagate(
            &config,
            &TemplateSet::builtin(),
            "Post",
            &parse_fields(&["author_id:int:ref"]),
            &mut report,
        )
        .unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].message.contains("Author repository not found"));
    }
}
