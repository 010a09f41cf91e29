//! Migration planner.
//!
//! Maps an action and its fields onto a [`MigrationPlan`]. The plan is the
//! same for every action; the action only selects which render target turns
//! it into SQL.

use std::path::PathBuf;

use crate::codegen::config::Config;
use crate::codegen::fs_utils;
use crate::codegen::naming::{self, CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN};
use crate::codegen::report::Report;
use crate::codegen::templates::{self, RenderInput, TemplateSet};
use crate::codegen::types::{Action, Field, Primitive};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub action: Action,
    pub table: String,
    pub columns: Vec<ColumnPlan>,
    pub indexes: Vec<IndexPlan>,
    pub foreign_keys: Vec<ForeignKeyPlan>,
    pub enums: Vec<EnumPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPlan {
    pub name: String,
    pub sql_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub unique: bool,
    /// Name of the SQL enum type backing this column
    pub enum_type: Option<String>,
    pub primary_key: bool,
}

impl ColumnPlan {
    fn primary_key() -> Self {
        ColumnPlan {
            name: ID_COLUMN.to_string(),
            sql_type: "SERIAL".to_string(),
            nullable: false,
            default: None,
            unique: false,
            enum_type: None,
            primary_key: true,
        }
    }

    fn timestamp(name: &str) -> Self {
        ColumnPlan {
            name: name.to_string(),
            sql_type: "TIMESTAMP".to_string(),
            nullable: false,
            default: Some("CURRENT_TIMESTAMP".to_string()),
            unique: false,
            enum_type: None,
            primary_key: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPlan {
    pub name: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyPlan {
    pub column: String,
    pub ref_table: String,
    pub ref_column: String,
    pub on_delete: OnDelete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumPlan {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
    SetNull,
    Restrict,
    NoAction,
}

impl OnDelete {
    /// Map a ref policy token. Unknown tokens fall back to CASCADE.
    pub fn from_policy(policy: Option<&str>) -> Self {
        match policy {
            Some("nullify") => OnDelete::SetNull,
            Some("restrict") => OnDelete::Restrict,
            Some("no_action") => OnDelete::NoAction,
            _ => OnDelete::Cascade,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
            OnDelete::Restrict => "RESTRICT",
            OnDelete::NoAction => "NO ACTION",
        }
    }
}

/// SQL column type for a field's primitive. Enum fields are handled by
/// [`plan`], which substitutes the table-scoped enum type.
pub fn sql_type(field: &Field) -> String {
    let base = match &field.field_type.primitive {
        Primitive::Int => "INTEGER",
        Primitive::String => "VARCHAR(255)",
        Primitive::Bool => "BOOLEAN",
        Primitive::Time => "TIMESTAMP",
        Primitive::Float => "NUMERIC",
        Primitive::Jsonb => "JSONB",
        Primitive::Untyped | Primitive::Other(_) => "VARCHAR(255)",
    };

    if field.field_type.is_array {
        format!("{}[]", base)
    } else {
        base.to_string()
    }
}

/// Build the migration plan for `table`.
///
/// On create the `id` primary key is injected first and the
/// `created_at`/`updated_at` timestamps last, each only when not declared.
/// A field named twice is planned once, from its first occurrence.
pub fn plan(table: &str, fields: &[Field], action: Action) -> MigrationPlan {
    let creating = action == Action::Create;
    let mut plan = MigrationPlan {
        action,
        table: table.to_string(),
        columns: Vec::new(),
        indexes: Vec::new(),
        foreign_keys: Vec::new(),
        enums: Vec::new(),
    };

    if creating && !fields.iter().any(|f| f.is_named(ID_COLUMN)) {
        plan.columns.push(ColumnPlan::primary_key());
    }

    for field in fields {
        if plan.columns.iter().any(|c| field.is_named(&c.name)) {
            tracing::debug!("Duplicate field {} for {}, keeping the first", field.name, table);
            continue;
        }

        let mut column = ColumnPlan {
            name: field.name.clone(),
            sql_type: sql_type(field),
            nullable: field.is_nullable,
            default: field.default_value.clone(),
            unique: field.is_unique,
            enum_type: None,
            primary_key: creating && field.is_named(ID_COLUMN),
        };

        if field.is_enum {
            let enum_name = naming::sql_enum_type_name(table, &field.name);
            column.sql_type = enum_name.clone();
            column.enum_type = Some(enum_name.clone());
            plan.enums.push(EnumPlan {
                name: enum_name,
                values: field.enum_values.clone(),
            });
        }

        if field.is_index {
            plan.indexes.push(IndexPlan {
                name: format!("idx_{}_{}", table, field.name),
                columns: vec![field.name.clone()],
            });
        }

        if field.is_reference {
            let (ref_table, ref_column) = naming::referenced_table(field);
            let on_delete = if field.reference_override().is_some() {
                OnDelete::Cascade
            } else {
                OnDelete::from_policy(field.ref_options.as_deref())
            };
            plan.foreign_keys.push(ForeignKeyPlan {
                column: field.name.clone(),
                ref_table,
                ref_column,
                on_delete,
            });
        }

        plan.columns.push(column);
    }

    if creating {
        for name in [CREATED_AT_COLUMN, UPDATED_AT_COLUMN] {
            if !fields.iter().any(|f| f.is_named(name)) {
                plan.columns.push(ColumnPlan::timestamp(name));
            }
        }
    }

    plan
}

/// Plan, render and write the migration for one run.
///
/// # Arguments
///
/// * `entity` - Entity name as given on the command line
/// * `timestamp` - `YYYYMMDDHHMMSS` prefix of the file name
pub fn generate(
    config: &Config,
    templates: &TemplateSet,
    entity: &str,
    action: Action,
    fields: &[Field],
    timestamp: &str,
    report: &mut Report,
) -> Result<PathBuf> {
    let plan = plan(&naming::table_name(entity), fields, action);
    tracing::debug!(
        "Migration plan for {}: {} columns, {} indexes, {} foreign keys, {} enums",
        plan.table,
        plan.columns.len(),
        plan.indexes.len(),
        plan.foreign_keys.len(),
        plan.enums.len()
    );

    let sql = templates.render(
        templates::migration_template(action),
        &RenderInput::Migration(&plan),
    )?;

    let file_name = naming::migration_file_name(timestamp, action.as_str(), entity);
    let path = config.migration_path(&file_name);
    fs_utils::write_file(&path, sql)?;
    report.written(&path);

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::field_parser::{parse_field, parse_fields};

    #[test]
    fn test_sql_type_mapping() {
        let cases = [
            ("a:int", "INTEGER"),
            ("a:string", "VARCHAR(255)"),
            ("a:bool", "BOOLEAN"),
            ("a:time", "TIMESTAMP"),
            ("a:float", "NUMERIC"),
            ("a:jsonb", "JSONB"),
            ("a:int[]", "INTEGER[]"),
            ("a:jsonb[]", "JSONB[]"),
            ("a:uuid", "VARCHAR(255)"),
            ("a", "VARCHAR(255)"),
        ];
        for (token, expected) in cases {
            assert_eq!(sql_type(&parse_field(token)), expected, "{}", token);
        }
    }

    #[test]
    fn test_create_plan_injects_implicit_columns() {
        let fields = parse_fields(&[
            "title:string",
            "author_id:int:ref",
            "published:bool:default=false",
        ]);
        let plan = plan("posts", &fields, Action::Create);

        let names: Vec<_> = plan.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["id", "title", "author_id", "published", "created_at", "updated_at"]
        );
        assert!(plan.columns[0].primary_key);
        assert_eq!(plan.columns[3].default.as_deref(), Some("false"));

        assert_eq!(
            plan.foreign_keys,
            vec![ForeignKeyPlan {
                column: "author_id".to_string(),
                ref_table: "authors".to_string(),
                ref_column: "id".to_string(),
                on_delete: OnDelete::Cascade,
            }]
        );
    }

    #[test]
    fn test_declared_implicit_columns_not_duplicated() {
        let fields = parse_fields(&["id:int", "created_at:time"]);
        let plan = plan("events", &fields, Action::Create);
        let names: Vec<_> = plan.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "created_at", "updated_at"]);
        assert!(plan.columns[0].primary_key);
        assert_eq!(plan.columns[0].sql_type, "INTEGER");
    }

    #[test]
    fn test_add_fields_plan_has_no_implicit_columns() {
        let fields = parse_fields(&["score:float:i"]);
        let plan = plan("posts", &fields, Action::AddFields);
        assert_eq!(plan.columns.len(), 1);
        assert_eq!(plan.indexes[0].name, "idx_posts_score");
    }

    #[test]
    fn test_enum_and_reference_policies() {
        let fields = parse_fields(&[
            "status:enum[draft,published]",
            "editor_id:int:ref=nullify",
            "owner_id:int:ref=users.uid",
            "reviewer_id:int:ref=whatever",
        ]);
        let plan = plan("posts", &fields, Action::Create);

        assert_eq!(plan.enums[0].name, "posts_statuses");
        assert_eq!(plan.enums[0].values, vec!["draft", "published"]);
        let status = plan.columns.iter().find(|c| c.name == "status").unwrap();
        assert_eq!(status.sql_type, "posts_statuses");

        let policies: Vec<_> = plan.foreign_keys.iter().map(|fk| fk.on_delete).collect();
        assert_eq!(
            policies,
            vec![OnDelete::SetNull, OnDelete::Cascade, OnDelete::Cascade]
        );
        assert_eq!(plan.foreign_keys[1].ref_table, "users");
        assert_eq!(plan.foreign_keys[1].ref_column, "uid");
        assert_eq!(plan.foreign_keys[2].ref_table, "reviewers");
    }

    #[test]
    fn test_restrict_and_no_action_policies() {
        let fields = parse_fields(&["owner_id:int:ref=restrict", "team_id:int:ref=no_action"]);
        let plan = plan("projects", &fields, Action::Create);

        let policies: Vec<_> = plan.foreign_keys.iter().map(|fk| fk.on_delete).collect();
        assert_eq!(policies, vec![OnDelete::Restrict, OnDelete::NoAction]);
        assert_eq!(plan.foreign_keys[0].ref_table, "owners");
        assert_eq!(plan.foreign_keys[1].ref_table, "teams");
        assert_eq!(OnDelete::Restrict.as_sql(), "RESTRICT");
        assert_eq!(OnDelete::NoAction.as_sql(), "NO ACTION");
    }

    #[test]
    fn test_duplicate_fields_keep_first() {
        let fields = parse_fields(&["title:string", "title:int:unique", "views:int"]);
        let plan = plan("posts", &fields, Action::Create);
        let names: Vec<_> = plan.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "title", "views", "created_at", "updated_at"]);
        assert_eq!(plan.columns[1].sql_type, "VARCHAR(255)");
        assert!(!plan.columns[1].unique);

        let fields = parse_fields(&["tag_id:int:ref", "tag_id:int:ref:i"]);
        let plan = super::plan("posts", &fields, Action::AddFields);
        assert_eq!(plan.columns.len(), 1);
        assert_eq!(plan.foreign_keys.len(), 1);
        assert!(plan.indexes.is_empty());
    }
}
