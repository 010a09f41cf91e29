//! SQL migration render targets (PostgreSQL dialect).

use std::fmt::Write;

use crate::codegen::migration::{ColumnPlan, MigrationPlan};
use crate::codegen::templates::{unexpected_input, RenderInput};

fn migration_plan<'a>(input: &RenderInput<'a>) -> Result<&'a MigrationPlan, String> {
    match input {
        RenderInput::Migration(plan) => Ok(*plan),
        other => Err(unexpected_input("migration plan", other)),
    }
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `<name> <TYPE>[ DEFAULT v][ NOT NULL][ UNIQUE]`
fn column_definition(column: &ColumnPlan) -> String {
    if column.primary_key {
        return format!("{} {} PRIMARY KEY", column.name, column.sql_type);
    }

    let mut definition = format!("{} {}", column.name, column.sql_type);
    if let Some(default) = &column.default {
        definition.push_str(&format!(" DEFAULT {}", default));
    }
    if !column.nullable {
        definition.push_str(" NOT NULL");
    }
    if column.unique {
        definition.push_str(" UNIQUE");
    }
    definition
}

fn write_header(out: &mut String, verb: &str, plan: &MigrationPlan) -> std::fmt::Result {
    writeln!(out, "-- Migration: {} {}", verb, plan.table)?;
    writeln!(out)
}

fn write_enum_types(out: &mut String, plan: &MigrationPlan) -> std::fmt::Result {
    for enum_plan in &plan.enums {
        let values: Vec<String> = enum_plan.values.iter().map(|v| quote_literal(v)).collect();
        writeln!(
            out,
            "CREATE TYPE {} AS ENUM ({});",
            enum_plan.name,
            values.join(", ")
        )?;
    }
    if !plan.enums.is_empty() {
        writeln!(out)?;
    }
    Ok(())
}

fn write_indexes(out: &mut String, plan: &MigrationPlan) -> std::fmt::Result {
    if plan.indexes.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    for index in &plan.indexes {
        writeln!(
            out,
            "CREATE INDEX {} ON {} ({});",
            index.name,
            plan.table,
            index.columns.join(", ")
        )?;
    }
    Ok(())
}

fn create_sql(plan: &MigrationPlan) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_header(&mut out, "create", plan)?;
    write_enum_types(&mut out, plan)?;

    let mut lines: Vec<String> = plan.columns.iter().map(column_definition).collect();
    for fk in &plan.foreign_keys {
        lines.push(format!(
            "FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE {}",
            fk.column,
            fk.ref_table,
            fk.ref_column,
            fk.on_delete.as_sql()
        ));
    }

    writeln!(out, "CREATE TABLE {} (", plan.table)?;
    writeln!(out, "    {}", lines.join(",\n    "))?;
    writeln!(out, ");")?;

    write_indexes(&mut out, plan)?;
    Ok(out)
}

fn add_fields_sql(plan: &MigrationPlan) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_header(&mut out, "add fields to", plan)?;
    write_enum_types(&mut out, plan)?;

    for column in &plan.columns {
        writeln!(
            out,
            "ALTER TABLE {} ADD COLUMN {};",
            plan.table,
            column_definition(column)
        )?;
    }

    for fk in &plan.foreign_keys {
        writeln!(
            out,
            "ALTER TABLE {} ADD CONSTRAINT fk_{}_{} FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE {};",
            plan.table,
            plan.table,
            fk.column,
            fk.column,
            fk.ref_table,
            fk.ref_column,
            fk.on_delete.as_sql()
        )?;
    }

    write_indexes(&mut out, plan)?;
    Ok(out)
}

fn remove_fields_sql(plan: &MigrationPlan) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_header(&mut out, "remove fields from", plan)?;

    for column in &plan.columns {
        writeln!(
            out,
            "ALTER TABLE {} DROP COLUMN IF EXISTS {};",
            plan.table, column.name
        )?;
    }

    if !plan.enums.is_empty() {
        writeln!(out)?;
    }
    for enum_plan in &plan.enums {
        writeln!(out, "DROP TYPE IF EXISTS {};", enum_plan.name)?;
    }
    Ok(out)
}

fn drop_sql(plan: &MigrationPlan) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_header(&mut out, "drop", plan)?;
    writeln!(out, "DROP TABLE IF EXISTS {};", plan.table)?;
    Ok(out)
}

pub fn render_create(input: &RenderInput<'_>) -> Result<String, String> {
    create_sql(migration_plan(input)?).map_err(|e| e.to_string())
}

pub fn render_add_fields(input: &RenderInput<'_>) -> Result<String, String> {
    add_fields_sql(migration_plan(input)?).map_err(|e| e.to_string())
}

pub fn render_remove_fields(input: &RenderInput<'_>) -> Result<String, String> {
    remove_fields_sql(migration_plan(input)?).map_err(|e| e.to_string())
}

pub fn render_drop(input: &RenderInput<'_>) -> Result<String, String> {
    drop_sql(migration_plan(input)?).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::field_parser::parse_fields;
    use crate::codegen::migration::plan;
    use crate::codegen::types::Action;

    fn render(tokens: &[&str], action: Action) -> String {
        let fields = parse_fields(tokens);
        let plan = plan("posts", &fields, action);
        let input = RenderInput::Migration(&plan);
        match action {
            Action::Create => render_create(&input),
            Action::AddFields => render_add_fields(&input),
            Action::RemoveFields => render_remove_fields(&input),
            _ => render_drop(&input),
        }
        .unwrap()
    }

    #[test]
    fn test_create_table() {
        let sql = render(
            &[
                "title:string:i",
                "author_id:int:ref",
                "published:bool:default=false",
                "status:enum[draft,o'clock]:null",
            ],
            Action::Create,
        );
        let expected = "\
-- Migration: create posts

CREATE TYPE posts_statuses AS ENUM ('draft', 'o''clock');

CREATE TABLE posts (
    id SERIAL PRIMARY KEY,
    title VARCHAR(255) NOT NULL,
    author_id INTEGER NOT NULL,
    published BOOLEAN DEFAULT false NOT NULL,
    status posts_statuses,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP NOT NULL,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP NOT NULL,
    FOREIGN KEY (author_id) REFERENCES authors(id) ON DELETE CASCADE
);

CREATE INDEX idx_posts_title ON posts (title);
";
        assert_eq!(sql, expected);
    }

    #[test]
    fn test_add_fields() {
        let sql = render(&["editor_id:int:ref=nullify:null", "slug:string:unique"], Action::AddFields);
        assert!(sql.contains("ALTER TABLE posts ADD COLUMN editor_id INTEGER;\n"));
        assert!(sql.contains("ALTER TABLE posts ADD COLUMN slug VARCHAR(255) NOT NULL UNIQUE;\n"));
        assert!(sql.contains(
            "ALTER TABLE posts ADD CONSTRAINT fk_posts_editor_id FOREIGN KEY (editor_id) REFERENCES editors(id) ON DELETE SET NULL;"
        ));
        assert!(!sql.contains("created_at"));
    }

    #[test]
    fn test_on_delete_policies() {
        let sql = render(
            &["owner_id:int:ref=restrict", "team_id:int:ref=no_action", "title:string", "title:int"],
            Action::Create,
        );
        assert!(sql.contains("    FOREIGN KEY (owner_id) REFERENCES owners(id) ON DELETE RESTRICT,\n"));
        assert!(sql.contains("    FOREIGN KEY (team_id) REFERENCES teams(id) ON DELETE NO ACTION\n"));
        assert_eq!(sql.matches("    title ").count(), 1);

        let sql = render(&["owner_id:int:ref=restrict:null"], Action::AddFields);
        assert!(sql.contains(
            "ALTER TABLE posts ADD CONSTRAINT fk_posts_owner_id FOREIGN KEY (owner_id) REFERENCES owners(id) ON DELETE RESTRICT;"
        ));
        let sql = render(&["team_id:int:ref=no_action:null"], Action::AddFields);
        assert!(sql.contains("REFERENCES teams(id) ON DELETE NO ACTION;"));
    }

    #[test]
    fn test_remove_fields_and_drop() {
        let sql = render(&["title", "status:enum[a,b]"], Action::RemoveFields);
        assert!(sql.contains("ALTER TABLE posts DROP COLUMN IF EXISTS title;\n"));
        assert!(sql.contains("ALTER TABLE posts DROP COLUMN IF EXISTS status;\n"));
        assert!(sql.contains("DROP TYPE IF EXISTS posts_statuses;\n"));

        let sql = render(&[], Action::Drop);
        assert_eq!(sql, "-- Migration: drop posts\n\nDROP TABLE IF EXISTS posts;\n");
    }
}
