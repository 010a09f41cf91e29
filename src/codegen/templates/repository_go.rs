//! Go repository render targets.

use std::fmt::{self, Write};

use crate::codegen::repository::{RelationKind, RelationStub, RepositoryPlan};
use crate::codegen::templates::model_go::GENERATED_HEADER;
use crate::codegen::templates::{unexpected_input, RenderInput};

fn args_suffix<S: AsRef<str>>(args: &[S]) -> String {
    args.iter().map(|a| format!(", {}", a.as_ref())).collect()
}

fn join<S: AsRef<str>>(items: &[S]) -> String {
    items.iter().map(|i| i.as_ref()).collect::<Vec<_>>().join(", ")
}

struct QueryMany<'a> {
    receiver: &'a str,
    method: &'a str,
    params: String,
    args: String,
    query: &'a str,
    model_type: &'a str,
    var: &'a str,
    scan_targets: String,
}

fn write_query_many(out: &mut String, q: &QueryMany<'_>) -> fmt::Result {
    writeln!(
        out,
        "func (r *{}) {}(ctx context.Context{}) ([]*{}, error) {{",
        q.receiver, q.method, q.params, q.model_type
    )?;
    writeln!(out, "\trows, err := r.db.QueryContext(ctx, \"{}\"{})", q.query, q.args)?;
    writeln!(out, "\tif err != nil {{")?;
    writeln!(out, "\t\treturn nil, err")?;
    writeln!(out, "\t}}")?;
    writeln!(out, "\tdefer rows.Close()")?;
    writeln!(out)?;
    writeln!(out, "\tvar results []*{}", q.model_type)?;
    writeln!(out, "\tfor rows.Next() {{")?;
    writeln!(out, "\t\t{} := &{}{{}}", q.var, q.model_type)?;
    writeln!(out, "\t\tif err := rows.Scan({}); err != nil {{", q.scan_targets)?;
    writeln!(out, "\t\t\treturn nil, err")?;
    writeln!(out, "\t\t}}")?;
    writeln!(out, "\t\tresults = append(results, {})", q.var)?;
    writeln!(out, "\t}}")?;
    writeln!(out, "\treturn results, rows.Err()")?;
    writeln!(out, "}}")
}

fn write_relation(out: &mut String, stub: &RelationStub) -> fmt::Result {
    match stub.kind {
        RelationKind::BelongsTo => {
            writeln!(
                out,
                "// {} returns the {} referenced by the given row.",
                stub.method, stub.related_model
            )?;
            writeln!(out, "func (r *{}) {}{} {{", stub.receiver, stub.method, stub.signature())?;
            writeln!(out, "\t{} := &{}{{}}", stub.related_var, stub.related_type)?;
            writeln!(
                out,
                "\terr := r.db.QueryRowContext(ctx, \"{}\", {}).Scan({})",
                stub.query,
                stub.param,
                join(&stub.scan_targets)
            )?;
            writeln!(out, "\tif err != nil {{")?;
            writeln!(out, "\t\treturn nil, err")?;
            writeln!(out, "\t}}")?;
            writeln!(out, "\treturn {}, nil", stub.related_var)?;
            writeln!(out, "}}")
        }
        RelationKind::HasMany => {
            writeln!(
                out,
                "// {} returns the {} rows that belong to the given row.",
                stub.method, stub.related_model
            )?;
            write_query_many(
                out,
                &QueryMany {
                    receiver: &stub.receiver,
                    method: &stub.method,
                    params: format!(", {} {}", stub.param, stub.param_type),
                    args: format!(", {}", stub.param),
                    query: &stub.query,
                    model_type: &stub.related_type,
                    var: &stub.related_var,
                    scan_targets: join(&stub.scan_targets),
                },
            )
        }
    }
}

fn repository_source(plan: &RepositoryPlan) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let pk = &plan.primary_key;
    let model_ptr = format!("*{}", plan.model_type);

    writeln!(out, "{}", GENERATED_HEADER)?;
    writeln!(out, "package {}", plan.package)?;
    writeln!(out)?;
    writeln!(out, "import (")?;
    for import in &plan.imports {
        writeln!(out, "\t\"{}\"", import)?;
    }
    writeln!(out, ")")?;
    writeln!(out)?;

    writeln!(out, "// {} provides access to the {} table.", plan.interface_name, plan.table)?;
    writeln!(out, "type {} interface {{", plan.interface_name)?;
    writeln!(out, "\tCreate(ctx context.Context, {} {}) error", plan.var, model_ptr)?;
    writeln!(out, "\tGetByID(ctx context.Context, id {}) ({}, error)", pk.go_type, model_ptr)?;
    writeln!(out, "\tUpdate(ctx context.Context, {} {}) error", plan.var, model_ptr)?;
    writeln!(out, "\tDelete(ctx context.Context, id {}) error", pk.go_type)?;
    writeln!(out, "\tList(ctx context.Context) ([]{}, error)", model_ptr)?;
    for finder in &plan.finders {
        writeln!(
            out,
            "\t{}(ctx context.Context, {} {}) ([]{}, error)",
            finder.method, finder.param, finder.param_type, model_ptr
        )?;
    }
    for stub in &plan.relations {
        writeln!(out, "\t{}{}", stub.method, stub.signature())?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(out, "type {} struct {{", plan.struct_name)?;
    writeln!(out, "\tdb *sql.DB")?;
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(out, "// {} returns a {} backed by db.", plan.constructor, plan.interface_name)?;
    writeln!(out, "func {}(db *sql.DB) {} {{", plan.constructor, plan.interface_name)?;
    writeln!(out, "\treturn &{}{{db: db}}", plan.struct_name)?;
    writeln!(out, "}}")?;
    writeln!(out)?;

    // Create
    writeln!(
        out,
        "func (r *{}) Create(ctx context.Context, {} {}) error {{",
        plan.struct_name, plan.var, model_ptr
    )?;
    let insert_args = args_suffix(&plan.insert_args());
    if plan.returning.is_empty() {
        writeln!(out, "\t_, err := r.db.ExecContext(ctx, \"{}\"{})", plan.insert_sql, insert_args)?;
        writeln!(out, "\treturn err")?;
    } else {
        writeln!(
            out,
            "\treturn r.db.QueryRowContext(ctx, \"{}\"{}).Scan({})",
            plan.insert_sql,
            insert_args,
            join(&plan.returning_targets())
        )?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;

    // GetByID
    writeln!(
        out,
        "func (r *{}) GetByID(ctx context.Context, id {}) ({}, error) {{",
        plan.struct_name, pk.go_type, model_ptr
    )?;
    writeln!(out, "\t{} := &{}{{}}", plan.var, plan.model_type)?;
    writeln!(
        out,
        "\terr := r.db.QueryRowContext(ctx, \"{}\", id).Scan({})",
        plan.get_sql,
        join(&plan.scan_targets())
    )?;
    writeln!(out, "\tif err != nil {{")?;
    writeln!(out, "\t\treturn nil, err")?;
    writeln!(out, "\t}}")?;
    writeln!(out, "\treturn {}, nil", plan.var)?;
    writeln!(out, "}}")?;
    writeln!(out)?;

    // Update
    writeln!(
        out,
        "func (r *{}) Update(ctx context.Context, {} {}) error {{",
        plan.struct_name, plan.var, model_ptr
    )?;
    writeln!(
        out,
        "\t_, err := r.db.ExecContext(ctx, \"{}\"{})",
        plan.update_sql,
        args_suffix(&plan.update_args())
    )?;
    writeln!(out, "\treturn err")?;
    writeln!(out, "}}")?;
    writeln!(out)?;

    // Delete
    writeln!(
        out,
        "func (r *{}) Delete(ctx context.Context, id {}) error {{",
        plan.struct_name, pk.go_type
    )?;
    writeln!(out, "\t_, err := r.db.ExecContext(ctx, \"{}\", id)", plan.delete_sql)?;
    writeln!(out, "\treturn err")?;
    writeln!(out, "}}")?;

    let scan_targets = join(&plan.scan_targets());
    writeln!(out)?;
    write_query_many(
        &mut out,
        &QueryMany {
            receiver: &plan.struct_name,
            method: "List",
            params: String::new(),
            args: String::new(),
            query: &plan.list_sql,
            model_type: &plan.model_type,
            var: &plan.var,
            scan_targets: scan_targets.clone(),
        },
    )?;

    for finder in &plan.finders {
        writeln!(out)?;
        write_query_many(
            &mut out,
            &QueryMany {
                receiver: &plan.struct_name,
                method: &finder.method,
                params: format!(", {} {}", finder.param, finder.param_type),
                args: format!(", {}", finder.param),
                query: &finder.query,
                model_type: &plan.model_type,
                var: &plan.var,
                scan_targets: scan_targets.clone(),
            },
        )?;
    }

    for stub in &plan.relations {
        writeln!(out)?;
        write_relation(&mut out, stub)?;
    }

    Ok(out)
}

pub fn render_repository(input: &RenderInput<'_>) -> Result<String, String> {
    match input {
        RenderInput::Repository(plan) => repository_source(plan).map_err(|e| e.to_string()),
        other => Err(unexpected_input("repository plan", other)),
    }
}

/// A single has-many method, for splicing into an existing repository.
pub fn render_has_many(input: &RenderInput<'_>) -> Result<String, String> {
    match input {
        RenderInput::Relation(stub) => {
            let mut out = String::new();
            write_relation(&mut out, stub).map_err(|e| e.to_string())?;
            Ok(out)
        }
        other => Err(unexpected_input("relation stub", other)),
    }
}
