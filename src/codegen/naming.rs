//! Naming policy.
//!
//! Every name the tool writes to disk is derived here from the entity name or
//! a field name. Nothing is stored between runs, so these functions must stay
//! deterministic: a later run has to find the files an earlier run wrote.

use convert_case::{Case, Casing};

use crate::codegen::inflection::{pluralize, singularize};
use crate::codegen::types::Field;

/// Names of the columns injected on create when not declared.
pub const ID_COLUMN: &str = "id";
pub const CREATED_AT_COLUMN: &str = "created_at";
pub const UPDATED_AT_COLUMN: &str = "updated_at";

const GO_KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var",
];

/// Go initialisms kept upper-case inside identifiers.
const GO_INITIALISMS: &[&str] = &[
    "ACL", "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID",
    "IP", "JSON", "RPC", "SKU", "SLA", "SMTP", "SQL", "SSH", "TCP", "TLS", "TTL", "UDP", "UI",
    "UID", "UUID", "URI", "URL", "UTF8", "VM", "XML",
];

/// Convert a string to snake_case
pub fn to_snake_case(s: &str) -> String {
    s.to_case(Case::Snake)
}

/// Convert a string to PascalCase
pub fn to_pascal_case(s: &str) -> String {
    s.to_case(Case::Pascal)
}

/// Convert a string to camelCase
pub fn to_camel_case(s: &str) -> String {
    s.to_case(Case::Camel)
}

/// SQL table name: plural snake_case (`BlogPost` -> `blog_posts`).
pub fn table_name(entity: &str) -> String {
    pluralize(&to_snake_case(entity))
}

/// Model type name: singular PascalCase (`blog_posts` -> `BlogPost`).
pub fn model_name(entity: &str) -> String {
    singularize(&to_pascal_case(entity))
}

/// File-path stem shared by the model and repository files.
pub fn file_stem(model_name: &str) -> String {
    to_snake_case(model_name)
}

pub fn model_file_name(model_name: &str) -> String {
    format!("{}.go", file_stem(model_name))
}

pub fn repository_file_name(model_name: &str) -> String {
    format!("{}_repo.go", file_stem(model_name))
}

/// `<YYYYMMDDHHMMSS>_<action>_<entity>.sql`
pub fn migration_file_name(timestamp: &str, action: &str, entity: &str) -> String {
    format!("{}_{}_{}.sql", timestamp, action, to_snake_case(entity))
}

/// Go attribute name for a snake_case field (`author_id` -> `AuthorID`).
pub fn go_field_name(field_name: &str) -> String {
    to_snake_case(field_name)
        .split('_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let upper = segment.to_uppercase();
            if GO_INITIALISMS.contains(&upper.as_str()) {
                upper
            } else {
                to_pascal_case(segment)
            }
        })
        .collect()
}

/// Column name for a Go attribute without an explicit `db` tag.
pub fn column_for_go_field(go_name: &str) -> String {
    to_snake_case(go_name)
}

/// Go parameter name for a column (`author_id` -> `authorID`, `id` -> `id`).
pub fn go_param_name(column: &str) -> String {
    let chars: Vec<char> = go_field_name(column).chars().collect();
    let mut lower = chars.iter().take_while(|c| c.is_uppercase()).count();
    // `URLPath` -> `urlPath`: the last capital of a run starts the next word.
    if lower > 1 && lower < chars.len() {
        lower -= 1;
    }
    chars
        .iter()
        .enumerate()
        .flat_map(|(idx, c)| {
            if idx < lower {
                c.to_lowercase().collect::<Vec<_>>()
            } else {
                vec![*c]
            }
        })
        .collect()
}

/// Local variable name for a model (`BlogPost` -> `blogPost`).
pub fn var_name(model_name: &str) -> String {
    to_camel_case(model_name)
}

/// [`var_name`], suffixed when it would collide with a Go keyword
/// (`Select` -> `selectRow`).
pub fn local_var_name(model_name: &str) -> String {
    let name = var_name(model_name);
    if GO_KEYWORDS.contains(&name.as_str()) {
        format!("{}Row", name)
    } else {
        name
    }
}

fn strip_id_suffix(field_name: &str) -> &str {
    field_name.strip_suffix("_id").unwrap_or(field_name)
}

/// Entity a reference field points at (`author_id` -> `Author`).
pub fn referenced_entity(field_name: &str) -> String {
    singularize(&to_pascal_case(strip_id_suffix(field_name)))
}

/// Referenced model of a field, honouring an explicit override.
pub fn referenced_model(field: &Field) -> String {
    match &field.referenced_model {
        Some(model) => model.clone(),
        None => referenced_entity(&field.name),
    }
}

/// Referenced (table, column) of a reference field.
///
/// A `table.column` ref option wins; otherwise the `_id` suffix is stripped
/// and the remainder pluralized, pointing at its `id` column.
pub fn referenced_table(field: &Field) -> (String, String) {
    match field.reference_override() {
        Some((table, column)) => (table.to_string(), column.to_string()),
        None => (
            table_name(strip_id_suffix(&field.name)),
            ID_COLUMN.to_string(),
        ),
    }
}

/// Table-scoped SQL enum type (`posts`, `status` -> `posts_statuses`).
pub fn sql_enum_type_name(table: &str, field_name: &str) -> String {
    format!("{}_{}", table, pluralize(field_name))
}

/// Go enum alias (`Post`, `status` -> `PostStatusType`).
pub fn go_enum_type_name(model_name: &str, field_name: &str) -> String {
    format!("{}{}Type", model_name, go_field_name(field_name))
}

/// Go enum constant (`Post`, `status`, `draft` -> `PostStatusDraft`).
/// Characters that cannot appear in an identifier split words.
pub fn go_enum_const_name(model_name: &str, field_name: &str, value: &str) -> String {
    let words = value.replace(|c: char| !c.is_alphanumeric(), " ");
    format!("{}{}{}", model_name, go_field_name(field_name), to_pascal_case(words.trim()))
}

/// Belongs-to accessor attribute on the "many" side (`author_id` -> `Author`).
pub fn belongs_to_field_name(field_name: &str) -> String {
    go_field_name(strip_id_suffix(field_name))
}

/// Has-many collection attribute on the "one" side (`Post` -> `Posts`).
pub fn has_many_field_name(model_name: &str) -> String {
    pluralize(model_name)
}

/// Foreign key column a child table uses for `parent_model`
/// when nothing more specific is known (`Author` -> `author_id`).
pub fn default_foreign_key(parent_model: &str) -> String {
    format!("{}_id", to_snake_case(parent_model))
}

pub fn repository_interface_name(model_name: &str) -> String {
    format!("{}Repository", model_name)
}

pub fn repository_struct_name(model_name: &str) -> String {
    format!("{}Repository", var_name(model_name))
}

/// Finder on a reference column (`author_id` -> `GetByAuthor`).
pub fn finder_method_name(field_name: &str) -> String {
    format!("GetBy{}", go_field_name(strip_id_suffix(field_name)))
}

/// Belongs-to accessor method (`Author` -> `GetAuthor`).
pub fn belongs_to_method_name(referenced_model: &str) -> String {
    format!("Get{}", referenced_model)
}

/// Has-many accessor method (`Post` -> `GetPosts`).
pub fn has_many_method_name(child_model: &str) -> String {
    format!("Get{}", pluralize(child_model))
}

/// Parameter carrying the primary key of `model_name` (`Author` -> `authorID`).
pub fn id_param_name(model_name: &str) -> String {
    format!("{}ID", var_name(model_name))
}
