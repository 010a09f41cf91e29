//! Field DSL parser.
//!
//! Turns `name[:type[:option]*]` tokens into [`Field`] records. Parsing is
//! permissive: unknown options are ignored and missing pieces leave the field
//! at its defaults, so this module has no error type.

use crate::codegen::naming;
use crate::codegen::types::{Action, Field, FieldType, Primitive};

/// Default on-delete policy recorded for a bare `ref` option.
pub const DEFAULT_REF_POLICY: &str = "cascade";

/// Parse every token of the command line tail.
///
/// # Example
///
/// ```
/// use codegenex::codegen::parse_fields;
///
/// let fields = parse_fields(&["title:string:i", "author_id:int:ref"]);
/// assert_eq!(fields.len(), 2);
/// assert!(fields[0].is_index);
/// assert!(fields[1].is_reference);
/// ```
pub fn parse_fields<S: AsRef<str>>(tokens: &[S]) -> Vec<Field> {
    tokens.iter().map(|token| parse_field(token.as_ref())).collect()
}

/// Parse the action argument. See [`Action::parse`].
pub fn parse_action(action: &str) -> Action {
    Action::parse(action)
}

/// Parse a single `name:type:option...` token.
pub fn parse_field(token: &str) -> Field {
    let mut parts = token.split(':');

    let mut field = Field {
        name: parts.next().unwrap_or_default().to_string(),
        ..Default::default()
    };

    if let Some(raw_type) = parts.next() {
        match parse_enum_values(raw_type) {
            Some(values) => {
                field.is_enum = true;
                field.enum_values = values;
                field.field_type = FieldType::scalar(Primitive::String);
            }
            None => field.field_type = FieldType::parse(raw_type),
        }
    }

    // Options are order-independent; a later duplicate wins.
    for option in parts {
        apply_option(&mut field, option);
    }

    field
}

fn apply_option(field: &mut Field, option: &str) {
    match option {
        "i" => field.is_index = true,
        "unique" => field.is_unique = true,
        "null" => field.is_nullable = true,
        "ref" => set_reference(field, DEFAULT_REF_POLICY),
        _ => {
            if let Some(value) = option.strip_prefix("default=") {
                field.default_value = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            } else if let Some(policy) = option.strip_prefix("ref=") {
                let policy = if policy.is_empty() { DEFAULT_REF_POLICY } else { policy };
                set_reference(field, policy);
            } else {
                tracing::debug!("Ignoring unknown option '{}' on field '{}'", option, field.name);
            }
        }
    }
}

fn set_reference(field: &mut Field, options: &str) {
    field.is_reference = true;
    field.ref_options = Some(options.to_string());
    field.referenced_model = options
        .split_once('.')
        .map(|(table, _)| naming::model_name(table));
}

/// Values of an `enum[v1,v2,...]` type tag, or `None` when the tag is not an enum.
fn parse_enum_values(raw_type: &str) -> Option<Vec<String>> {
    let inner = raw_type.strip_prefix("enum[")?.strip_suffix(']')?;
    if inner.is_empty() {
        return Some(Vec::new());
    }
    Some(inner.split(',').map(str::to_string).collect())
}
