//! Type definitions shared by every planner.
//!
//! A [`Field`] is built once per invocation from a raw `name:type:option`
//! token and is read-only afterwards. The [`Action`] picks which branch of
//! each engine runs.

use std::fmt;

/// Primitive tag of a declared field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Primitive {
    Int,
    String,
    Bool,
    Time,
    Float,
    Jsonb,
    /// No type was given in the token.
    Untyped,
    /// Anything we do not recognise; mapped to the documented fallbacks.
    Other(String),
}

impl Primitive {
    /// Map a primitive tag to its variant. Never fails.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "int" => Primitive::Int,
            "string" => Primitive::String,
            "bool" => Primitive::Bool,
            "time" => Primitive::Time,
            "float" => Primitive::Float,
            "jsonb" => Primitive::Jsonb,
            "" => Primitive::Untyped,
            other => Primitive::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Primitive::Int => "int",
            Primitive::String => "string",
            Primitive::Bool => "bool",
            Primitive::Time => "time",
            Primitive::Float => "float",
            Primitive::Jsonb => "jsonb",
            Primitive::Untyped => "",
            Primitive::Other(tag) => tag,
        }
    }
}

/// Declared type of a field: a primitive, optionally array-suffixed (`int[]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    pub primitive: Primitive,
    pub is_array: bool,
}

impl FieldType {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_suffix("[]") {
            Some(base) => FieldType {
                primitive: Primitive::parse(base),
                is_array: true,
            },
            None => FieldType {
                primitive: Primitive::parse(raw),
                is_array: false,
            },
        }
    }

    pub fn scalar(primitive: Primitive) -> Self {
        FieldType {
            primitive,
            is_array: false,
        }
    }

    pub fn is_time(&self) -> bool {
        self.primitive == Primitive::Time
    }
}

impl Default for FieldType {
    fn default() -> Self {
        FieldType::scalar(Primitive::Untyped)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array {
            write!(f, "{}[]", self.primitive.as_str())
        } else {
            write!(f, "{}", self.primitive.as_str())
        }
    }
}

/// One declared column/attribute, as parsed from the field DSL.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Field {
    /// Canonical snake_case name (`author_id`)
    pub name: String,
    pub field_type: FieldType,
    pub is_nullable: bool,
    pub default_value: Option<String>,
    pub is_index: bool,
    pub is_unique: bool,
    pub is_enum: bool,
    /// Enum values in declaration order (may be empty)
    pub enum_values: Vec<String>,
    pub is_reference: bool,
    /// On-delete policy token (`cascade`, `nullify`, ...) or a
    /// `table.column` override
    pub ref_options: Option<String>,
    /// Explicit referenced model, overriding the `_id` stripping rule
    pub referenced_model: Option<String>,
}

impl Field {
    /// Field with the given name and type and every option unset.
    pub fn new(name: &str, field_type: &str) -> Self {
        Field {
            name: name.to_string(),
            field_type: FieldType::parse(field_type),
            ..Default::default()
        }
    }

    /// Exact lowercase name match, used to detect implicit columns.
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name
    }

    /// `table.column` override carried in the ref options, if any.
    pub fn reference_override(&self) -> Option<(&str, &str)> {
        self.ref_options
            .as_deref()
            .and_then(|options| options.split_once('.'))
    }
}

/// Action requested for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    AddFields,
    RemoveFields,
    Drop,
    Unknown,
}

impl Action {
    /// Parse an action name; anything unrecognised becomes [`Action::Unknown`].
    pub fn parse(action: &str) -> Self {
        match action {
            "create" => Action::Create,
            "add_fields" => Action::AddFields,
            "remove_fields" => Action::RemoveFields,
            "drop" => Action::Drop,
            _ => Action::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::AddFields => "add_fields",
            Action::RemoveFields => "remove_fields",
            Action::Drop => "drop",
            Action::Unknown => "unknown",
        }
    }

    /// Whether the action is meaningless without at least one field token.
    pub fn requires_fields(&self) -> bool {
        matches!(self, Action::AddFields | Action::RemoveFields)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
