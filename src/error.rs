//! Fatal error taxonomy.
//!
//! Anything that aborts a run is a [`CodegenError`]. Soft failures (a related
//! file that does not exist yet, a repository that cannot be patched) are not
//! errors; they are recorded on the [`Report`](crate::codegen::Report).

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::codegen::go_source::GoSourceError;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("usage: {0}")]
    Usage(String),

    #[error("unknown action '{0}' (expected create, add_fields, remove_fields or drop)")]
    UnknownAction(String),

    #[error("{kind} not found: {}", path.display())]
    MissingArtifact { kind: &'static str, path: PathBuf },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: GoSourceError,
    },

    #[error("type {name} not found in {}", path.display())]
    TypeNotFound { name: String, path: PathBuf },

    #[error("type {name} in {} is not a struct", path.display())]
    NotAStruct { name: String, path: PathBuf },

    #[error("template '{template}': {message}")]
    Render { template: String, message: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CodegenError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CodegenError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn render(template: &str, message: impl Into<String>) -> Self {
        CodegenError::Render {
            template: template.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CodegenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_artifact() {
        let err = CodegenError::MissingArtifact {
            kind: "model",
            path: PathBuf::from("models/post.go"),
        };
        assert_eq!(err.to_string(), "model not found: models/post.go");

        let err = CodegenError::render("migration/drop", "template not registered");
        assert!(err.to_string().contains("migration/drop"));

        let err = CodegenError::io(
            "migrations/x.sql",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("migrations/x.sql"));
    }
}
