//! Run report: the artifacts a run touched plus its soft failures.

use std::fmt;
use std::path::{Path, PathBuf};

/// What happened to an artifact on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Written,
    Updated,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.kind {
            ArtifactKind::Written => "Generated",
            ArtifactKind::Updated => "Updated",
            ArtifactKind::Removed => "Removed",
        };
        write!(f, "✓ {} {}", verb, self.path.display())
    }
}

/// A non-fatal problem. The run went on without the affected step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

#[derive(Debug, Default)]
pub struct Report {
    pub artifacts: Vec<Artifact>,
    pub warnings: Vec<Warning>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn written(&mut self, path: impl Into<PathBuf>) {
        self.push(ArtifactKind::Written, path.into());
    }

    pub fn updated(&mut self, path: impl Into<PathBuf>) {
        self.push(ArtifactKind::Updated, path.into());
    }

    pub fn removed(&mut self, path: impl Into<PathBuf>) {
        self.push(ArtifactKind::Removed, path.into());
    }

    fn push(&mut self, kind: ArtifactKind, path: PathBuf) {
        tracing::debug!("{:?} {}", kind, path.display());
        self.artifacts.push(Artifact { kind, path });
    }

    /// Record a soft failure; it is logged immediately.
    pub fn warn(&mut self, path: &Path, message: impl Into<String>) {
        let warning = Warning {
            path: path.to_path_buf(),
            message: message.into(),
        };
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Whether an artifact at `path` was recorded with the given kind.
    pub fn contains(&self, kind: ArtifactKind, path: &Path) -> bool {
        self.artifacts
            .iter()
            .any(|artifact| artifact.kind == kind && artifact.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_records_in_order() {
        let mut report = Report::new();
        report.written("migrations/1_create_post.sql");
        report.updated("models/author.go");
        report.warn(Path::new("models/user.go"), "skipped");

        assert_eq!(report.artifacts.len(), 2);
        assert_eq!(report.artifacts[0].to_string(), "✓ Generated migrations/1_create_post.sql");
        assert!(report.contains(ArtifactKind::Updated, Path::new("models/author.go")));
        assert!(!report.contains(ArtifactKind::Removed, Path::new("models/author.go")));
        assert_eq!(report.warnings[0].to_string(), "models/user.go: skipped");
    }
}
