//! Build error taxonomy
//!
//! Every build phase returns `Result<_, BuildError>`; the pipeline stops at
//! the first failure and never hands out a partial route table.

use std::fmt;
use std::path::PathBuf;

use axum::http::Method;
use thiserror::Error;

/// Phase of a build a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Walk,
    Classify,
    Static,
    Codegen,
    WriteEntry,
    Bundle,
    Render,
    Cleanup,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildPhase::Walk => "walk",
            BuildPhase::Classify => "classify",
            BuildPhase::Static => "static",
            BuildPhase::Codegen => "codegen",
            BuildPhase::WriteEntry => "write-entry",
            BuildPhase::Bundle => "bundle",
            BuildPhase::Render => "render",
            BuildPhase::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Two or more sources claiming the same method and pathname
///
/// Only ever produced as an error artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictRecord {
    pub path: String,
    pub method: Method,
    pub sources: Vec<PathBuf>,
}

impl fmt::Display for ConflictRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources = self
            .sources
            .iter()
            .map(|s| s.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "route conflict on {} {}: {}", self.method, self.path, sources)
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Import or classification failure of a single route file
    #[error("failed to build routes from {path}: {source}")]
    RouteBuild {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("{0}")]
    RouteConflict(ConflictRecord),

    #[error("[{phase}] failed to generate client entry module: {message}")]
    Codegen { phase: BuildPhase, message: String },

    #[error("[{phase}] filesystem error at {path}: {source}")]
    Fs {
        phase: BuildPhase,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[{phase}] bundler failed: {source}")]
    Bundler {
        phase: BuildPhase,
        #[source]
        source: anyhow::Error,
    },

    #[error("[{phase}] failed to render HTML shell: {source}")]
    Render {
        phase: BuildPhase,
        #[source]
        source: anyhow::Error,
    },
}

impl BuildError {
    /// Phase the failure is attributed to
    pub fn phase(&self) -> BuildPhase {
        match self {
            BuildError::Config(_) | BuildError::Walk { .. } => BuildPhase::Walk,
            BuildError::RouteBuild { .. } | BuildError::RouteConflict(_) => BuildPhase::Classify,
            BuildError::Codegen { phase, .. }
            | BuildError::Fs { phase, .. }
            | BuildError::Bundler { phase, .. }
            | BuildError::Render { phase, .. } => *phase,
        }
    }

    /// The conflict behind this error, if it is one
    pub fn conflict(&self) -> Option<&ConflictRecord> {
        match self {
            BuildError::RouteConflict(record) => Some(record),
            _ => None,
        }
    }

    pub(crate) fn fs(phase: BuildPhase, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Fs {
            phase,
            path: path.into(),
            source,
        }
    }
}

impl From<ConflictRecord> for BuildError {
    fn from(record: ConflictRecord) -> Self {
        BuildError::RouteConflict(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_display_names_every_source() {
        let record = ConflictRecord {
            path: "/users".to_string(),
            method: Method::GET,
            sources: vec!["users.ts".into(), "users.tsx".into()],
        };
        assert_eq!(
            record.to_string(),
            "route conflict on GET /users: users.ts, users.tsx"
        );

        let err = BuildError::from(record.clone());
        assert_eq!(err.conflict(), Some(&record));
        assert_eq!(err.phase(), BuildPhase::Classify);
    }

    #[test]
    fn test_phase_is_tagged_in_message() {
        let err = BuildError::Bundler {
            phase: BuildPhase::Bundle,
            source: anyhow::anyhow!("exit status 1"),
        };
        assert_eq!(err.to_string(), "[bundle] bundler failed: exit status 1");
        assert_eq!(err.phase(), BuildPhase::Bundle);
    }
}
