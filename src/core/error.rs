//! Error taxonomy for the console and its collaborators

use std::path::PathBuf;
use thiserror::Error;

/// A module definition that could not be turned into a registered module.
///
/// Discovery never aborts on these; they are collected and logged.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Modules directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("Cannot read modules directory {}: {source}", .path.display())]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error loading {}: {source}", .path.display())]
    ReadDefinition {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error loading {}: {source}", .path.display())]
    InvalidDefinition {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Error loading {}: no built-in module named '{entry}'", .path.display())]
    UnknownEntry { path: PathBuf, entry: String },
}

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("No workspace active (set TARGET first)")]
    NoWorkspace,

    #[error("Workspace I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Workspace JSON error on {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl WorkspaceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

/// Everything a console command can report back to the user.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unknown show option: {0}")]
    UnknownShowTarget(String),

    #[error("Invalid module number: {0}")]
    InvalidModuleNumber(i64),

    #[error("Invalid module: {0}")]
    InvalidModule(String),

    #[error("No module selected")]
    NoModuleSelected,

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("The following options are required: {}", .missing.join(", "))]
    Validation { missing: Vec<String> },

    #[error("Execution failed: {source:#}")]
    Execution {
        module: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_lists_every_missing_name() {
        let err = ConsoleError::Validation {
            missing: vec!["TARGET".to_string(), "X".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "The following options are required: TARGET, X"
        );
    }

    #[test]
    fn test_execution_error_includes_cause_chain() {
        let source = anyhow::anyhow!("connection refused").context("fetching moduleinfo");
        let err = ConsoleError::Execution {
            module: "osscan".to_string(),
            source,
        };
        let text = err.to_string();
        assert!(text.contains("fetching moduleinfo"));
        assert!(text.contains("connection refused"));
    }
}
