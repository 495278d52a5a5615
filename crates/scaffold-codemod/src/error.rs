use std::fmt;
use std::path::PathBuf;

use crate::file_provider::FileProviderError;

/// Overlay invariant violations. Always a defect in the calling codemod.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathStateError {
    #[error("File {0} already exists")]
    AlreadyExists(String),

    #[error("File {0} does not exist")]
    NotFound(String),

    #[error("File {0} was already deleted")]
    AlreadyDeleted(String),
}

/// What is wrong with a single option field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldProblem {
    Missing,
    InvalidType { expected: &'static str },
    TooShort { min: usize },
    TooLong { max: usize },
    BelowMinimum { min: f64 },
    AboveMaximum { max: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub problem: FieldProblem,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = &self.field;
        match &self.problem {
            FieldProblem::Missing => write!(f, "{field}: required option is missing"),
            FieldProblem::InvalidType { expected } => write!(f, "{field}: expected {expected}"),
            FieldProblem::TooShort { min } => {
                write!(f, "{field}: must be at least {min} characters")
            }
            FieldProblem::TooLong { max } => write!(f, "{field}: must be at most {max} characters"),
            FieldProblem::BelowMinimum { min } => write!(f, "{field}: must be at least {min}"),
            FieldProblem::AboveMaximum { max } => write!(f, "{field}: must be at most {max}"),
        }
    }
}

/// Options failed schema validation. Carries every failing field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid options for {codemod}:\n{}", bullet_list(.failures))]
pub struct ValidationError {
    pub codemod: String,
    pub failures: Vec<FieldError>,
}

fn bullet_list(failures: &[FieldError]) -> String {
    failures
        .iter()
        .map(|f| format!("  - {f}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Unknown migration: {key}\n\nAvailable migrations: {}", .available.join(", "))]
    UnknownMigration { key: String, available: Vec<String> },

    #[error("Unknown addition: {name}\n\nAvailable additions: {}", .available.join(", "))]
    UnknownAddition { name: String, available: Vec<String> },

    #[error("Invalid version '{version}'")]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },
}

/// An error raised inside a codemod, tagged with the codemod that raised it.
#[derive(Debug, thiserror::Error)]
#[error("Error running {codemod}: {source}")]
pub struct ExecutionError {
    pub codemod: String,
    #[source]
    pub source: anyhow::Error,
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to write {path}: {source}")]
pub struct FlushError {
    pub path: String,
    #[source]
    pub source: FileProviderError,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: FileProviderError,
    },
}

/// Fatal failures of the execution pipeline.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("{codemod}: {source}")]
    Flush {
        codemod: String,
        #[source]
        source: FlushError,
    },

    #[error("Failed to create a checkpoint after {codemod}: {source}")]
    Checkpoint {
        codemod: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
