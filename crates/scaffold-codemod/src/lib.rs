//! Engine for upgrading generated plugin projects.
//!
//! Codemods describe file transformations against a [`Context`], an in-memory
//! overlay of the project directory. The [`Runner`] selects them from static
//! catalogs, executes them and applies their changes.

pub mod catalog;
pub mod changes;
pub mod codemod;
pub mod config;
pub mod context;
pub mod error;
pub mod file_provider;
pub mod idempotency;
pub mod package_json;
pub mod runner;
pub mod schema;

pub use catalog::{AdditionDescriptor, MigrationDescriptor, find_addition, find_migration, select_range};
pub use changes::{ChangeSet, ChangeType, FileRecord};
pub use codemod::{Codemod, ScriptRef};
pub use config::ProjectConfig;
pub use context::Context;
pub use error::{CatalogError, ExecutionError, PathStateError, RunError, ValidationError};
pub use file_provider::{DefaultFileProvider, FileProvider, FileProviderError, InMemoryFileProvider};
pub use idempotency::{IdempotencyError, assert_idempotent, check_idempotent};
pub use runner::{Checkpoint, Formatter, Installer, Reporter, Runner, StepOutcome};
pub use schema::{CodemodOptions, FieldSpec, Flag, OptionsSchema, RawOptions};
