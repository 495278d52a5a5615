use crate::context::Context;
use crate::schema::{CodemodOptions, Flag, OptionsSchema};

/// A single file transformation: a migration step or a user-invoked addition.
///
/// `run` receives an overlay by value and hands back the overlay that should
/// be flushed. Implementations must never touch the project directory
/// directly, and running twice must be equivalent to running once.
pub trait Codemod {
    fn name(&self) -> &'static str;

    fn schema(&self) -> Option<OptionsSchema> {
        None
    }

    fn flags(&self) -> Vec<Flag> {
        self.schema().map(|s| s.flags()).unwrap_or_default()
    }

    fn run(&self, ctx: Context, options: &CodemodOptions) -> anyhow::Result<Context>;
}

/// Loads a codemod. Catalog entries point at one of these.
pub type ScriptRef = fn() -> Box<dyn Codemod>;
