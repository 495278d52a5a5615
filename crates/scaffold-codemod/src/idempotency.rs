//! Verifies that applying a codemod twice is the same as applying it once.

use std::collections::BTreeSet;

use crate::codemod::Codemod;
use crate::context::Context;
use crate::schema::CodemodOptions;

#[derive(Debug, thiserror::Error)]
pub enum IdempotencyError {
    #[error("{codemod} failed: {source:#}")]
    Execution {
        codemod: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("{codemod} is not idempotent, a second run changed: {}", .paths.join(", "))]
    NotIdempotent {
        codemod: &'static str,
        paths: Vec<String>,
    },
}

/// Run `codemod` on `ctx`, then again on its output, and compare the content
/// of every path either run touched. Returns the overlay after the first run.
pub fn check_idempotent(
    codemod: &dyn Codemod,
    ctx: Context,
    options: &CodemodOptions,
) -> Result<Context, IdempotencyError> {
    let name = codemod.name();
    let run = |ctx| {
        codemod
            .run(ctx, options)
            .map_err(|source| IdempotencyError::Execution { codemod: name, source })
    };

    let once = run(ctx)?;
    let twice = run(once.clone())?;

    let touched: BTreeSet<&str> = once
        .changes()
        .chain(twice.changes())
        .map(|(path, _)| path)
        .collect();
    let paths: Vec<String> = touched
        .into_iter()
        .filter(|path| once.get_file(path) != twice.get_file(path))
        .map(str::to_string)
        .collect();

    if paths.is_empty() {
        Ok(once)
    } else {
        Err(IdempotencyError::NotIdempotent { codemod: name, paths })
    }
}

/// Panicking form of [`check_idempotent`] for tests.
#[track_caller]
pub fn assert_idempotent(codemod: &dyn Codemod, ctx: Context, options: &CodemodOptions) -> Context {
    match check_idempotent(codemod, ctx, options) {
        Ok(ctx) => ctx,
        Err(e) => panic!("{e}"),
    }
}
