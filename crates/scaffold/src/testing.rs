use std::path::Path;
use std::sync::Arc;

use scaffold_codemod::{Context, InMemoryFileProvider};

/// Overlay over an in-memory project rooted at `/virtual`.
pub fn virtual_project(files: &[(&str, &str)]) -> Context {
    let provider = InMemoryFileProvider::with_files(
        files
            .iter()
            .map(|(path, content)| (Path::new("/virtual").join(path), content.to_string())),
    );
    Context::with_provider("/virtual", Arc::new(provider))
}
