use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::Context;
use scaffold_codemod::Formatter;

/// Formats changed files with the prettier installed in the project, if any.
pub struct PrettierFormatter {
    prettier: Option<PathBuf>,
}

impl PrettierFormatter {
    pub fn for_project(project_root: &Path) -> Self {
        let bin = project_root.join("node_modules/.bin/prettier");
        Self {
            prettier: bin.is_file().then_some(bin),
        }
    }

    pub fn is_available(&self) -> bool {
        self.prettier.is_some()
    }

    /// Pipe `source` through prettier, resolving config and parser from `path`.
    pub fn format_source(&self, path: &Path, source: &str) -> anyhow::Result<Option<String>> {
        let Some(prettier) = &self.prettier else {
            return Ok(None);
        };

        let mut cmd = Command::new(prettier);
        cmd.arg("--stdin-filepath").arg(path);
        if path.file_name().is_some_and(|name| name == ".eslintrc") {
            cmd.args(["--parser", "json"]);
        }

        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to run prettier")?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(source.as_bytes())?;
        }
        let out = child.wait_with_output()?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            anyhow::bail!("prettier failed: {}", stderr.trim());
        }
        Ok(Some(String::from_utf8(out.stdout)?))
    }
}

impl Formatter for PrettierFormatter {
    fn format(&self, path: &Path, content: &str) -> anyhow::Result<Option<String>> {
        self.format_source(path, content)
    }
}
