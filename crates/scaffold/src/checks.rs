use std::path::Path;

use anyhow::bail;

use crate::git;

/// Refuse to touch a project that is not safely revertible or is not a
/// plugin. `force` skips every check.
pub fn pre_codemod_checks(project_root: &Path, force: bool) -> anyhow::Result<()> {
    if force {
        return Ok(());
    }

    if !git::is_git_directory(project_root) {
        bail!(
            "You are not inside a git directory. Run `git init` in the root of your project and \
             commit your changes, or use --force to proceed as is."
        );
    }

    if !git::is_clean(project_root)? {
        bail!(
            "Please clean your repository working tree before making changes. Commit your \
             changes or stash them, or use --force to proceed as is."
        );
    }

    if !project_root.join("src/plugin.json").is_file() {
        bail!(
            "Are you inside a plugin directory? We couldn't find a src/plugin.json file under \
             {}. Use --force to proceed as is.",
            project_root.display()
        );
    }

    Ok(())
}
