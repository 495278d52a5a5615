use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use scaffold_codemod::catalog::parse_version;
use scaffold_codemod::{ProjectConfig, RawOptions, Runner, find_migration, select_range};

use crate::checks::pre_codemod_checks;
use crate::fmt::PrettierFormatter;
use crate::git::GitCheckpoint;
use crate::install::PackageManagerInstaller;
use crate::migrations::MIGRATIONS;
use crate::report::TerminalReporter;

/// Version a project without a recorded version is assumed to be at.
const UNVERSIONED: &str = "0.0.0";

#[derive(Args, Debug, Default, Clone)]
#[command(about = "Update the project to the current scaffold version")]
pub struct UpdateArgs {
    /// Skip the git and plugin directory checks
    #[arg(long)]
    pub force: bool,

    /// Commit the changes of every migration separately
    #[arg(long)]
    pub commit: bool,

    /// Project root (defaults to the current directory)
    #[arg(long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub path: Option<PathBuf>,

    /// Run only this migration, whatever the recorded version
    #[arg(long, value_name = "KEY")]
    pub only: Option<String>,
}

pub fn execute(args: UpdateArgs) -> Result<()> {
    let root = project_root(args.path)?;
    pre_codemod_checks(&root, args.force)?;

    let mut runner = runner_for(&root, args.commit);

    if let Some(key) = args.only {
        let migration = find_migration(MIGRATIONS, &key)?;
        runner.run_migration(migration, &RawOptions::new())?;
        eprintln!("{} Ran migration {key}", "✓".green());
        return Ok(());
    }

    let tool_version = env!("CARGO_PKG_VERSION");
    let mut config = ProjectConfig::load(&**runner.provider(), &root);
    let from = config.version.clone().unwrap_or_else(|| UNVERSIONED.to_string());

    if parse_version(&from)? >= parse_version(tool_version)? {
        println!("Nothing to update, the project is already at {from}.");
        return Ok(());
    }

    log::debug!("Updating {} from {from} to {tool_version}", root.display());
    let migrations = select_range(MIGRATIONS, &from, tool_version)?;
    runner.run_migrations(&migrations, tool_version, &mut config, &RawOptions::new())?;

    eprintln!("{} Updated project to version {tool_version}", "✓".green());
    Ok(())
}

pub fn project_root(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => Ok(std::env::current_dir()?),
    }
}

/// Runner wired to the real formatter, installer and terminal output.
pub fn runner_for(root: &Path, commit: bool) -> Runner {
    let formatter = PrettierFormatter::for_project(root);
    if !formatter.is_available() {
        log::debug!("prettier not installed, skipping formatting");
    }
    let runner = Runner::new(root)
        .with_formatter(formatter)
        .with_installer(PackageManagerInstaller)
        .with_reporter(TerminalReporter);
    if commit {
        runner.commit_each_step(GitCheckpoint)
    } else {
        runner
    }
}
