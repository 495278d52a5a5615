//! The execution pipeline shared by migrations and additions.
//!
//! Every codemod runs through the same steps: load, validate options, execute
//! against a fresh overlay, format, flush, report, install dependencies and
//! optionally commit. Only flush, install and commit have side effects and
//! they happen after the codemod has returned.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::catalog::{AdditionDescriptor, MigrationDescriptor};
use crate::changes::{ChangeSet, ChangeType};
use crate::codemod::ScriptRef;
use crate::config::{ProjectConfig, ROOT_CONFIG_PATH};
use crate::context::Context;
use crate::error::{ExecutionError, RunError};
use crate::file_provider::{DefaultFileProvider, FileProvider};
use crate::package_json::PACKAGE_JSON;
use crate::schema::{CodemodOptions, RawOptions};

/// Rewrites file content before it is flushed, e.g. a code formatter.
pub trait Formatter {
    /// `Ok(None)` leaves the content as is.
    fn format(&self, path: &Path, content: &str) -> anyhow::Result<Option<String>>;
}

/// Installs the project's dependencies after package.json changed.
pub trait Installer {
    fn install(&self, project_root: &Path) -> anyhow::Result<()>;
}

/// Records the current state of the project, e.g. as a version control commit.
pub trait Checkpoint {
    fn checkpoint(&self, project_root: &Path, message: &str) -> anyhow::Result<()>;
}

/// Presents pipeline progress to the user.
pub trait Reporter {
    fn report(&self, title: &str, description: &str, changes: &ChangeSet);

    fn notice(&self, _message: &str) {}
}

pub struct NoopFormatter;

impl Formatter for NoopFormatter {
    fn format(&self, _path: &Path, _content: &str) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}

pub struct NoopInstaller;

impl Installer for NoopInstaller {
    fn install(&self, _project_root: &Path) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn report(&self, _title: &str, _description: &str, _changes: &ChangeSet) {}
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Loaded,
    Validated,
    Executed,
    Formatted,
    Flushed,
    Reported,
    Installed,
    Committed,
}

/// What the pipeline is asked to run.
#[derive(Clone, Copy)]
enum Step<'a> {
    Migration(&'a MigrationDescriptor),
    Addition(&'a AdditionDescriptor),
}

impl Step<'_> {
    fn name(&self) -> &'static str {
        match self {
            Step::Migration(m) => m.key,
            Step::Addition(a) => a.name,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Step::Migration(m) => m.description,
            Step::Addition(a) => a.description,
        }
    }

    fn script(&self) -> ScriptRef {
        match self {
            Step::Migration(m) => m.script,
            Step::Addition(a) => a.script,
        }
    }

    fn commit_message(&self) -> String {
        match self {
            Step::Migration(m) => format!(
                "chore: run create-plugin migration - {}\n\n{}",
                m.key, m.description
            ),
            Step::Addition(a) => format!("chore: add {} support via create-plugin", a.name),
        }
    }
}

/// Result of running one codemod through the pipeline.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub name: String,
    pub changes: ChangeSet,
    pub installed: bool,
    pub committed: bool,
}

pub struct Runner {
    root: PathBuf,
    provider: Arc<dyn FileProvider>,
    formatter: Box<dyn Formatter>,
    installer: Box<dyn Installer>,
    reporter: Box<dyn Reporter>,
    checkpoint: Option<Box<dyn Checkpoint>>,
    /// package.json content of the last install in this process.
    installed_package_json: Option<String>,
}

impl Runner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            provider: Arc::new(DefaultFileProvider::new()),
            formatter: Box::new(NoopFormatter),
            installer: Box::new(NoopInstaller),
            reporter: Box::new(NoopReporter),
            checkpoint: None,
            installed_package_json: None,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn FileProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    pub fn with_installer(mut self, installer: impl Installer + 'static) -> Self {
        self.installer = Box::new(installer);
        self
    }

    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// Commit after every codemod that changed something.
    pub fn commit_each_step(mut self, checkpoint: impl Checkpoint + 'static) -> Self {
        self.checkpoint = Some(Box::new(checkpoint));
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn provider(&self) -> &Arc<dyn FileProvider> {
        &self.provider
    }

    /// Run `migrations` in the given order, then record `to_version` in the
    /// project config. The first failure stops the batch and leaves the
    /// recorded version untouched.
    pub fn run_migrations(
        &mut self,
        migrations: &[&MigrationDescriptor],
        to_version: &str,
        config: &mut ProjectConfig,
        raw_options: &RawOptions,
    ) -> Result<Vec<StepOutcome>, RunError> {
        let listing = if migrations.is_empty() {
            "No migrations to run.".to_string()
        } else {
            migrations
                .iter()
                .map(|m| format!("  - {} ({})", m.key, m.description))
                .collect::<Vec<_>>()
                .join("\n")
        };
        info!("Running {} migrations", migrations.len());
        self.reporter
            .notice(&format!("Running the following migrations:\n{listing}"));

        let mut outcomes = Vec::with_capacity(migrations.len());
        for migration in migrations {
            outcomes.push(self.run_step(Step::Migration(migration), raw_options)?);
        }

        config.version = Some(to_version.to_string());
        config.write_root(&*self.provider, &self.root)?;
        info!("Recorded version {to_version} in {ROOT_CONFIG_PATH}");

        if let Some(checkpoint) = &self.checkpoint {
            let message = format!("chore: update {ROOT_CONFIG_PATH} to version {to_version}.");
            checkpoint
                .checkpoint(&self.root, &message)
                .map_err(|source| RunError::Checkpoint {
                    codemod: ROOT_CONFIG_PATH.to_string(),
                    source,
                })?;
        }

        Ok(outcomes)
    }

    /// Run a single migration without touching the recorded version.
    pub fn run_migration(
        &mut self,
        migration: &MigrationDescriptor,
        raw_options: &RawOptions,
    ) -> Result<StepOutcome, RunError> {
        self.run_step(Step::Migration(migration), raw_options)
    }

    /// Run one addition and switch on its feature flag. The flag lands in the
    /// same checkpoint as the addition's changes.
    pub fn run_addition(
        &mut self,
        addition: &AdditionDescriptor,
        config: &mut ProjectConfig,
        raw_options: &RawOptions,
    ) -> Result<StepOutcome, RunError> {
        let step = Step::Addition(addition);
        let mut outcome = self.apply_step(step, raw_options)?;

        let mut flag_written = false;
        if let Some(flag) = addition.feature_flag {
            if !config.feature(flag) {
                config.set_feature(flag, true);
                config.write_root(&*self.provider, &self.root)?;
                info!("Enabled feature flag {flag}");
                flag_written = true;
            }
        }

        if !outcome.changes.is_empty() || flag_written {
            outcome.committed = self.checkpoint_step(step)?;
        }
        Ok(outcome)
    }

    fn run_step(&mut self, step: Step<'_>, raw_options: &RawOptions) -> Result<StepOutcome, RunError> {
        let mut outcome = self.apply_step(step, raw_options)?;
        if !outcome.changes.is_empty() {
            outcome.committed = self.checkpoint_step(step)?;
        }
        Ok(outcome)
    }

    /// Every stage up to and including install.
    fn apply_step(&mut self, step: Step<'_>, raw_options: &RawOptions) -> Result<StepOutcome, RunError> {
        let name = step.name();
        info!("Running {name}");

        let codemod = (step.script())();
        trace_stage(name, Stage::Loaded);

        let options = match codemod.schema() {
            Some(schema) => schema.validate(name, raw_options)?,
            None => CodemodOptions::from(raw_options.clone()),
        };
        trace_stage(name, Stage::Validated);

        let ctx = Context::with_provider(&self.root, self.provider.clone());
        let mut ctx = codemod
            .run(ctx, &options)
            .map_err(|source| ExecutionError {
                codemod: name.to_string(),
                source,
            })?;
        trace_stage(name, Stage::Executed);

        self.format(&mut ctx);
        trace_stage(name, Stage::Formatted);

        ctx.flush().map_err(|source| RunError::Flush {
            codemod: name.to_string(),
            source,
        })?;
        trace_stage(name, Stage::Flushed);

        let changes = ctx.list_changes();
        self.reporter.report(name, step.description(), &changes);
        trace_stage(name, Stage::Reported);

        let installed = self.install(&ctx, &changes);
        if installed {
            trace_stage(name, Stage::Installed);
        }

        Ok(StepOutcome {
            name: name.to_string(),
            changes,
            installed,
            committed: false,
        })
    }

    /// Commit through the checkpoint, if one is configured.
    fn checkpoint_step(&self, step: Step<'_>) -> Result<bool, RunError> {
        let Some(checkpoint) = &self.checkpoint else {
            return Ok(false);
        };
        let name = step.name();
        checkpoint
            .checkpoint(&self.root, &step.commit_message())
            .map_err(|source| RunError::Checkpoint {
                codemod: name.to_string(),
                source,
            })?;
        trace_stage(name, Stage::Committed);
        Ok(true)
    }

    fn format(&self, ctx: &mut Context) {
        let pending: Vec<(String, String)> = ctx
            .changes()
            .filter(|(_, record)| record.change_type != ChangeType::Delete)
            .filter_map(|(path, record)| Some((path.to_string(), record.content.clone()?)))
            .collect();

        for (path, content) in pending {
            match self.formatter.format(&self.root.join(&path), &content) {
                Ok(Some(formatted)) if formatted != content => {
                    ctx.replace_pending_content(&path, formatted);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Failed to format {path}: {e:#}");
                    self.reporter
                        .notice(&format!("Failed to format {path}: {e:#}"));
                }
            }
        }
    }

    fn install(&mut self, ctx: &Context, changes: &ChangeSet) -> bool {
        if !changes.writes(PACKAGE_JSON) {
            return false;
        }
        let Some(content) = ctx.get_file(PACKAGE_JSON) else {
            return false;
        };
        if self.installed_package_json.as_deref() == Some(content.as_str()) {
            debug!("{PACKAGE_JSON} unchanged since last install");
            return false;
        }
        self.installed_package_json = Some(content);

        self.reporter.notice("Installing NPM dependencies...");
        match self.installer.install(&self.root) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to install dependencies: {e:#}");
                self.reporter
                    .notice(&format!("Failed to install dependencies: {e:#}"));
                false
            }
        }
    }
}

fn trace_stage(name: &str, stage: Stage) {
    debug!("{name}: {stage:?}");
}
