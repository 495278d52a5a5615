use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::Context;
use log::debug;
use scaffold_codemod::Installer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManagerKind {
    Npm,
    Yarn,
    Pnpm,
}

impl PackageManagerKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "npm" => Some(Self::Npm),
            "yarn" => Some(Self::Yarn),
            "pnpm" => Some(Self::Pnpm),
            _ => None,
        }
    }

    fn program(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Yarn => "yarn",
            Self::Pnpm => "pnpm",
        }
    }
}

const LOCKFILES: &[(&str, PackageManagerKind)] = &[
    ("yarn.lock", PackageManagerKind::Yarn),
    ("pnpm-lock.yaml", PackageManagerKind::Pnpm),
    ("package-lock.json", PackageManagerKind::Npm),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManager {
    pub kind: PackageManagerKind,
    pub version: Option<String>,
}

impl Default for PackageManager {
    fn default() -> Self {
        Self {
            kind: PackageManagerKind::Yarn,
            version: Some("1.22.22".into()),
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{version}", self.kind.program()),
            None => f.write_str(self.kind.program()),
        }
    }
}

impl PackageManager {
    /// The `packageManager` field of package.json wins, then the closest
    /// lockfile, then the default.
    pub fn detect(project_root: &Path) -> Self {
        Self::from_package_json(project_root)
            .or_else(|| Self::from_lockfile(project_root))
            .unwrap_or_default()
    }

    fn from_package_json(project_root: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(project_root.join("package.json")).ok()?;
        let package_json: serde_json::Value = serde_json::from_str(&content).ok()?;
        let field = package_json.get("packageManager")?.as_str()?;
        let (name, version) = match field.split_once('@') {
            Some((name, version)) => (name, Some(version.to_string())),
            None => (field, None),
        };
        Some(Self {
            kind: PackageManagerKind::from_name(name)?,
            version,
        })
    }

    fn from_lockfile(project_root: &Path) -> Option<Self> {
        project_root.ancestors().find_map(|dir| {
            LOCKFILES
                .iter()
                .find(|(file, _)| dir.join(file).is_file())
                .map(|(_, kind)| Self {
                    kind: *kind,
                    version: None,
                })
        })
    }

    fn is_yarn_berry(&self) -> bool {
        self.kind == PackageManagerKind::Yarn
            && self
                .version
                .as_deref()
                .and_then(|v| v.split('.').next()?.parse::<u64>().ok())
                .is_some_and(|major| major >= 2)
    }

    /// Arguments for a quiet install.
    pub fn silent_install_args(&self) -> Vec<&'static str> {
        match self.kind {
            PackageManagerKind::Yarn if self.is_yarn_berry() => vec!["install"],
            _ => vec!["install", "--silent"],
        }
    }
}

/// Runs the project's package manager after package.json changed.
pub struct PackageManagerInstaller;

impl Installer for PackageManagerInstaller {
    fn install(&self, project_root: &Path) -> anyhow::Result<()> {
        let manager = PackageManager::detect(project_root);
        let args = manager.silent_install_args();
        debug!("Installing with {manager}: {}", args.join(" "));

        let status = Command::new(manager.kind.program())
            .args(&args)
            .current_dir(project_root)
            .stdin(Stdio::null())
            .status()
            .with_context(|| format!("Failed to run {}", manager.kind.program()))?;

        if !status.success() {
            anyhow::bail!("{} {} exited with {status}", manager.kind.program(), args.join(" "));
        }
        Ok(())
    }
}
