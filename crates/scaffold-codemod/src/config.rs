//! Persisted project configuration.
//!
//! The scaffold records the tool version a project was last generated or
//! updated with in `.config/.cprc.json`. Users may override feature flags in a
//! `.cprc.json` at the project root. Only the root config is ever written.

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::file_provider::FileProvider;

pub const ROOT_CONFIG_PATH: &str = ".config/.cprc.json";
pub const USER_CONFIG_PATH: &str = ".cprc.json";

const DEFAULT_FEATURES: &[(&str, bool)] = &[
    ("bundleGrafanaUI", false),
    ("useReactRouterV6", true),
    ("usePlaywright", true),
];

#[derive(Debug, Default, Deserialize)]
struct RcFile {
    version: Option<String>,
    #[serde(default)]
    features: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    /// `None` when the project has no readable root config.
    pub version: Option<String>,
    features: BTreeMap<String, bool>,
    root_features: BTreeMap<String, bool>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            version: None,
            features: default_features(),
            root_features: BTreeMap::new(),
        }
    }
}

fn default_features() -> BTreeMap<String, bool> {
    DEFAULT_FEATURES
        .iter()
        .map(|(name, enabled)| (name.to_string(), *enabled))
        .collect()
}

fn read_rc_file(provider: &dyn FileProvider, path: &Path) -> Option<RcFile> {
    let content = provider.read_file(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(rc) => Some(rc),
        Err(e) => {
            debug!("Ignoring unparsable {}: {e}", path.display());
            None
        }
    }
}

impl ProjectConfig {
    /// Load the merged config. Missing or broken files fall back to defaults.
    pub fn load(provider: &dyn FileProvider, root: &Path) -> Self {
        let root_rc = read_rc_file(provider, &root.join(ROOT_CONFIG_PATH)).unwrap_or_default();
        let user_rc = read_rc_file(provider, &root.join(USER_CONFIG_PATH)).unwrap_or_default();

        let mut features = default_features();
        features.extend(root_rc.features.clone());
        features.extend(user_rc.features);

        Self {
            version: root_rc.version,
            features,
            root_features: root_rc.features,
        }
    }

    /// Version string for display, `n/a` when unknown.
    pub fn version_label(&self) -> &str {
        self.version.as_deref().unwrap_or("n/a")
    }

    pub fn feature(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }

    pub fn features(&self) -> &BTreeMap<String, bool> {
        &self.features
    }

    pub fn set_feature(&mut self, name: &str, enabled: bool) {
        self.features.insert(name.to_string(), enabled);
        self.root_features.insert(name.to_string(), enabled);
    }

    /// Write `version` and the root feature flags to `.config/.cprc.json`,
    /// keeping any other keys already present in that file.
    pub fn write_root(&self, provider: &dyn FileProvider, root: &Path) -> Result<(), ConfigError> {
        let path = root.join(ROOT_CONFIG_PATH);

        let mut document = match provider.read_file(&path) {
            Ok(content) if !content.trim().is_empty() => {
                serde_json::from_str::<Map<String, Value>>(&content).map_err(|source| {
                    ConfigError::Parse {
                        path: path.clone(),
                        source,
                    }
                })?
            }
            _ => Map::new(),
        };

        if let Some(version) = &self.version {
            document.insert("version".into(), Value::String(version.clone()));
        }
        if !self.root_features.is_empty() {
            let features = document
                .entry("features")
                .or_insert_with(|| Value::Object(Map::new()));
            if !features.is_object() {
                *features = Value::Object(Map::new());
            }
            if let Value::Object(features) = features {
                for (name, enabled) in &self.root_features {
                    features.insert(name.clone(), Value::Bool(*enabled));
                }
            }
        }

        let mut serialized = serde_json::to_string_pretty(&Value::Object(document)).map_err(|source| {
            ConfigError::Parse {
                path: path.clone(),
                source,
            }
        })?;
        serialized.push('\n');

        provider
            .write_file(&path, &serialized)
            .map_err(|source| ConfigError::Write { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_provider::InMemoryFileProvider;
    use std::path::PathBuf;

    fn project(files: &[(&str, &str)]) -> InMemoryFileProvider {
        InMemoryFileProvider::with_files(
            files
                .iter()
                .map(|(p, c)| (PathBuf::from("/p").join(p), c.to_string())),
        )
    }

    #[test]
    fn missing_config_gives_defaults() {
        let config = ProjectConfig::load(&project(&[]), Path::new("/p"));
        assert_eq!(config.version, None);
        assert_eq!(config.version_label(), "n/a");
        assert!(!config.feature("bundleGrafanaUI"));
        assert!(config.feature("usePlaywright"));
        assert!(!config.feature("somethingElse"));
    }

    #[test]
    fn unparsable_root_config_gives_defaults() {
        let config = ProjectConfig::load(&project(&[(ROOT_CONFIG_PATH, "{ nope")]), Path::new("/p"));
        assert_eq!(config, ProjectConfig::default());
    }

    #[test]
    fn user_features_override_root_features() {
        let provider = project(&[
            (
                ROOT_CONFIG_PATH,
                r#"{ "version": "5.2.0", "features": { "bundleGrafanaUI": true, "usePlaywright": false } }"#,
            ),
            (USER_CONFIG_PATH, r#"{ "features": { "bundleGrafanaUI": false } }"#),
        ]);
        let config = ProjectConfig::load(&provider, Path::new("/p"));

        assert_eq!(config.version.as_deref(), Some("5.2.0"));
        assert!(!config.feature("bundleGrafanaUI"));
        assert!(!config.feature("usePlaywright"));
        assert!(config.feature("useReactRouterV6"));
    }

    #[test]
    fn write_root_keeps_unknown_keys_and_user_overrides_stay_out() {
        let provider = project(&[
            (ROOT_CONFIG_PATH, r#"{ "version": "5.2.0", "bundler": "webpack" }"#),
            (USER_CONFIG_PATH, r#"{ "features": { "usePlaywright": false } }"#),
        ]);
        let mut config = ProjectConfig::load(&provider, Path::new("/p"));
        config.version = Some("6.2.0".into());
        config.set_feature("bundleGrafanaUI", true);
        config.write_root(&provider, Path::new("/p")).unwrap();

        let written = provider.read_file(&Path::new("/p").join(ROOT_CONFIG_PATH)).unwrap();
        insta::assert_snapshot!(written, @r#"
        {
          "version": "6.2.0",
          "bundler": "webpack",
          "features": {
            "bundleGrafanaUI": true
          }
        }
        "#);
    }

    #[test]
    fn write_root_refuses_to_clobber_broken_file() {
        let provider = project(&[(ROOT_CONFIG_PATH, "not json")]);
        let config = ProjectConfig {
            version: Some("6.2.0".into()),
            ..ProjectConfig::default()
        };
        assert!(matches!(
            config.write_root(&provider, Path::new("/p")),
            Err(ConfigError::Parse { .. })
        ));
    }
}
