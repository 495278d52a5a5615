//! Helpers for codemods that edit JSON files and package.json dependencies
//! through the overlay.

use anyhow::{Context as _, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::context::Context;

pub const PACKAGE_JSON: &str = "package.json";

/// Read and parse a JSON file from the overlay.
pub fn read_json_file<T: DeserializeOwned>(ctx: &Context, path: &str) -> anyhow::Result<T> {
    let content = ctx
        .get_file(path)
        .ok_or_else(|| anyhow!("Cannot find {path}"))?;
    serde_json::from_str(&content).with_context(|| format!("Cannot parse {path}"))
}

/// Pretty print `value` into `path` with two-space indentation. A trailing
/// newline is kept when the current file has one.
pub fn write_json_file(ctx: &mut Context, path: &str, value: &Value) -> anyhow::Result<()> {
    let mut serialized = serde_json::to_string_pretty(value)?;
    match ctx.get_file(path) {
        Some(current) => {
            if current.ends_with('\n') {
                serialized.push('\n');
            }
            ctx.update_file(path, serialized)?;
        }
        None => {
            serialized.push('\n');
            ctx.add_file(path, serialized)?;
        }
    }
    Ok(())
}

/// Declared version range of `name` in dependencies or devDependencies.
pub fn dependency_version<'a>(package_json: &'a Value, name: &str) -> Option<&'a str> {
    ["dependencies", "devDependencies"]
        .iter()
        .find_map(|section| package_json.get(section)?.get(name)?.as_str())
        .filter(|v| !v.is_empty())
}

fn section(package_json: &Value, key: &str) -> Map<String, Value> {
    package_json
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

fn declared<'a>(deps: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    deps.get(name).and_then(Value::as_str).filter(|v| !v.is_empty())
}

fn sorted(deps: Map<String, Value>) -> Map<String, Value> {
    let mut entries: Vec<_> = deps.into_iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries.into_iter().collect()
}

/// Add or bump dependencies in package.json.
///
/// A package already declared in either section stays in that section and is
/// only bumped when the incoming version is greater. New packages go to the
/// section they were requested for. Nothing is written when no version moves.
pub fn add_dependencies(
    ctx: &mut Context,
    dependencies: &[(&str, &str)],
    dev_dependencies: &[(&str, &str)],
) -> anyhow::Result<()> {
    let mut package_json: Value = read_json_file(ctx, PACKAGE_JSON)?;
    let original_deps = section(&package_json, "dependencies");
    let original_dev_deps = section(&package_json, "devDependencies");
    let mut deps = original_deps.clone();
    let mut dev_deps = original_dev_deps.clone();

    let requests = dependencies
        .iter()
        .map(|req| (req, false))
        .chain(dev_dependencies.iter().map(|req| (req, true)));

    for ((name, incoming), wants_dev) in requests {
        let target = if declared(&deps, name).is_some() {
            &mut deps
        } else if declared(&dev_deps, name).is_some() {
            &mut dev_deps
        } else if wants_dev {
            dev_deps.insert(name.to_string(), Value::String(incoming.to_string()));
            continue;
        } else {
            deps.insert(name.to_string(), Value::String(incoming.to_string()));
            continue;
        };

        let existing = declared(target, name).unwrap_or_default();
        if is_version_greater(incoming, existing, false) {
            target.insert(name.to_string(), Value::String(incoming.to_string()));
        }
    }

    if deps == original_deps && dev_deps == original_dev_deps {
        return Ok(());
    }

    let Some(object) = package_json.as_object_mut() else {
        return Err(anyhow!("{PACKAGE_JSON} is not a JSON object"));
    };
    if !deps.is_empty() {
        object.insert("dependencies".into(), Value::Object(sorted(deps)));
    }
    if !dev_deps.is_empty() {
        object.insert("devDependencies".into(), Value::Object(sorted(dev_deps)));
    }

    write_json_file(ctx, PACKAGE_JSON, &package_json)
}

/// Remove packages from package.json. Nothing is written when none of them
/// are declared.
pub fn remove_dependencies(
    ctx: &mut Context,
    dependencies: &[&str],
    dev_dependencies: &[&str],
) -> anyhow::Result<()> {
    let mut package_json: Value = read_json_file(ctx, PACKAGE_JSON)?;
    let mut changed = false;

    for (key, names) in [("dependencies", dependencies), ("devDependencies", dev_dependencies)] {
        let Some(deps) = package_json.get_mut(key).and_then(Value::as_object_mut) else {
            continue;
        };
        for name in names {
            if declared(deps, name).is_some() {
                deps.shift_remove(*name);
                changed = true;
            }
        }
    }

    if !changed {
        return Ok(());
    }
    write_json_file(ctx, PACKAGE_JSON, &package_json)
}

fn dist_tag_rank(version: &str) -> Option<u8> {
    match version {
        "*" => Some(2),
        "next" => Some(1),
        "latest" => Some(0),
        _ => None,
    }
}

static VERSION_CORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?").expect("valid regex"));

/// Best-effort conversion of a version or range (`^18.0.0`, `~5.2`, `v1`)
/// into a concrete version.
pub fn coerce_version(version: &str) -> Option<Version> {
    let cleaned = version.trim().trim_start_matches(['=', 'v']);
    if let Ok(parsed) = Version::parse(cleaned) {
        return Some(parsed);
    }

    let captures = VERSION_CORE.captures(version)?;
    let part = |i: usize| -> Option<u64> {
        captures
            .get(i)
            .map_or(Some(0), |m| m.as_str().parse().ok())
    };
    Some(Version::new(part(1)?, part(2)?, part(3)?))
}

/// Whether `incoming` should replace `existing` in a dependency declaration.
///
/// Two dist-tags compare as `latest < next < *`. A dist-tag on only one side
/// always counts as greater since the version it points to is unknown. So
/// does anything that cannot be read as a version.
pub fn is_version_greater(incoming: &str, existing: &str, or_equal_to: bool) -> bool {
    match (dist_tag_rank(incoming), dist_tag_rank(existing)) {
        (Some(a), Some(b)) => return a > b,
        (Some(_), None) | (None, Some(_)) => return true,
        (None, None) => {}
    }

    let (Some(incoming), Some(existing)) = (coerce_version(incoming), coerce_version(existing))
    else {
        return true;
    };

    if or_equal_to {
        incoming >= existing
    } else {
        incoming > existing
    }
}
