use once_cell::sync::Lazy;
use regex::Regex;
use scaffold_codemod::package_json::{coerce_version, read_json_file, write_json_file};
use scaffold_codemod::{Codemod, CodemodOptions, Context};
use semver::Version;
use serde_json::{Map, Value};

const EXTERNALS_PATH: &str = ".config/bundler/externals.ts";
const LEGACY_WEBPACK_CONFIG: &str = ".config/webpack/webpack.config.ts";
const PLUGIN_JSON: &str = "src/plugin.json";
const INLINE_SVG: &str = "'react-inlinesvg',";
const MIN_GRAFANA_VERSION: Version = Version::new(10, 2, 0);

static GRAFANA_UI_EXTERNAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*/\^@grafana\\/ui/i,?\s*$").expect("valid regex"));
static GRAFANA_DATA_EXTERNAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*/\^@grafana\\/data/i,?\s*$").expect("valid regex"));
static EXTERNALS_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bexternals\b.*\[\s*$").expect("valid regex"));

pub struct BundleGrafanaUi;

impl Codemod for BundleGrafanaUi {
    fn name(&self) -> &'static str {
        "bundle-grafana-ui"
    }

    fn run(&self, mut ctx: Context, _options: &CodemodOptions) -> anyhow::Result<Context> {
        let target = if ctx.does_file_exist(EXTERNALS_PATH) {
            Some(EXTERNALS_PATH)
        } else if ctx.does_file_exist(LEGACY_WEBPACK_CONFIG) {
            Some(LEGACY_WEBPACK_CONFIG)
        } else {
            log::debug!("No externals configuration found, skipping bundler changes");
            None
        };

        if let Some(path) = target {
            let source = ctx.get_file(path).unwrap_or_default();
            if let Some(updated) = bundle_grafana_ui(&source) {
                ctx.update_file(path, updated)?;
            }
        }

        ensure_min_grafana_version(&mut ctx)?;
        Ok(ctx)
    }
}

/// Drop `@grafana/ui` from an externals array literal and make sure
/// `react-inlinesvg` stays external. Returns `None` when nothing changes.
///
/// Works line by line: the array must list one element per line, the way
/// scaffolded configs do.
fn bundle_grafana_ui(source: &str) -> Option<String> {
    let mut lines: Vec<String> = source.split('\n').map(str::to_string).collect();

    let before = lines.len();
    lines.retain(|line| !GRAFANA_UI_EXTERNAL.is_match(line));
    let mut changed = lines.len() != before;

    let has_inline_svg = source.contains("'react-inlinesvg'") || source.contains("\"react-inlinesvg\"");
    if !has_inline_svg {
        if let Some(at) = inline_svg_position(&lines) {
            let indent = element_indent(&lines, at);
            ensure_trailing_comma(&mut lines[at - 1]);
            lines.insert(at, format!("{indent}{INLINE_SVG}"));
            changed = true;
        }
    }

    changed.then(|| lines.join("\n"))
}

/// Right after the `@grafana/data` element, else just before the array's
/// closing bracket.
fn inline_svg_position(lines: &[String]) -> Option<usize> {
    if let Some(i) = lines.iter().position(|l| GRAFANA_DATA_EXTERNAL.is_match(l)) {
        return Some(i + 1);
    }
    let start = lines.iter().position(|l| EXTERNALS_START.is_match(l))?;
    lines[start + 1..]
        .iter()
        .position(|l| l.trim_start().starts_with(']'))
        .map(|offset| start + 1 + offset)
}

fn element_indent(lines: &[String], at: usize) -> String {
    let previous = &lines[at - 1];
    if EXTERNALS_START.is_match(previous) {
        let closing = lines.get(at).map(String::as_str).unwrap_or_default();
        let base = &closing[..closing.len() - closing.trim_start().len()];
        return format!("{base}  ");
    }
    previous[..previous.len() - previous.trim_start().len()].to_string()
}

fn ensure_trailing_comma(line: &mut String) {
    let trimmed = line.trim_end();
    if trimmed.is_empty() || trimmed.ends_with(',') || trimmed.ends_with('[') {
        return;
    }
    let end = trimmed.len();
    line.insert(end, ',');
}

/// Bundled `@grafana/ui` needs the runtime shipped with Grafana 10.2.0.
fn ensure_min_grafana_version(ctx: &mut Context) -> anyhow::Result<()> {
    if !ctx.does_file_exist(PLUGIN_JSON) {
        return Ok(());
    }

    let mut plugin_json: Value = read_json_file(ctx, PLUGIN_JSON)?;
    let Some(plugin) = plugin_json.as_object_mut() else {
        return Ok(());
    };

    let dependencies = plugin
        .entry("dependencies")
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(dependencies) = dependencies.as_object_mut() else {
        return Ok(());
    };

    let current = dependencies
        .get("grafanaDependency")
        .and_then(Value::as_str)
        .unwrap_or(">=9.0.0");
    let below_minimum = coerce_version(current.trim_start_matches(['>', '<', '=']))
        .is_none_or(|version| version < MIN_GRAFANA_VERSION);

    if below_minimum {
        dependencies.insert(
            "grafanaDependency".into(),
            Value::String(format!(">={MIN_GRAFANA_VERSION}")),
        );
        write_json_file(ctx, PLUGIN_JSON, &plugin_json)?;
    }
    Ok(())
}
