use anyhow::Context as _;
use scaffold_codemod::package_json::{PACKAGE_JSON, add_dependencies, remove_dependencies};
use scaffold_codemod::{Codemod, CodemodOptions, Context};
use serde_json::Value;

const ESLINTRC: &str = ".config/.eslintrc";
const TS_SOURCES: &str = "src/**/*.{ts,tsx}";
const DEPRECATION_RULE: &str = "deprecation/deprecation";

pub struct UpdateEslintDeprecationRule;

impl Codemod for UpdateEslintDeprecationRule {
    fn name(&self) -> &'static str {
        "003-update-eslint-deprecation-rule"
    }

    fn run(&self, mut ctx: Context, _options: &CodemodOptions) -> anyhow::Result<Context> {
        if !ctx.does_file_exist(ESLINTRC) || !ctx.does_file_exist(PACKAGE_JSON) {
            return Ok(ctx);
        }

        let raw = ctx.get_file(ESLINTRC).unwrap_or_default();
        let (comments, json) = split_eslint_config(&raw);
        let mut config: Value =
            serde_json::from_str(&json).with_context(|| format!("Cannot parse {ESLINTRC}"))?;

        let Some(overrides) = config.get_mut("overrides").and_then(Value::as_array_mut) else {
            remove_dependencies(&mut ctx, &[], &["eslint-plugin-deprecation"])?;
            return Ok(ctx);
        };

        let needs_update = overrides.iter().any(|o| {
            o.get("rules")
                .and_then(|rules| rules.get(DEPRECATION_RULE))
                .is_some()
        });

        if needs_update {
            for override_ in overrides.iter_mut().filter(|o| targets_ts_sources(o)) {
                rewrite_override(override_);
            }

            let json = serde_json::to_string_pretty(&config)?;
            let result = if comments.is_empty() {
                json
            } else {
                format!("{}\n{json}", comments.join("\n"))
            };
            ctx.update_file(ESLINTRC, result)?;

            add_dependencies(
                &mut ctx,
                &[
                    ("@typescript-eslint/eslint-plugin", "^8.3.0"),
                    ("@typescript-eslint/parser", "^8.3.0"),
                ],
                &[],
            )?;
        }

        // Without the rule the plugin is dead weight either way.
        remove_dependencies(&mut ctx, &[], &["eslint-plugin-deprecation"])?;
        Ok(ctx)
    }
}

fn targets_ts_sources(override_: &Value) -> bool {
    match override_.get("files") {
        Some(Value::Array(files)) => files.iter().any(|f| f.as_str() == Some(TS_SOURCES)),
        Some(Value::String(files)) => files.contains(TS_SOURCES),
        _ => false,
    }
}

fn rewrite_override(override_: &mut Value) {
    let Some(object) = override_.as_object_mut() else {
        return;
    };

    if let Some(Value::Array(plugins)) = object.get_mut("plugins") {
        plugins.retain(|p| p.as_str() != Some("deprecation"));
        if plugins.is_empty() {
            object.shift_remove("plugins");
        }
    }

    if let Some(Value::Object(rules)) = object.get_mut("rules") {
        rules.shift_remove(DEPRECATION_RULE);
        rules.insert("@typescript-eslint/no-deprecated".into(), Value::from("warn"));
    }
}

/// Separate block comment lines (`/* ... */` banners) from the JSON body.
pub fn split_eslint_config(content: &str) -> (Vec<&str>, String) {
    let mut comments = Vec::new();
    let mut config = String::new();
    for line in content.split('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with("/*") || trimmed.starts_with('*') {
            comments.push(line);
        } else {
            config.push_str(line);
            config.push('\n');
        }
    }
    (comments, config)
}
