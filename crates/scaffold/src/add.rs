use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use scaffold_codemod::{ProjectConfig, RawOptions, find_addition};
use serde_json::Value;

use crate::additions::ADDITIONS;
use crate::checks::pre_codemod_checks;
use crate::update::{project_root, runner_for};

#[derive(Args, Debug, Default, Clone)]
#[command(about = "Add an optional feature to the project")]
pub struct AddArgs {
    /// Name of the addition to run
    #[arg(value_name = "NAME")]
    pub name: Option<String>,

    /// Commit the changes once the addition succeeded
    #[arg(long)]
    pub commit: bool,

    /// Skip the git and plugin directory checks
    #[arg(long)]
    pub force: bool,

    /// Addition option, may be repeated
    #[arg(long = "option", short = 'o', value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub options: Vec<(String, String)>,

    /// Project root (defaults to the current directory)
    #[arg(long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub path: Option<PathBuf>,
}

pub fn execute(args: AddArgs) -> Result<()> {
    let Some(name) = args.name else {
        eprintln!("{}", available_additions());
        bail!("No addition specified");
    };

    let addition = find_addition(ADDITIONS, &name)?;
    let root = project_root(args.path)?;
    pre_codemod_checks(&root, args.force)?;

    let raw: RawOptions = args
        .options
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();

    let mut runner = runner_for(&root, args.commit);
    let mut config = ProjectConfig::load(&**runner.provider(), &root);
    runner.run_addition(addition, &mut config, &raw)?;

    eprintln!("{} Added {name}", "✓".green());
    Ok(())
}

fn available_additions() -> String {
    let mut out = String::from("Available additions:\n");
    for addition in ADDITIONS {
        out.push_str(&format!("  {} {}\n", addition.name.bold(), addition.description));
        for flag in (addition.script)().flags() {
            let required = if flag.required { " (required)" } else { "" };
            out.push_str(&format!(
                "      --option {}=…{required}  {}\n",
                flag.name, flag.description
            ));
        }
    }
    out
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_options() {
        assert_eq!(
            parse_key_value("featureName=charts").unwrap(),
            ("featureName".to_string(), "charts".to_string())
        );
        assert_eq!(
            parse_key_value("frameworks=react,vue=x").unwrap(),
            ("frameworks".to_string(), "react,vue=x".to_string())
        );
        assert!(parse_key_value("featureName").is_err());
        assert!(parse_key_value("=charts").is_err());
    }

    #[test]
    fn lists_additions_with_their_options() {
        colored::control::set_override(false);
        let listing = available_additions();
        assert!(listing.contains("example-addition"));
        assert!(listing.contains("--option featureName=… (required)"));
        assert!(listing.contains("bundle-grafana-ui"));
    }
}
