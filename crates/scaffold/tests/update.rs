#![cfg(not(target_os = "windows"))]

use scaffold_test_utils::assert_dir_snapshot;
use scaffold_test_utils::sandbox::Sandbox;

const PLUGIN_JSON: &str = r#"{
  "id": "myorg-widget-panel",
  "dependencies": {
    "grafanaDependency": ">=10.0.3"
  }
}
"#;

fn plugin_project(version: &str) -> Sandbox {
    let mut sb = Sandbox::new();
    sb.write("src/plugin.json", PLUGIN_JSON)
        .write(
            ".config/.cprc.json",
            format!("{{\n  \"version\": \"{version}\"\n}}\n"),
        )
        .git_init()
        .commit_all("init");
    sb
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn update_records_tool_version_and_commits() {
    let sb = plugin_project("5.0.0");

    let output = sb.run_output("scaffold", ["update", "--commit"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let stderr = stderr(&output);
    assert!(stderr.contains("003-update-eslint-deprecation-rule"));
    assert!(stderr.contains("007-remove-testing-library-types"));
    assert!(stderr.contains("No changes were made"));

    assert_dir_snapshot!(sb.project_path(), @r#"
    === .config/.cprc.json
    {
      "version": "6.2.0"
    }
    === src/plugin.json
    {
      "id": "myorg-widget-panel",
      "dependencies": {
        "grafanaDependency": ">=10.0.3"
      }
    }
    "#);

    assert_eq!(
        sb.git_log(),
        vec!["chore: update .config/.cprc.json to version 6.2.0.", "init"]
    );
}

#[test]
fn update_is_a_no_op_for_current_projects() {
    let sb = plugin_project("6.2.0");

    let stdout = sb.run("scaffold", ["update"], None).unwrap();
    assert!(stdout.starts_with("Nothing to update"));
    assert_eq!(sb.git_log(), vec!["init"]);
}

#[test]
fn update_refuses_dirty_working_tree() {
    let mut sb = plugin_project("5.0.0");
    sb.write("src/module.ts", "export {};\n");

    let output = sb.run_output("scaffold", ["update"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Please clean your repository working tree"));

    let output = sb.run_output("scaffold", ["update", "--force"]);
    assert!(output.status.success(), "{}", stderr(&output));
}

#[test]
fn update_only_runs_one_migration_and_keeps_the_version() {
    let mut sb = plugin_project("5.0.0");
    sb.write(
        "package.json",
        "{\n  \"devDependencies\": {\n    \"@testing-library/jest-dom\": \"6.1.4\"\n  }\n}\n",
    )
    .commit_all("add package.json");

    let output = sb.run_output(
        "scaffold",
        ["update", "--only", "007-remove-testing-library-types"],
    );
    assert!(output.status.success(), "{}", stderr(&output));

    assert_eq!(
        sb.read(".config/types/setupTests.d.ts").as_deref(),
        Some("import '@testing-library/jest-dom';\n")
    );
    assert!(sb.read(".config/.cprc.json").unwrap().contains("5.0.0"));
}

#[test]
fn update_rejects_unknown_migration() {
    let sb = plugin_project("5.0.0");

    let output = sb.run_output("scaffold", ["update", "--only", "999-nope"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unknown migration: 999-nope"));
}

#[test]
fn add_without_name_lists_additions() {
    let sb = plugin_project("6.2.0");

    let output = sb.run_output("scaffold", ["add"]);
    assert!(!output.status.success());

    let stderr = stderr(&output);
    assert!(stderr.contains("example-addition"));
    assert!(stderr.contains("bundle-grafana-ui"));
    assert!(stderr.contains("Error: No addition specified"));
}

#[test]
fn add_bundle_grafana_ui_enables_feature_flag() {
    let sb = plugin_project("6.2.0");

    let output = sb.run_output("scaffold", ["add", "bundle-grafana-ui", "--commit"]);
    assert!(output.status.success(), "{}", stderr(&output));

    assert_dir_snapshot!(sb.project_path(), @r#"
    === .config/.cprc.json
    {
      "version": "6.2.0",
      "features": {
        "bundleGrafanaUI": true
      }
    }
    === src/plugin.json
    {
      "id": "myorg-widget-panel",
      "dependencies": {
        "grafanaDependency": ">=10.2.0"
      }
    }
    "#);
    assert_eq!(
        sb.git_log(),
        vec!["chore: add bundle-grafana-ui support via create-plugin", "init"]
    );
    assert_eq!(
        sb.cmd("git", ["status", "--porcelain"]).read().unwrap(),
        "",
        "feature flag left uncommitted"
    );

    // A clean tree lets the next command pass the checks without --force.
    let output = sb.run_output("scaffold", ["update"]);
    assert!(output.status.success(), "{}", stderr(&output));
}

#[test]
fn add_reports_every_invalid_option() {
    let sb = plugin_project("6.2.0");

    let output = sb.run_output("scaffold", ["add", "example-addition", "--option", "port=80"]);
    assert!(!output.status.success());

    let stderr = stderr(&output);
    assert!(stderr.contains("featureName"));
    assert!(stderr.contains("port"));
    assert!(sb.read("src/features").is_none());
}
