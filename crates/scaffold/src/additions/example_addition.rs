use scaffold_codemod::package_json::{PACKAGE_JSON, add_dependencies, read_json_file, write_json_file};
use scaffold_codemod::{Codemod, CodemodOptions, Context, FieldSpec, OptionsSchema};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExampleOptions {
    feature_name: String,
    enabled: bool,
    port: Option<u16>,
    frameworks: Vec<String>,
}

pub struct ExampleAddition;

impl Codemod for ExampleAddition {
    fn name(&self) -> &'static str {
        "example-addition"
    }

    fn schema(&self) -> Option<OptionsSchema> {
        Some(
            OptionsSchema::new()
                .field(
                    FieldSpec::string("featureName")
                        .required()
                        .length(3, 50)
                        .describe("Name of the feature module to create"),
                )
                .field(
                    FieldSpec::bool("enabled")
                        .default_value(true)
                        .describe("Whether the feature starts enabled"),
                )
                .field(
                    FieldSpec::number("port")
                        .range(1000.0, 65535.0)
                        .describe("Port the feature listens on (default 3000)"),
                )
                .field(
                    FieldSpec::string_list("frameworks")
                        .default_value(vec!["react"])
                        .describe("Comma separated frameworks the feature supports"),
                ),
        )
    }

    fn run(&self, mut ctx: Context, options: &CodemodOptions) -> anyhow::Result<Context> {
        let options: ExampleOptions = options.parse()?;
        let name = &options.feature_name;

        if ctx.does_file_exist(PACKAGE_JSON) {
            let mut package_json: Value = read_json_file(&ctx, PACKAGE_JSON)?;
            if let Some(scripts) = package_json.get_mut("scripts").and_then(Value::as_object_mut) {
                if !scripts.contains_key("example-script") {
                    scripts.insert(
                        "example-script".into(),
                        Value::String(format!("echo \"Running {name}\"")),
                    );
                    write_json_file(&mut ctx, PACKAGE_JSON, &package_json)?;
                }
            }
            add_dependencies(&mut ctx, &[], &[("@types/node", "^20.0.0")])?;
        }

        let feature_path = format!("src/features/{name}.ts");
        if !ctx.does_file_exist(&feature_path) {
            let port = options.port.unwrap_or(3000);
            let frameworks = serde_json::to_string(&options.frameworks)?;
            let code = format!(
                "export const {name} = {{
  name: '{name}',
  enabled: {enabled},
  port: {port},
  frameworks: {frameworks},
  init() {{
    console.log('{name} initialized on port {port}');
  }},
}};
",
                enabled = options.enabled,
            );
            ctx.add_file(&feature_path, code)?;
        }

        if ctx.does_file_exist("src/deprecated.ts") {
            ctx.delete_file("src/deprecated.ts")?;
        }

        if ctx.does_file_exist("src/old-config.json") && !ctx.does_file_exist("src/new-config.json") {
            ctx.rename_file("src/old-config.json", "src/new-config.json")?;
        }

        Ok(ctx)
    }
}
