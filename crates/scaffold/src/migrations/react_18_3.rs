use scaffold_codemod::package_json::{
    PACKAGE_JSON, add_dependencies, coerce_version, dependency_version, read_json_file,
};
use scaffold_codemod::{Codemod, CodemodOptions, Context};
use semver::Version;
use serde_json::Value;

const TARGET: &str = "^18.3.0";

pub struct React183;

impl Codemod for React183 {
    fn name(&self) -> &'static str {
        "005-react-18-3"
    }

    fn run(&self, mut ctx: Context, _options: &CodemodOptions) -> anyhow::Result<Context> {
        if !ctx.does_file_exist(PACKAGE_JSON) {
            return Ok(ctx);
        }

        let package_json: Value = read_json_file(&ctx, PACKAGE_JSON)?;
        let Some(react) = dependency_version(&package_json, "react").and_then(coerce_version) else {
            return Ok(ctx);
        };

        if react >= Version::new(18, 0, 0) && react < Version::new(18, 3, 0) {
            add_dependencies(
                &mut ctx,
                &[("react", TARGET), ("react-dom", TARGET)],
                &[("@types/react", TARGET), ("@types/react-dom", TARGET)],
            )?;
        }
        Ok(ctx)
    }
}
