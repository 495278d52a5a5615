use scaffold_codemod::package_json::{
    PACKAGE_JSON, dependency_version, is_version_greater, read_json_file, remove_dependencies,
};
use scaffold_codemod::{Codemod, CodemodOptions, Context};
use serde_json::Value;

const SETUP_TESTS_TYPES: &str = ".config/types/setupTests.d.ts";
const JEST_DOM: &str = "@testing-library/jest-dom";
const JEST_DOM_IMPORT: &str = "import '@testing-library/jest-dom';\n";

pub struct RemoveTestingLibraryTypes;

impl Codemod for RemoveTestingLibraryTypes {
    fn name(&self) -> &'static str {
        "007-remove-testing-library-types"
    }

    fn run(&self, mut ctx: Context, _options: &CodemodOptions) -> anyhow::Result<Context> {
        if !ctx.does_file_exist(PACKAGE_JSON) {
            return Ok(ctx);
        }

        let package_json: Value = read_json_file(&ctx, PACKAGE_JSON)?;
        let ships_own_types = dependency_version(&package_json, JEST_DOM)
            .is_some_and(|version| is_version_greater(version, "6.0.0", true));
        if !ships_own_types {
            return Ok(ctx);
        }

        match ctx.get_file(SETUP_TESTS_TYPES) {
            Some(content) if content.contains(JEST_DOM) => {}
            Some(content) => ctx.update_file(SETUP_TESTS_TYPES, format!("{JEST_DOM_IMPORT}{content}"))?,
            None => ctx.add_file(SETUP_TESTS_TYPES, JEST_DOM_IMPORT)?,
        }

        remove_dependencies(&mut ctx, &[], &["@types/testing-library__jest-dom"])?;
        Ok(ctx)
    }
}
