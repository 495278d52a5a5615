//! Migrations applied by `scaffold update`, in the order they were written.

use scaffold_codemod::{Codemod, MigrationDescriptor};

mod react_18_3;
mod remove_testing_library_types;
mod update_eslint_deprecation_rule;

/// Version given to migrations written before updates were driven by
/// migrations, so they run for every project older than it.
pub const LEGACY_UPDATE_CUTOFF_VERSION: &str = "5.13.0";

pub static MIGRATIONS: &[MigrationDescriptor] = &[
    MigrationDescriptor {
        key: "003-update-eslint-deprecation-rule",
        version: LEGACY_UPDATE_CUTOFF_VERSION,
        description: "Replace deprecated eslint-plugin-deprecation with @typescript-eslint/no-deprecated rule.",
        script: update_eslint_deprecation_rule,
    },
    MigrationDescriptor {
        key: "005-react-18-3",
        version: "6.1.9",
        description: "Update React and ReactDOM 18.x versions to ^18.3.0 to surface React 19 compatibility issues.",
        script: react_18_3,
    },
    MigrationDescriptor {
        key: "007-remove-testing-library-types",
        version: "6.1.13",
        description: "Add setupTests.d.ts for @testing-library/jest-dom types and remove @types/testing-library__jest-dom npm package.",
        script: remove_testing_library_types,
    },
];

fn update_eslint_deprecation_rule() -> Box<dyn Codemod> {
    Box::new(update_eslint_deprecation_rule::UpdateEslintDeprecationRule)
}

fn react_18_3() -> Box<dyn Codemod> {
    Box::new(react_18_3::React183)
}

fn remove_testing_library_types() -> Box<dyn Codemod> {
    Box::new(remove_testing_library_types::RemoveTestingLibraryTypes)
}
