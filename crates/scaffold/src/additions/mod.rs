//! Additions users opt into with `scaffold add <name>`.

use scaffold_codemod::{AdditionDescriptor, Codemod};

mod bundle_grafana_ui;
mod example_addition;

pub static ADDITIONS: &[AdditionDescriptor] = &[
    AdditionDescriptor {
        name: "example-addition",
        description: "Adds an example feature module, script and dev dependency",
        script: example_addition,
        feature_flag: None,
    },
    AdditionDescriptor {
        name: "bundle-grafana-ui",
        description: "Bundles @grafana/ui with the plugin instead of loading it from Grafana",
        script: bundle_grafana_ui,
        feature_flag: Some("bundleGrafanaUI"),
    },
];

fn example_addition() -> Box<dyn Codemod> {
    Box::new(example_addition::ExampleAddition)
}

fn bundle_grafana_ui() -> Box<dyn Codemod> {
    Box::new(bundle_grafana_ui::BundleGrafanaUi)
}
