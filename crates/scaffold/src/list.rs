use anyhow::Result;
use clap::Args;
use colored::Colorize;
use scaffold_codemod::select_range;

use crate::migrations::MIGRATIONS;

#[derive(Args, Debug, Default, Clone)]
#[command(about = "List the migrations known to this version of scaffold")]
pub struct ListArgs {
    /// Lowest migration version to show
    #[arg(long, value_name = "VERSION", default_value = "0.0.0")]
    pub from: String,

    /// Highest migration version to show (defaults to the tool version)
    #[arg(long, value_name = "VERSION")]
    pub to: Option<String>,
}

pub fn execute(args: ListArgs) -> Result<()> {
    let to = args.to.as_deref().unwrap_or(env!("CARGO_PKG_VERSION"));
    let migrations = select_range(MIGRATIONS, &args.from, to)?;

    if migrations.is_empty() {
        println!("No migrations between {} and {to}", args.from);
        return Ok(());
    }
    for migration in migrations {
        println!(
            "{} {} {}",
            migration.version.dimmed(),
            migration.key.bold(),
            migration.description
        );
    }
    Ok(())
}
