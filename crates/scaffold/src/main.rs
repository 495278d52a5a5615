use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;

mod add;
mod additions;
mod checks;
mod fmt;
mod git;
mod install;
mod list;
mod migrations;
mod report;
mod update;

#[cfg(test)]
mod testing;

#[derive(Parser)]
#[command(name = "scaffold")]
#[command(about = "Keeps generated plugin projects up to date", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true, hide = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the migrations between the project's recorded version and this tool
    #[command(alias = "u")]
    Update(update::UpdateArgs),

    /// Add an optional feature to the project
    Add(add::AddArgs),

    /// List known migrations
    Migrations(list::ListArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG still wins over --debug
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env).init();

    match cli.command {
        Commands::Update(args) => update::execute(args),
        Commands::Add(args) => add::execute(args),
        Commands::Migrations(args) => list::execute(args),
    }
}
