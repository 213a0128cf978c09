pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "gpsflow",
    about = "Gpsflow operator CLI",
    long_about = "Operate gpsflow migrations, demo fixtures, and smoke validation.",
    after_help = "Examples:\n  gpsflow migrate\n  gpsflow seed\n  gpsflow smoke"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo vehicle registry into the database")]
    Seed,
    #[command(about = "Run end-to-end readiness checks, including a full in-memory workflow run")]
    Smoke,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Smoke => commands::smoke::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
