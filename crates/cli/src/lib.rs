pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "loadline",
    about = "Loadline operator CLI",
    long_about = "Prepare the Loadline database, seed the load board, inspect configuration, and check carriers against the FMCSA registry.",
    after_help = "Examples:\n  loadline migrate\n  loadline seed --loads loads.json\n  loadline verify 123456"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Upsert loads into the load board (built-in demo loads by default)")]
    Seed {
        #[arg(
            long,
            value_name = "FILE",
            help = "JSON array of loads to seed instead of the demo set"
        )]
        loads: Option<PathBuf>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(
        about = "Look up one MC number in the FMCSA registry and print the normalized result"
    )]
    Verify {
        #[arg(value_name = "MC_NUMBER")]
        mc_number: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed { loads } => commands::seed::run(loads.as_deref()),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Verify { mc_number } => commands::verify::run(&mc_number),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
