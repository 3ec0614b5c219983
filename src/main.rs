mod commands;
mod compose;
mod config;
mod error;
mod lookup;
mod message;
mod platform;
mod route;
mod strip;
mod telemetry;
mod template;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::doctor::DoctorArgs;
use commands::init::InitArgs;
use commands::listen::ListenArgs;

#[derive(Debug, Parser)]
#[command(
    name = "stolenbot",
    version,
    about = "Answers serial-number queries from the message stream within the platform character limit"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Connect to the message stream and answer serial queries
    Listen(ListenArgs),
    /// Validate config, templates, and collaborator reachability
    Doctor(DoctorArgs),
    /// Write a starter config file
    Init(InitArgs),
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Listen(_) => "listen",
            Self::Doctor(_) => "doctor",
            Self::Init(_) => "init",
        }
    }
}

fn main() -> ExitCode {
    telemetry::init();

    let cli = Cli::parse();

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Listen(args) => args.execute(),
        Commands::Doctor(args) => args.execute(),
        Commands::Init(args) => args.execute(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(exit_err) = e.downcast_ref::<error::ExitError>() {
                eprintln!("error: {exit_err}");
                exit_err.exit_code()
            } else {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        }
    }
}
