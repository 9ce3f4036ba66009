//! pcmfx CLI - offline PCM audio transforms
//!
//! Command-line driver for the pcmfx library.

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{debug, error};

use pcmfx::cli::{commands, Cli, Commands};
use pcmfx::PcmError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    debug!("pcmfx v{}", env!("CARGO_PKG_VERSION"));

    match handle_command(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            if let Some(pcm_err) = err.downcast_ref::<PcmError>() {
                error!(
                    "[{}] failed at {} stage: {}",
                    pcm_err.error_code(),
                    pcm_err.stage(),
                    pcm_err.recovery_hint()
                );
            }
            ExitCode::FAILURE
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Process(args) => commands::process(&args),
        Commands::Info { input, raw } => commands::show_info(&input, &raw),
        Commands::Tone(args) => commands::tone(&args),
    }
}
