//! Entry point for the `quotedesk` CLI. It parses arguments, sets up
//! logging, dispatches to the command handler, and maps errors to exit codes.

use quotedesk::cli::Cli;
use quotedesk::config::Config;
use quotedesk::context::DeskContext;
use quotedesk::{commands, exit_codes, logging};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // The log level lives in the desk config; a missing or broken config
    // falls back to the default level and is reported by the command itself.
    let level = DeskContext::resolve(cli.global.home.as_deref())
        .and_then(|ctx| Config::load_or_default(ctx.config_path()))
        .map(|config| config.log_level)
        .unwrap_or_default();
    logging::init(level, cli.global.verbose);

    match commands::dispatch(&cli.global, cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
