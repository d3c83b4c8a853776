//! Hawk application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing (stderr, so stdout carries only answers)
//! 3. Build a conversation session over the JSON mailbox directory
//! 4. Optionally load the project named on the command line
//! 5. Run the interactive prompt on stdin

mod cli;
mod loader;
mod repl;

use std::io;
use std::process::ExitCode;

use clap::Parser;

use hawk_chat::{ConversationSession, ResponseGenerator};
use hawk_core::config::HawkConfig;

use cli::CliArgs;
use loader::{expand_home, JsonDirLoader};
use repl::Repl;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config_found = config_file.exists();
    let mut config = HawkConfig::load_or_default(&config_file);
    args.apply_to(&mut config);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    tracing::info!("Starting Hawk v{}", env!("CARGO_PKG_VERSION"));
    if config_found {
        tracing::info!(path = %config_file.display(), "Configuration loaded");
    } else {
        tracing::info!(path = %config_file.display(), "No configuration file, using defaults");
    }

    // Session.
    let session = match ConversationSession::new(&config) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            eprintln!(
                "{}\nSet analysis.internal_domains in {} or pass --internal-domain.",
                e,
                config_file.display()
            );
            return ExitCode::from(2);
        }
    };
    tracing::info!(session = %session.id(), "Session created");

    let data_loader = JsonDirLoader::new(expand_home(&config.general.data_dir));
    tracing::info!(path = %data_loader.root().display(), "Reading projects");
    let responder = ResponseGenerator::from_config(&config.chat);
    let mut repl = Repl::new(session, &data_loader, responder, args.json);

    if let Some(ref project) = args.project {
        println!("{}", repl.load(project));
    }

    let stdin = io::stdin();
    if let Err(e) = repl.run(stdin.lock(), io::stdout()) {
        tracing::error!(error = %e, "Prompt failed");
        return ExitCode::FAILURE;
    }

    tracing::info!(session = %repl.session().id(), "Hawk stopped");
    ExitCode::SUCCESS
}
