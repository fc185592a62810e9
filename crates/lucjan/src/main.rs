mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(mut cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a device connection
        Command::Config(args) => {
            let cfg = config::load_config_or_default();
            cli.global.output = Some(config::output_format(&cli.global, &cfg));
            commands::config_cmd::handle(args, &cli.global)
        }

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "lucjan", &mut std::io::stdout());
            Ok(())
        }

        // All other commands talk to the boiler
        cmd => {
            let cfg = lucjan_config::load_config()?;
            cli.global.output = Some(config::output_format(&cli.global, &cfg));

            let poller_config = config::build_poller_config(&cli.global, &cfg)?;

            tracing::debug!(command = ?cmd, host = %poller_config.host, "dispatching command");
            commands::dispatch(cmd, poller_config, &cli.global).await
        }
    }
}
