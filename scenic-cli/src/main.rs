use std::process::ExitCode;

use clap::Parser;

use scenic_cli::cli::{Cli, Commands};
use scenic_cli::commands::options::{self, OptionSources};
use scenic_cli::error::CliError;
use scenic_cli::output::OutputWriter;
use scenic_runner::logging::{LogConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig {
        level: cli.log_level.clone(),
        ..LogConfig::default()
    };
    if let Err(e) = init_tracing(&log_config) {
        eprintln!("warning: {e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.format);
    let sources = OptionSources {
        options_file: cli.config,
        defines: cli.define,
        environment: (!cli.no_env).then(|| std::env::vars().collect()),
        overrides: Default::default(),
    };

    tracing::debug!(command = ?cli.command, "scenic-cli starting");
    match cli.command {
        Commands::Options(args) => options::execute(args, sources, &writer).await,
    }
}
