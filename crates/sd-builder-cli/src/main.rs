//! `sd-builder` binary: argument parsing, logging and command dispatch.

use std::sync::Arc;

use clap::Parser;
use miette::Result;
use sd_builder_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = run(args).await;

    result.map_err(error::cli_error_to_miette)
}

async fn run(args: cli::Cli) -> error::Result<()> {
    let options = Arc::new(args.build_options()?);
    tracing::debug!(?options, "Resolved build options");

    match args.command {
        cli::Command::Build(build_args) => commands::build_execute(options, build_args).await,
        cli::Command::Config(config_args) => commands::config_execute(options, config_args).await,
        cli::Command::Dev(dev_args) => commands::dev_execute(options, dev_args).await,
    }
}
