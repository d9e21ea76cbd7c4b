mod cli;
mod commands;
mod config;
mod endpoint;
mod errors;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::Result;

use crate::cli::Cli;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    errors::init()?;
    let args = Cli::parse();
    let config = Config::new(args.config.as_deref())?;
    let _log_guard = logging::init(
        &config.app.data_dir,
        args.log_level.as_deref(),
        &config.app.log_level,
    )?;

    let ok = commands::run(args.cmd, &config.intake).await?;
    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
