mod cli;
mod commands;
mod config;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use flow_logging::flow_error;

use crate::cli::Cli;
use crate::config::AppConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::initialize(cli.log);

    let mut config = AppConfig::load(cli.config.as_deref());
    config.apply_env_overrides();
    if cli.headless {
        config.webdriver.headless = true;
    }

    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    match runtime.block_on(commands::run(cli.command, config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            flow_error!("run failed: {err}");
            ExitCode::FAILURE
        }
    }
}
