// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Paperkit — local-only PDF unlock, compression, and page tools.
//
// Entry point. Parses arguments, initialises logging and services, and runs
// one command. Nothing leaves the machine.

mod commands;
mod services;

use std::process::ExitCode;

use clap::Parser;
use paperkit_core::human_errors::humanize_error;

use commands::Cli;
use services::app_services::AppServices;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    tracing::debug!("Paperkit starting");

    let result = AppServices::init(cli.config.as_deref())
        .and_then(|services| commands::run(cli.command, &services));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = %err, "command failed");
            let human = humanize_error(&err);
            eprintln!("error: {}", human.message);
            eprintln!("       {}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}
