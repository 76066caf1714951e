pub mod cli;
pub mod core;
pub mod diary;
pub mod shared;
pub mod storage;

use clap::Parser;
use std::process::ExitCode;

use crate::core::logging::init_logging;
use crate::shared::paths::{get_log_dir, resolve_storage_dir};

pub fn run() -> ExitCode {
    let cli = cli::Cli::parse();
    let storage_dir = resolve_storage_dir(cli.data_dir.as_deref());

    // Initialize logging first (before any other initialization)
    let _logging_guards = init_logging(&get_log_dir(&storage_dir));

    match cli::execute(cli, &storage_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(target: "system", "Command failed: {:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
