//! FILENAME: worker/src/main.rs
// PURPOSE: Chart worker entry point.
// FORMAT: seq|level|category|message on stderr, replies on stdout

use std::io;
use std::process::ExitCode;
use worker::{log_error, log_info, logging, Dispatcher, WorkerConfig};

fn main() -> ExitCode {
    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[WORKER] {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logging::init(&config) {
        eprintln!("[WORKER] {}", e);
        return ExitCode::FAILURE;
    }

    log_info!(
        "WORKER",
        "chart worker started (level {}, max message {} bytes)",
        logging::max_level(),
        config.max_message_bytes
    );

    let dispatcher = Dispatcher::new(&config);
    let stdin = io::stdin();
    let stdout = io::stdout();
    match dispatcher.serve(stdin.lock(), stdout.lock()) {
        Ok(handled) => {
            log_info!("WORKER", "input closed after {} requests", handled);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log_error!("WORKER", "{}", e);
            ExitCode::FAILURE
        }
    }
}
