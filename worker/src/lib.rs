//! FILENAME: worker/src/lib.rs
// PURPOSE: Main library entry point for the chart worker.
// CONTEXT: One request per stdin line, one JSON reply per stdout line. The
// engine crates stay free of I/O; everything process-level lives here.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod request;

pub use config::WorkerConfig;
pub use dispatch::{handle_message, run_analysis, run_binning, Dispatcher, BINNING_PARAMETERS_MISSING};
pub use error::WorkerError;
pub use logging::{init_log_file, next_seq, write_log};
pub use request::{AnalysisParams, AnalysisPayload, BinningPayload, Envelope, Operation, TestType};
