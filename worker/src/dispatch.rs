//! FILENAME: worker/src/dispatch.rs
//! PURPOSE: Routes one request envelope to the engine and renders the reply.
//! CONTEXT: Every reply is plain JSON. A failure anywhere, a panic included,
//! becomes the error envelope `{error, chartData: [], payload: {}}`; an
//! unknown operation tag yields `null`.

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::request::{AnalysisParams, AnalysisPayload, BinningPayload, Envelope, Operation, TestType};
use crate::{log_debug, log_enter, log_error, log_exit, log_warn};
use chart_engine::{process_chart, ChartRequest};
use engine::stats::{correlation_table, t_test_table, z_score_table};
use engine::{bin_records, cluster_records, EngineError};
use serde_json::{json, Value as JsonValue};
use std::io::{BufRead, Write};
use std::panic::{self, AssertUnwindSafe};

/// Reply to a binning request that lacks a parameter.
pub const BINNING_PARAMETERS_MISSING: &str = "Missing required parameters for binning.";

/// Handles request lines for one worker process.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    max_message_bytes: usize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher::new(&WorkerConfig::default())
    }
}

impl Dispatcher {
    pub fn new(config: &WorkerConfig) -> Self {
        Dispatcher {
            max_message_bytes: config.max_message_bytes,
        }
    }

    /// Reply to one request line.
    pub fn handle(&self, line: &str) -> JsonValue {
        if line.len() > self.max_message_bytes {
            let err = WorkerError::MessageTooLarge {
                size: line.len(),
                limit: self.max_message_bytes,
            };
            log_error!("WORKER", "{}", err);
            return err.to_envelope();
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| dispatch(line)))
            .unwrap_or_else(|cause| Err(WorkerError::Panic(panic_message(cause.as_ref()))));

        match outcome {
            Ok(reply) => reply,
            Err(err) => {
                log_error!("WORKER", "{}", err);
                err.to_envelope()
            }
        }
    }

    /// Answers every non-blank line of `reader` with one line on `writer`.
    /// Returns the number of requests handled.
    pub fn serve<R: BufRead, W: Write>(&self, reader: R, mut writer: W) -> Result<usize, WorkerError> {
        let mut handled = 0;
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let reply = self.handle(&line);
            serde_json::to_writer(&mut writer, &reply)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            handled += 1;
        }
        Ok(handled)
    }
}

/// Reply to one request line with the default limits.
pub fn handle_message(line: &str) -> JsonValue {
    Dispatcher::default().handle(line)
}

fn panic_message(cause: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = cause.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = cause.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

fn dispatch(line: &str) -> Result<JsonValue, WorkerError> {
    let envelope: Envelope = serde_json::from_str(line)?;
    let payload = match envelope.payload {
        JsonValue::Null => json!({}),
        payload => payload,
    };

    let operation = Operation::from_tag(&envelope.kind);
    log_enter!("WORKER", "dispatch", "{:?}", operation);
    let reply = match operation {
        Operation::RunAnalysis => run_analysis(serde_json::from_value(payload)?)?,
        Operation::ProcessDataForChart => {
            let request: ChartRequest = serde_json::from_value(payload)?;
            serde_json::to_value(process_chart(request))?
        }
        Operation::RunBinning => run_binning(serde_json::from_value(payload)?)?,
        Operation::Unknown(tag) => {
            log_warn!("WORKER", "unknown operation '{}'", tag);
            JsonValue::Null
        }
    };
    log_exit!("WORKER", "dispatch");
    Ok(reply)
}

/// Statistical tables reply `{headers, rows}`; clustering replies `{records}`.
pub fn run_analysis(payload: AnalysisPayload) -> Result<JsonValue, WorkerError> {
    let AnalysisPayload {
        test_type,
        records,
        params,
    } = payload;
    log_debug!("WORKER", "{:?} over {} records", test_type, records.len());

    let reply = match test_type {
        TestType::Correlation => {
            let measure1 = AnalysisParams::require(&params.measure1, "measure1")?;
            let measure2 = AnalysisParams::require(&params.measure2, "measure2")?;
            serde_json::to_value(correlation_table(&records, measure1, measure2))?
        }
        TestType::Ttest => {
            let measure = AnalysisParams::require(&params.measure, "measure")?;
            let dimension = AnalysisParams::require(&params.dimension, "dimension")?;
            serde_json::to_value(t_test_table(&records, measure, dimension))?
        }
        TestType::Zscore => {
            let measure = AnalysisParams::require(&params.measure, "measure")?;
            serde_json::to_value(z_score_table(&records, measure))?
        }
        TestType::Clustering => {
            let clustered = cluster_records(&records, params.cluster_count(), &params.fields)?;
            json!({ "records": clustered })
        }
        TestType::Unknown => {
            log_warn!("WORKER", "unknown analysis type");
            json!({})
        }
    };
    Ok(reply)
}

/// `{records}` with the bin column added, or `{error}` when a parameter is
/// missing.
pub fn run_binning(payload: BinningPayload) -> Result<JsonValue, WorkerError> {
    let bin_size = payload.bin_size();
    match bin_records(
        &payload.records,
        payload.measure.as_deref(),
        bin_size,
        payload.bin_name.as_deref(),
    ) {
        Ok(records) => Ok(json!({ "records": records })),
        Err(EngineError::MissingParameter(name)) => {
            log_warn!("WORKER", "binning without '{}'", name);
            Ok(json!({ "error": BINNING_PARAMETERS_MISSING }))
        }
        Err(err) => Err(err.into()),
    }
}
