//! Run counters reported through `tracing`.
//!
//! Nothing here depends on a telemetry backend; the binary decides where
//! events go by installing a subscriber.

use serde::Serialize;

/// What the driver observed during one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Rows pulled from the source.
    pub rows_read: u64,
    /// Rows that reached the terminal consumer.
    pub rows_forwarded: u64,
    /// A stage ended the stream; the driver stopped pulling from the source.
    pub stopped_early: bool,
}

pub fn emit_run(terminal: &str, stages: &[&str], stats: &RunStats) {
    tracing::debug!(
        terminal,
        stages = %stages.join(" -> "),
        rows_read = stats.rows_read,
        rows_forwarded = stats.rows_forwarded,
        stopped_early = stats.stopped_early,
        "pipeline run finished"
    );
}
