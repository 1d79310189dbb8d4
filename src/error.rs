//! Error taxonomy
//!
//! Most errors in this crate are ordinary `anyhow::Error` with context
//! (I/O failures, startup failures) and are handled by propagation or by
//! the orchestrator's transient-error recovery path. `OrchestratorError`
//! carries the narrower class of *logic violations*: conditions that
//! should be structurally impossible and indicate a bug in the
//! orchestrator itself rather than an environmental failure.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("task id {0} was minted more than once in this run")]
    DuplicateTaskId(u64),

    #[error("completed byte ranges overlap: [{a_start}, {a_end}) and [{b_start}, {b_end})")]
    OverlappingCompletedRanges {
        a_start: u64,
        a_end: u64,
        b_start: u64,
        b_end: u64,
    },

    #[error("received a result from unknown worker {0}")]
    UnknownWorker(usize),
}
