//! Orchestrator <-> worker protocol
//!
//! Two channels per worker lane carry everything between the orchestrator
//! and its workers: a downstream command channel (orchestrator -> worker,
//! one task at a time or an exit signal) and a single shared upstream
//! result channel (worker -> orchestrator) that every lane sends into.
//!
//! ```text
//! Orchestrator                      Worker N
//!      |-------- Task(range) -------->|
//!      |                               | (reads chunk, tests primality)
//!      |<------- Result(...) ---------|
//!      |-------- Task(range) -------->|
//!      |                               |
//!      |<------- Failed(...) ---------|   (I/O error mid-task)
//!      |-------- Exit ---------------->|
//! ```

use crate::task::Task;

/// Sent from the orchestrator to a single worker lane.
#[derive(Debug, Clone)]
pub enum WorkerCommand {
    Run(Task),
    Exit,
}

/// Sent from any worker lane to the orchestrator's shared result channel.
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    Completed {
        worker_id: usize,
        task: Task,
        prime_count: u64,
        elapsed_ms: u64,
    },
    Failed {
        worker_id: usize,
        task: Task,
        reason: String,
    },
}
