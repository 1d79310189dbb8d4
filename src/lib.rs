//! PrimeCount - parallel prime-counting engine
//!
//! Counts the prime integers in a large line-delimited integer file by
//! partitioning it into byte ranges and distributing those ranges across a
//! pool of worker threads, resizing future ranges from live per-worker
//! throughput.
//!
//! # Architecture
//!
//! - **Primality** (`primality`): pure trial-division / Miller-Rabin oracle
//! - **Chunk** (`chunk`): byte-range line reader with correct boundary semantics
//! - **Task** (`task`): task ids, initial partitioning, adaptive sizing
//! - **Stats** (`stats`): per-worker counters, global average, performance class
//! - **Orchestrator** (`orchestrator`): task queues, dispatch policy, failure recovery
//! - **Worker** (`worker`): the thread body each lane runs

pub mod chunk;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod primality;
pub mod stats;
pub mod task;
pub mod util;
pub mod worker;

/// Result type used throughout this crate.
pub type Result<T> = anyhow::Result<T>;
