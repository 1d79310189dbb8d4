//! Worker thread
//!
//! Each worker is a single `std::thread::spawn`'d lane that blocks on its
//! downstream command channel, executes one task at a time (seek, read the
//! lines in range via [`crate::chunk::ChunkReader`], test each value with
//! [`crate::primality::is_prime`]), and reports the result upstream. A
//! worker never retries internally; any I/O error is reported as a
//! `Failed` message and the orchestrator decides what happens next.

use crate::chunk::ChunkReader;
use crate::orchestrator::protocol::{WorkerCommand, WorkerMessage};
use crate::primality::is_prime;
use crossbeam::channel::{Receiver, Sender};
use std::path::PathBuf;
use std::time::Instant;

/// Runs until it receives `WorkerCommand::Exit`, then returns.
pub fn run(
    worker_id: usize,
    path: PathBuf,
    commands: Receiver<WorkerCommand>,
    results: Sender<WorkerMessage>,
) {
    for command in commands.iter() {
        match command {
            WorkerCommand::Exit => break,
            WorkerCommand::Run(task) => {
                let start = Instant::now();
                let outcome = count_primes_in_task(&path, task.start, task.end);
                let elapsed_ms = start.elapsed().as_millis() as u64;

                let message = match outcome {
                    Ok(prime_count) => WorkerMessage::Completed {
                        worker_id,
                        task,
                        prime_count,
                        elapsed_ms,
                    },
                    Err(e) => WorkerMessage::Failed {
                        worker_id,
                        task,
                        reason: e.to_string(),
                    },
                };

                // The orchestrator always outlives its workers; a send
                // failure here means it has already shut down.
                if results.send(message).is_err() {
                    break;
                }
            }
        }
    }
}

fn count_primes_in_task(path: &std::path::Path, start: u64, end: u64) -> crate::Result<u64> {
    let reader = ChunkReader::open(path, start, end)?;
    Ok(reader.filter(|&n| is_prime(n)).count() as u64)
}
