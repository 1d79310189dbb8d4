//! Orchestrator
//!
//! Sole owner of every piece of aggregate state: the pending task queue,
//! the failed-task queue, the remaining-range cursor, which workers are
//! busy, and the global stats. All mutation happens on this single thread,
//! triggered by messages received from worker threads over
//! `crossbeam_channel` — there are no locks or atomics anywhere in this
//! module, because nothing else ever touches this state concurrently.

pub mod protocol;

use crate::error::OrchestratorError;
use crate::stats::live::ProgressReporter;
use crate::stats::GlobalState;
use crate::task::{Task, TaskManager};
use crate::worker;
use anyhow::Context;
use crossbeam::channel::{unbounded, Receiver, Sender};
use protocol::{WorkerCommand, WorkerMessage};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub struct Options {
    pub num_workers: usize,
    pub live_interval: Duration,
    pub live_progress: bool,
}

/// Final, whole-run summary handed back to `main` for the report.
pub struct RunReport {
    pub total_primes: u64,
    pub elapsed: Duration,
    pub state: GlobalState,
    pub file_size: u64,
}

struct WorkerLane {
    commands: Sender<WorkerCommand>,
    handle: std::thread::JoinHandle<()>,
}

pub struct Orchestrator {
    path: PathBuf,
    options: Options,
}

impl Orchestrator {
    pub fn new(path: PathBuf, options: Options) -> Self {
        Self { path, options }
    }

    pub fn run(self) -> crate::Result<RunReport> {
        let file_size = crate::chunk::file_size(&self.path)
            .with_context(|| format!("failed to determine size of {}", self.path.display()))?;

        let mut task_manager = TaskManager::new();
        let mut task_queue: VecDeque<Task> =
            task_manager.initial_partition(file_size, self.options.num_workers).into();
        let mut failed_queue: VecDeque<Task> = VecDeque::new();
        let mut rem_range: Option<(u64, u64)> = None;

        let num_workers = self.options.num_workers.max(1).min(task_queue.len().max(1));

        let (result_tx, result_rx): (Sender<WorkerMessage>, Receiver<WorkerMessage>) = unbounded();
        let mut lanes: Vec<Option<WorkerLane>> = Vec::with_capacity(num_workers);
        let mut busy: std::collections::HashMap<usize, Task> = std::collections::HashMap::new();
        let mut state = GlobalState::new(0..num_workers);
        let mut live_workers = num_workers;
        let mut completed_ids: std::collections::HashSet<u64> = std::collections::HashSet::new();
        let mut completed_ranges: Vec<(u64, u64)> = Vec::new();

        for id in 0..num_workers {
            lanes.push(Some(spawn_lane(id, self.path.clone(), result_tx.clone())));
        }

        // Seed every lane with its first task via the shared dispatch policy.
        for id in 0..num_workers {
            dispatch_next(
                id,
                &lanes,
                &mut task_queue,
                &mut failed_queue,
                &mut rem_range,
                &mut task_manager,
                &state,
                &mut busy,
                &mut live_workers,
            )?;
        }

        let start = Instant::now();
        let mut reporter = ProgressReporter::new(
            self.options.live_interval,
            self.options.live_progress,
        );

        while live_workers > 0 {
            let message = match result_rx.recv_timeout(self.options.live_interval) {
                Ok(m) => m,
                Err(crossbeam::channel::RecvTimeoutError::Timeout) => {
                    reclaim_dead_lanes(&mut lanes, &mut busy, &mut failed_queue);
                    if reporter.should_update() {
                        reporter.display(&state, file_size);
                    }
                    continue;
                }
                Err(crossbeam::channel::RecvTimeoutError::Disconnected) => break,
            };

            match message {
                WorkerMessage::Completed {
                    worker_id,
                    task,
                    prime_count,
                    elapsed_ms,
                } => {
                    busy.remove(&worker_id);
                    record_completion(&mut completed_ids, &mut completed_ranges, task)?;
                    state.update(worker_id, elapsed_ms, prime_count, task.len());
                    task_manager.record(elapsed_ms);

                    dispatch_next(
                        worker_id,
                        &lanes,
                        &mut task_queue,
                        &mut failed_queue,
                        &mut rem_range,
                        &mut task_manager,
                        &state,
                        &mut busy,
                        &mut live_workers,
                    )?;
                }
                WorkerMessage::Failed {
                    worker_id, task, ..
                } => {
                    busy.remove(&worker_id);
                    failed_queue.push_back(task);
                    eprintln!(
                        "worker {worker_id} failed on task {} [{}, {}); requeued",
                        task.id, task.start, task.end
                    );
                    replace_lane(worker_id, &self.path, &result_tx, &mut lanes);
                    state.ensure_worker(worker_id);

                    dispatch_next(
                        worker_id,
                        &lanes,
                        &mut task_queue,
                        &mut failed_queue,
                        &mut rem_range,
                        &mut task_manager,
                        &state,
                        &mut busy,
                        &mut live_workers,
                    )?;
                }
            }

            if reporter.should_update() {
                reporter.display(&state, file_size);
            }
        }

        reporter.finish();

        for lane in lanes.into_iter().flatten() {
            let _ = lane.handle.join();
        }

        Ok(RunReport {
            total_primes: state.total_primes,
            elapsed: start.elapsed(),
            state,
            file_size,
        })
    }
}

fn spawn_lane(id: usize, path: PathBuf, results: Sender<WorkerMessage>) -> WorkerLane {
    let (cmd_tx, cmd_rx) = unbounded();
    let handle = std::thread::spawn(move || worker::run(id, path, cmd_rx, results));
    WorkerLane {
        commands: cmd_tx,
        handle,
    }
}

fn replace_lane(
    id: usize,
    path: &Path,
    results: &Sender<WorkerMessage>,
    lanes: &mut [Option<WorkerLane>],
) {
    if let Some(old) = lanes[id].take() {
        let _ = old.handle.join();
    }
    lanes[id] = Some(spawn_lane(id, path.to_path_buf(), results.clone()));
}

/// Detect workers whose thread died without ever reporting a result
/// (e.g. a panic). Anything left `busy` whose lane handle has finished is
/// treated the same as an explicit `Failed` message.
fn reclaim_dead_lanes(
    lanes: &mut [Option<WorkerLane>],
    busy: &mut std::collections::HashMap<usize, Task>,
    failed_queue: &mut VecDeque<Task>,
) {
    for (id, lane_slot) in lanes.iter().enumerate() {
        let Some(lane) = lane_slot else { continue };
        if lane.handle.is_finished() {
            if let Some(task) = busy.remove(&id) {
                eprintln!("worker {id} thread ended unexpectedly; requeuing task {}", task.id);
                failed_queue.push_back(task);
            }
        }
    }
}

/// Enforces the two structural invariants a `Completed` message must
/// satisfy: its task id must never have completed before, and its byte
/// range must not overlap any range already recorded as completed. Either
/// violation indicates a bug in the dispatch policy, not an environmental
/// failure, so it is reported via `OrchestratorError` rather than retried.
fn record_completion(
    completed_ids: &mut std::collections::HashSet<u64>,
    completed_ranges: &mut Vec<(u64, u64)>,
    task: Task,
) -> Result<(), OrchestratorError> {
    if !completed_ids.insert(task.id) {
        return Err(OrchestratorError::DuplicateTaskId(task.id));
    }
    for &(a_start, a_end) in completed_ranges.iter() {
        if task.start < a_end && a_start < task.end {
            return Err(OrchestratorError::OverlappingCompletedRanges {
                a_start,
                a_end,
                b_start: task.start,
                b_end: task.end,
            });
        }
    }
    completed_ranges.push((task.start, task.end));
    Ok(())
}

/// The dispatch policy: recovery first, then the main queue (smallest-first
/// for a demonstrably slow worker when there is a choice, otherwise most
/// recently enqueued), then an adaptively sized slice of the remaining
/// range, and finally an exit signal once nothing is left.
#[allow(clippy::too_many_arguments)]
fn dispatch_next(
    worker_id: usize,
    lanes: &[Option<WorkerLane>],
    task_queue: &mut VecDeque<Task>,
    failed_queue: &mut VecDeque<Task>,
    rem_range: &mut Option<(u64, u64)>,
    task_manager: &mut TaskManager,
    state: &GlobalState,
    busy: &mut std::collections::HashMap<usize, Task>,
    live_workers: &mut usize,
) -> Result<(), OrchestratorError> {
    let Some(lane) = lanes.get(worker_id).and_then(Option::as_ref) else {
        return Err(OrchestratorError::UnknownWorker(worker_id));
    };

    let next_task = if let Some(task) = failed_queue.pop_front() {
        Some(task)
    } else if !task_queue.is_empty() {
        let class = state.performance_class(worker_id);
        if class == crate::stats::PerformanceClass::Slow && task_queue.len() >= 2 {
            let (min_index, _) = task_queue
                .iter()
                .enumerate()
                .min_by_key(|(_, t)| t.len())
                .expect("non-empty queue has a minimum");
            task_queue.remove(min_index)
        } else {
            task_queue.pop_back()
        }
    } else if let Some((rem_start, rem_end)) = *rem_range {
        let class = state.performance_class(worker_id);
        let task = task_manager.create_adaptive_task(rem_start, rem_end, class);
        *rem_range = if task.end >= rem_end {
            None
        } else {
            Some((task.end, rem_end))
        };
        Some(task)
    } else {
        None
    };

    match next_task {
        Some(task) => {
            busy.insert(worker_id, task);
            if lane.commands.send(WorkerCommand::Run(task)).is_err() {
                busy.remove(&worker_id);
            }
        }
        None => {
            if lane.commands.send(WorkerCommand::Exit).is_ok() {
                *live_workers = live_workers.saturating_sub(1);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    fn default_options() -> Options {
        Options {
            num_workers: 2,
            live_interval: Duration::from_millis(20),
            live_progress: false,
        }
    }

    #[test]
    fn counts_primes_across_a_small_file() {
        let f = write_temp("2\n3\n4\n5\n6\n7\n8\n9\n");
        let orchestrator = Orchestrator::new(f.path().to_path_buf(), default_options());
        let report = orchestrator.run().unwrap();
        assert_eq!(report.total_primes, 4);
    }

    #[test]
    fn handles_unparseable_lines() {
        let f = write_temp("7\nfoo\n11\n13\nbar\n17\n");
        let orchestrator = Orchestrator::new(f.path().to_path_buf(), default_options());
        let report = orchestrator.run().unwrap();
        assert_eq!(report.total_primes, 4); // 7, 11, 13, 17
    }

    #[test]
    fn matches_reference_count_on_a_larger_file() {
        let mut contents = String::new();
        for n in 1..=5000u64 {
            contents.push_str(&n.to_string());
            contents.push('\n');
        }
        let f = write_temp(&contents);
        let reference = (1..=5000u64).filter(|&n| crate::primality::is_prime(n)).count() as u64;

        let orchestrator = Orchestrator::new(
            f.path().to_path_buf(),
            Options {
                num_workers: 4,
                live_interval: Duration::from_millis(20),
                live_progress: false,
            },
        );
        let report = orchestrator.run().unwrap();
        assert_eq!(report.total_primes, reference);
        assert_eq!(report.file_size, f.as_file().metadata().unwrap().len());
    }

    #[test]
    fn empty_file_completes_with_zero_primes() {
        let f = write_temp("");
        let orchestrator = Orchestrator::new(f.path().to_path_buf(), default_options());
        let report = orchestrator.run().unwrap();
        assert_eq!(report.total_primes, 0);
    }

    #[test]
    fn result_is_independent_of_worker_count() {
        let mut contents = String::new();
        for n in 1..=2000u64 {
            contents.push_str(&n.to_string());
            contents.push('\n');
        }
        let f = write_temp(&contents);

        for workers in [1, 2, 3, 8] {
            let orchestrator = Orchestrator::new(
                f.path().to_path_buf(),
                Options {
                    num_workers: workers,
                    live_interval: Duration::from_millis(20),
                    live_progress: false,
                },
            );
            let report = orchestrator.run().unwrap();
            assert_eq!(report.total_primes, 303, "worker count {workers}");
        }
    }

    #[test]
    fn record_completion_rejects_a_repeated_task_id() {
        let mut ids = std::collections::HashSet::new();
        let mut ranges = Vec::new();
        let task = Task { id: 1, start: 0, end: 10 };
        record_completion(&mut ids, &mut ranges, task).unwrap();
        let repeat = Task { id: 1, start: 10, end: 20 };
        assert_eq!(
            record_completion(&mut ids, &mut ranges, repeat),
            Err(OrchestratorError::DuplicateTaskId(1))
        );
    }

    #[test]
    fn record_completion_rejects_overlapping_ranges() {
        let mut ids = std::collections::HashSet::new();
        let mut ranges = Vec::new();
        record_completion(&mut ids, &mut ranges, Task { id: 1, start: 0, end: 10 }).unwrap();
        let overlapping = Task { id: 2, start: 5, end: 15 };
        assert_eq!(
            record_completion(&mut ids, &mut ranges, overlapping),
            Err(OrchestratorError::OverlappingCompletedRanges {
                a_start: 0,
                a_end: 10,
                b_start: 5,
                b_end: 15,
            })
        );
    }

    #[test]
    fn record_completion_accepts_adjacent_ranges() {
        let mut ids = std::collections::HashSet::new();
        let mut ranges = Vec::new();
        record_completion(&mut ids, &mut ranges, Task { id: 1, start: 0, end: 10 }).unwrap();
        record_completion(&mut ids, &mut ranges, Task { id: 2, start: 10, end: 20 }).unwrap();
        assert_eq!(ranges, vec![(0, 10), (10, 20)]);
    }
}
