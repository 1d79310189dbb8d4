//! Task model and adaptive partitioning
//!
//! A `Task` is a half-open byte range of the input file plus a unique id.
//! `TaskManager` mints the initial partition, tracks a rolling window of
//! recent task durations, and computes adaptive chunk sizes from that
//! window combined with a worker's performance class.

use crate::stats::PerformanceClass;

/// Lower bound on any minted chunk size, except the final chunk of the file.
pub const MIN_CHUNK: u64 = 1024 * 1024;
/// Upper bound on any minted chunk size, except the final chunk of the file.
pub const MAX_CHUNK: u64 = 10 * 1024 * 1024;
/// Size of the recent-duration FIFO window driving the adaptive sizer.
pub const HISTORY_WINDOW: usize = 20;

/// A unit of work: the byte range `[start, end)` of the input file, tagged
/// with a run-unique id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    pub id: u64,
    pub start: u64,
    pub end: u64,
}

impl Task {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Mints tasks and tracks the performance history that drives adaptive
/// sizing. Owned exclusively by the orchestrator's single thread — the id
/// counter and history are plain fields, not atomics, because nothing else
/// ever mints a task concurrently.
#[derive(Debug)]
pub struct TaskManager {
    next_id: u64,
    recent_history: std::collections::VecDeque<u64>,
    recent_avg: f64,
}

impl TaskManager {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            recent_history: std::collections::VecDeque::with_capacity(HISTORY_WINDOW),
            recent_avg: 0.0,
        }
    }

    fn mint_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Produce the initial contiguous partition of `[0, file_size)`.
    pub fn initial_partition(&mut self, file_size: u64, num_cores: usize) -> Vec<Task> {
        let chunk_size = initial_chunk_size(file_size, num_cores);
        let mut tasks = Vec::new();
        let mut offset = 0u64;
        while offset < file_size {
            let end = (offset + chunk_size).min(file_size);
            tasks.push(Task {
                id: self.mint_id(),
                start: offset,
                end,
            });
            offset = end;
        }
        tasks
    }

    /// Record a completed task's processing time into the rolling window.
    pub fn record(&mut self, duration_ms: u64) {
        if self.recent_history.len() >= HISTORY_WINDOW {
            self.recent_history.pop_front();
        }
        self.recent_history.push_back(duration_ms);
        let sum: u64 = self.recent_history.iter().sum();
        self.recent_avg = sum as f64 / self.recent_history.len() as f64;
    }

    /// Mean of the most recent (up to `HISTORY_WINDOW`) task durations.
    pub fn recent_avg_ms(&self) -> Option<f64> {
        if self.recent_history.is_empty() {
            None
        } else {
            Some(self.recent_avg)
        }
    }

    /// Mint a new task covering the head of `[rem_start, rem_end)`, sized by
    /// the adaptive sizer and the target worker's performance class.
    pub fn create_adaptive_task(
        &mut self,
        rem_start: u64,
        rem_end: u64,
        class: PerformanceClass,
    ) -> Task {
        let base = adaptive_size(self.recent_avg_ms());
        let adjusted = apply_class_multiplier(base, class);
        let remaining = rem_end.saturating_sub(rem_start);
        let size = adjusted.min(remaining.max(1));
        Task {
            id: self.mint_id(),
            start: rem_start,
            end: rem_start + size.min(remaining),
        }
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

/// The initial-partition formula from the spec: chunk size depends on how
/// many min/max-sized chunks the file could hold relative to `num_cores`.
fn initial_chunk_size(file_size: u64, num_cores: usize) -> u64 {
    let num_cores = num_cores.max(1) as u64;
    if file_size < MIN_CHUNK.saturating_mul(num_cores * 2) {
        ceil_div(file_size, num_cores * 2).max(1024)
    } else if file_size < MAX_CHUNK.saturating_mul(num_cores * 4) {
        ceil_div(file_size, num_cores * 4)
    } else {
        ceil_div(file_size, num_cores * 4).clamp(MIN_CHUNK, MAX_CHUNK)
    }
}

fn ceil_div(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        (a + b - 1) / b
    }
}

/// Lookup table mapping recent average task duration to a base chunk size.
fn adaptive_size(recent_avg_ms: Option<f64>) -> u64 {
    match recent_avg_ms {
        None => MAX_CHUNK,
        Some(avg) if avg > 1000.0 => MIN_CHUNK,
        Some(avg) if avg > 500.0 => (MIN_CHUNK + MAX_CHUNK) / 4,
        Some(avg) if avg > 200.0 => (MIN_CHUNK + MAX_CHUNK) / 2,
        Some(_) => MAX_CHUNK,
    }
}

fn apply_class_multiplier(base: u64, class: PerformanceClass) -> u64 {
    match class {
        PerformanceClass::Slow => (base / 2).max(MIN_CHUNK),
        PerformanceClass::Fast => ((base as f64 * 1.5) as u64).min(MAX_CHUNK),
        PerformanceClass::Average => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_partition_covers_whole_file_with_unique_ids() {
        let mut tm = TaskManager::new();
        let tasks = tm.initial_partition(37 * 1024 * 1024, 4);
        assert_eq!(tasks[0].start, 0);
        let mut cursor = 0u64;
        let mut ids = std::collections::HashSet::new();
        for t in &tasks {
            assert_eq!(t.start, cursor);
            assert!(t.end > t.start);
            assert!(ids.insert(t.id), "duplicate id {}", t.id);
            cursor = t.end;
        }
        assert_eq!(cursor, 37 * 1024 * 1024);
    }

    #[test]
    fn tiny_file_produces_small_floor_chunk() {
        let mut tm = TaskManager::new();
        let tasks = tm.initial_partition(16, 4);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].end, 16);
    }

    #[test]
    fn adaptive_size_bounds_respected() {
        assert_eq!(adaptive_size(None), MAX_CHUNK);
        assert_eq!(adaptive_size(Some(1500.0)), MIN_CHUNK);
        assert_eq!(adaptive_size(Some(50.0)), MAX_CHUNK);
        let mid = adaptive_size(Some(700.0));
        assert!(mid >= MIN_CHUNK && mid <= MAX_CHUNK);
    }

    #[test]
    fn slow_worker_gets_half_size_floor_at_min() {
        let halved = apply_class_multiplier(MIN_CHUNK, PerformanceClass::Slow);
        assert_eq!(halved, MIN_CHUNK);
    }

    #[test]
    fn fast_worker_gets_larger_chunk_capped_at_max() {
        let boosted = apply_class_multiplier(MAX_CHUNK, PerformanceClass::Fast);
        assert_eq!(boosted, MAX_CHUNK);
    }

    #[test]
    fn history_window_keeps_only_last_20() {
        let mut tm = TaskManager::new();
        for ms in 1..=30u64 {
            tm.record(ms);
        }
        assert_eq!(tm.recent_history.len(), HISTORY_WINDOW);
        // Average of 11..=30
        let expected: f64 = (11..=30u64).sum::<u64>() as f64 / 20.0;
        assert!((tm.recent_avg_ms().unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn create_adaptive_task_truncates_to_remaining_range() {
        let mut tm = TaskManager::new();
        let task = tm.create_adaptive_task(100, 100 + 512, PerformanceClass::Average);
        assert_eq!(task.start, 100);
        assert_eq!(task.end, 100 + 512);
    }
}
