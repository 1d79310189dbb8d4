//! Progress reporting
//!
//! Periodic console progress for a run in flight: overall completion
//! percent, resident memory, a one-line-per-worker breakdown, the run-wide
//! average task duration, and an ETA. Updates are gated to at most once per
//! configured interval (default 1000ms), and redraw in place on a TTY via
//! carriage return, matching this codebase's live-stats convention.

use crate::stats::{GlobalState, PerformanceClass};
use crate::util::resource::ResourceSnapshot;
use crate::util::time::format_duration;
use std::time::{Duration, Instant};

pub struct ProgressReporter {
    interval: Duration,
    last_update: Instant,
    start: Instant,
    live: bool,
}

impl ProgressReporter {
    pub fn new(interval: Duration, live: bool) -> Self {
        let now = Instant::now();
        Self {
            interval,
            last_update: now,
            start: now,
            live,
        }
    }

    pub fn should_update(&self) -> bool {
        self.last_update.elapsed() >= self.interval
    }

    pub fn mark_updated(&mut self) {
        self.last_update = Instant::now();
    }

    /// Render one progress line. `file_size` of 0 is treated as 100% complete.
    pub fn display(&mut self, state: &GlobalState, file_size: u64) {
        let percent = if file_size == 0 {
            100.0
        } else {
            (state.total_bytes_processed as f64 / file_size as f64 * 100.0).min(100.0)
        };

        let elapsed = self.start.elapsed();
        let eta = estimate_eta(elapsed, percent);

        let resident = ResourceSnapshot::take()
            .map(|s| crate::util::time::format_bytes(s.memory_rss_bytes))
            .unwrap_or_else(|| "n/a".to_string());

        let mut worker_ids: Vec<&usize> = state.workers.keys().collect();
        worker_ids.sort();
        let mut worker_summary = String::new();
        for id in worker_ids {
            let w = &state.workers[id];
            let class = match state.performance_class(*id) {
                PerformanceClass::Slow => "slow",
                PerformanceClass::Average => "avg",
                PerformanceClass::Fast => "fast",
            };
            worker_summary.push_str(&format!(
                " w{id}[{class}]:{}/{}p",
                w.tasks_completed, w.primes_found
            ));
        }

        let line = format!(
            "\r[{:>5.1}%] mem={resident} global_avg={:.1}ms eta={} primes={}{}",
            percent,
            state.global_avg_ms,
            eta.map(format_duration).unwrap_or_else(|| "?".to_string()),
            state.total_primes,
            worker_summary,
        );

        if self.live {
            print!("{line}   ");
            use std::io::Write;
            std::io::stdout().flush().ok();
        } else {
            println!("{}", line.trim_start_matches('\r'));
        }
        self.mark_updated();
    }

    /// Clear the in-place progress line before printing the final report.
    pub fn finish(&self) {
        if self.live {
            println!();
        }
    }
}

fn estimate_eta(elapsed: Duration, percent: f64) -> Option<Duration> {
    if percent <= 0.0 || percent >= 100.0 {
        return None;
    }
    let fraction = percent / 100.0;
    let total_estimated = elapsed.as_secs_f64() / fraction;
    let remaining = (total_estimated - elapsed.as_secs_f64()).max(0.0);
    Some(Duration::from_secs_f64(remaining))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_update_respects_interval() {
        let reporter = ProgressReporter::new(Duration::from_millis(50), false);
        assert!(!reporter.should_update());
        std::thread::sleep(Duration::from_millis(60));
        assert!(reporter.should_update());
    }

    #[test]
    fn eta_is_none_at_boundaries() {
        assert!(estimate_eta(Duration::from_secs(1), 0.0).is_none());
        assert!(estimate_eta(Duration::from_secs(1), 100.0).is_none());
        assert!(estimate_eta(Duration::from_secs(10), 50.0).is_some());
    }

    #[test]
    fn display_does_not_panic_on_empty_state() {
        let state = GlobalState::new(0..2);
        let mut reporter = ProgressReporter::new(Duration::from_millis(1), false);
        reporter.display(&state, 1024);
    }
}
