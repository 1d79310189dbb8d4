//! PrimeCount CLI entry point

use anyhow::{Context, Result};
use primecount::config::{build_config_from_cli, cli::Cli};
use primecount::orchestrator::{Options, Orchestrator, RunReport};
use primecount::stats::PerformanceClass;
use primecount::util::time::{format_bytes, format_duration, format_number};
use std::time::Instant;

fn main() -> Result<()> {
    let main_start = Instant::now();

    let cli = Cli::parse_args();

    let config_start = Instant::now();
    let config = build_config_from_cli(&cli)?;
    if config.debug {
        eprintln!(
            "DEBUG TIMING: config build: {:.3}s",
            config_start.elapsed().as_secs_f64()
        );
    }

    let file_size = primecount::chunk::file_size(&config.path)
        .with_context(|| format!("cannot read {}", config.path.display()))?;

    println!("PrimeCount");
    println!(
        "  Input:   {} ({})",
        config.path.display(),
        format_bytes(file_size)
    );
    println!("  Workers: {}", config.num_workers);
    println!();

    let orchestrator = Orchestrator::new(
        config.path.clone(),
        Options {
            num_workers: config.num_workers,
            live_interval: config.live_interval,
            live_progress: config.live_progress,
        },
    );

    let run_start = Instant::now();
    let report = orchestrator.run()?;
    if config.debug {
        eprintln!(
            "DEBUG TIMING: orchestration: {:.3}s",
            run_start.elapsed().as_secs_f64()
        );
    }

    print_results(&report);

    if config.debug {
        eprintln!(
            "DEBUG TIMING: total: {:.3}s",
            main_start.elapsed().as_secs_f64()
        );
    }

    Ok(())
}

fn print_results(report: &RunReport) {
    println!("═══════════════════════════════════════════════════════════");
    println!("                      RESULTS");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!("Elapsed time:  {}", format_duration(report.elapsed));
    println!("Primes found:  {}", format_number(report.total_primes));
    println!(
        "Global avg:    {:.2}ms per task",
        report.state.global_avg_ms
    );
    println!();

    println!("Per-worker summary:");
    let mut worker_ids: Vec<&usize> = report.state.workers.keys().collect();
    worker_ids.sort();
    for id in worker_ids {
        let stats = &report.state.workers[id];
        let class = match report.state.performance_class(*id) {
            PerformanceClass::Slow => "slow",
            PerformanceClass::Average => "average",
            PerformanceClass::Fast => "fast",
        };
        let avg = stats
            .avg_processing_ms()
            .map(|ms| format!("{ms:.2}ms"))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "  worker {id}: {} tasks, {} primes, avg {avg} ({class})",
            format_number(stats.tasks_completed),
            format_number(stats.primes_found),
        );
        if let Some(p99) = stats.latency.percentile(99.0) {
            println!("              p99 task latency: {}", format_duration(p99));
        }
    }
    println!();
    println!("═══════════════════════════════════════════════════════════");
}
