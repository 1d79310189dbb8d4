//! Configuration
//!
//! The only external input this program takes is a handful of CLI flags, so
//! configuration is CLI-args-only: one `Config` assembled from a parsed
//! `Cli` in a single place, with `anyhow::Context` on every fallible step.

pub mod cli;

use cli::Cli;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

/// Fully resolved run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub path: PathBuf,
    pub num_workers: usize,
    pub live_interval: Duration,
    pub live_progress: bool,
    pub debug: bool,
}

/// Build a `Config` from parsed CLI arguments, resolving defaults that
/// depend on the host environment (worker count, TTY-ness).
pub fn build_config_from_cli(cli: &Cli) -> crate::Result<Config> {
    let num_workers = match cli.workers {
        Some(0) => anyhow::bail!("--workers must be at least 1"),
        Some(n) => n,
        None => num_cpus::get(),
    };

    let live_interval = Duration::from_millis(cli.live_interval);
    let live_progress = !cli.no_live && std::io::stdout().is_terminal();

    Ok(Config {
        path: cli.path.clone(),
        num_workers,
        live_interval,
        live_progress,
        debug: cli.debug,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Parser;

    #[test]
    fn defaults_use_host_core_count() {
        let cli = Cli::parse_from(["primecount"]);
        let config = build_config_from_cli(&cli).unwrap();
        assert_eq!(config.num_workers, num_cpus::get());
        assert_eq!(config.live_interval, Duration::from_millis(1000));
    }

    #[test]
    fn explicit_worker_count_is_honored() {
        let cli = Cli::parse_from(["primecount", "--workers", "6"]);
        let config = build_config_from_cli(&cli).unwrap();
        assert_eq!(config.num_workers, 6);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let cli = Cli::parse_from(["primecount", "--workers", "0"]);
        assert!(build_config_from_cli(&cli).is_err());
    }
}
