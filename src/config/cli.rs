//! CLI argument parsing using clap

use clap::Parser;
use std::path::PathBuf;

/// PrimeCount - parallel prime-counting engine for large integer files
#[derive(Parser, Debug)]
#[command(name = "primecount")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the input file (one decimal integer per line)
    #[arg(default_value = "input.txt")]
    pub path: PathBuf,

    /// Number of worker threads (defaults to the number of logical cores)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Progress update interval in milliseconds
    #[arg(long, default_value = "1000")]
    pub live_interval: u64,

    /// Disable in-place progress redraw (use when stdout is not a TTY)
    #[arg(long)]
    pub no_live: bool,

    /// Print verbose timing and diagnostic lines to stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_input_txt() {
        let cli = Cli::parse_from(["primecount"]);
        assert_eq!(cli.path, PathBuf::from("input.txt"));
        assert_eq!(cli.workers, None);
        assert_eq!(cli.live_interval, 1000);
        assert!(!cli.no_live);
        assert!(!cli.debug);
    }

    #[test]
    fn accepts_a_path_and_overrides() {
        let cli = Cli::parse_from([
            "primecount",
            "numbers.txt",
            "--workers",
            "4",
            "--live-interval",
            "250",
            "--no-live",
            "--debug",
        ]);
        assert_eq!(cli.path, PathBuf::from("numbers.txt"));
        assert_eq!(cli.workers, Some(4));
        assert_eq!(cli.live_interval, 250);
        assert!(cli.no_live);
        assert!(cli.debug);
    }
}
