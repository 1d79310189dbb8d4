//! Latency histogram using HdrHistogram
//!
//! This module provides a wrapper around the HdrHistogram library for tracking
//! IO operation latencies with high precision and low overhead.
//!
//! # Features
//!
//! - **High precision**: Sub-microsecond resolution for low latencies
//! - **Wide range**: Tracks latencies from nanoseconds to seconds
//! - **Low overhead**: Constant-time recording and percentile queries
//! - **Accurate percentiles**: Corrected percentile calculations
//!
//! # Example
//!
//! ```
//! use primecount::stats::histogram::LatencyHistogram;
//! use std::time::Duration;
//!
//! let mut hist = LatencyHistogram::new();
//!
//! // Record some latencies
//! hist.record(Duration::from_micros(100));
//! hist.record(Duration::from_micros(150));
//! hist.record(Duration::from_micros(200));
//!
//! // Get percentiles
//! let p50 = hist.percentile(50.0);
//! let p99 = hist.percentile(99.0);
//!
//! println!("p50: {:?}, p99: {:?}", p50, p99);
//! ```

use crate::Result;
use hdrhistogram::Histogram;
use std::time::Duration;

/// Latency histogram wrapper
///
/// Wraps HdrHistogram with a convenient interface for recording and querying
/// IO operation latencies. The histogram is configured to track latencies from
/// 1 nanosecond to 1 hour with 3 significant digits of precision.
///
/// # Precision
///
/// The histogram uses 3 significant digits, which means:
/// - Values are accurate to within 0.1% of the actual value
/// - Memory usage is approximately 2KB per histogram
/// - Recording and querying are O(1) operations
///
/// # Range
///
/// - **Minimum**: 1 nanosecond
/// - **Maximum**: 3,600,000,000,000 nanoseconds (1 hour)
/// - **Resolution**: Sub-microsecond for low latencies
#[derive(Debug)]
pub struct LatencyHistogram {
    histogram: Histogram<u64>,
}

impl LatencyHistogram {
    /// Create a new latency histogram
    ///
    /// The histogram is configured to track latencies from 1ns to 1 hour with
    /// 3 significant digits of precision.
    pub fn new() -> Self {
        // Create histogram with:
        // - Minimum value: 1 (1 nanosecond)
        // - Maximum value: 3,600,000,000,000 (1 hour in nanoseconds)
        // - Significant digits: 3 (0.1% precision)
        let histogram = Histogram::new_with_bounds(1, 3_600_000_000_000, 3)
            .expect("Failed to create histogram with valid bounds");

        Self { histogram }
    }

    /// Record a latency sample
    ///
    /// Converts the duration to nanoseconds and records it in the histogram.
    /// If the value is outside the histogram's range, it is clamped to the
    /// nearest valid value.
    ///
    /// # Arguments
    ///
    /// * `latency` - The latency duration to record
    ///
    /// # Example
    ///
    /// ```
    /// use primecount::stats::histogram::LatencyHistogram;
    /// use std::time::Duration;
    ///
    /// let mut hist = LatencyHistogram::new();
    /// hist.record(Duration::from_micros(100));
    /// hist.record(Duration::from_millis(5));
    /// ```
    #[inline]
    pub fn record(&mut self, latency: Duration) {
        let nanos = latency.as_nanos() as u64;
        // Clamp to valid range (1ns to 1 hour)
        let value = nanos.max(1).min(3_600_000_000_000);
        // Saturating record - if value is out of range, it's clamped
        let _ = self.histogram.record(value);
    }

    /// Get the value at a specific percentile
    ///
    /// Returns the latency value at the specified percentile. Uses corrected
    /// percentile calculation for accurate results.
    ///
    /// # Arguments
    ///
    /// * `percentile` - The percentile to query (0.0 - 100.0)
    ///
    /// # Returns
    ///
    /// The latency at the specified percentile, or None if the histogram is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use primecount::stats::histogram::LatencyHistogram;
    /// use std::time::Duration;
    ///
    /// let mut hist = LatencyHistogram::new();
    /// hist.record(Duration::from_micros(100));
    /// hist.record(Duration::from_micros(200));
    ///
    /// if let Some(p50) = hist.percentile(50.0) {
    ///     println!("Median latency: {:?}", p50);
    /// }
    /// ```
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        if self.histogram.len() == 0 {
            return None;
        }

        let value = self.histogram.value_at_percentile(percentile);
        Some(Duration::from_nanos(value))
    }

    /// Get the minimum recorded latency
    ///
    /// # Returns
    ///
    /// The minimum latency, or None if the histogram is empty.
    pub fn min(&self) -> Option<Duration> {
        if self.histogram.len() == 0 {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.min()))
    }

    /// Get the maximum recorded latency
    ///
    /// # Returns
    ///
    /// The maximum latency, or None if the histogram is empty.
    pub fn max(&self) -> Option<Duration> {
        if self.histogram.len() == 0 {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.max()))
    }

    /// Get the mean (average) latency
    ///
    /// # Returns
    ///
    /// The mean latency, or None if the histogram is empty.
    pub fn mean(&self) -> Option<Duration> {
        if self.histogram.len() == 0 {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.mean() as u64))
    }

    /// Get the standard deviation of latencies
    ///
    /// # Returns
    ///
    /// The standard deviation, or None if the histogram is empty.
    pub fn stddev(&self) -> Option<Duration> {
        if self.histogram.len() == 0 {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.stdev() as u64))
    }

    /// Get the number of samples recorded
    ///
    /// # Returns
    ///
    /// The total number of latency samples recorded.
    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    /// Check if the histogram is empty
    ///
    /// # Returns
    ///
    /// True if no samples have been recorded, false otherwise.
    pub fn is_empty(&self) -> bool {
        self.histogram.len() == 0
    }

    /// Merge another histogram into this one
    ///
    /// Combines the samples from another histogram into this one. This is used
    /// to aggregate statistics from multiple workers.
    ///
    /// # Arguments
    ///
    /// * `other` - The histogram to merge into this one
    ///
    /// # Errors
    ///
    /// Returns an error if the histograms have incompatible configurations.
    ///
    /// # Example
    ///
    /// ```
    /// use primecount::stats::histogram::LatencyHistogram;
    /// use std::time::Duration;
    ///
    /// let mut hist1 = LatencyHistogram::new();
    /// hist1.record(Duration::from_micros(100));
    ///
    /// let mut hist2 = LatencyHistogram::new();
    /// hist2.record(Duration::from_micros(200));
    ///
    /// hist1.merge(&hist2).unwrap();
    /// assert_eq!(hist1.len(), 2);
    /// ```
    pub fn merge(&mut self, other: &LatencyHistogram) -> Result<()> {
        self.histogram
            .add(&other.histogram)
            .map_err(|e| anyhow::anyhow!("Failed to merge histograms: {}", e))?;
        Ok(())
    }

    /// Reset the histogram to empty state
    ///
    /// Clears all recorded samples. This is useful for resetting statistics
    /// between test phases.
    pub fn reset(&mut self) {
        self.histogram.reset();
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}
