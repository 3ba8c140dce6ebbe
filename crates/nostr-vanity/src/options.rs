// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2024 Rust Nostr Developers
// Distributed under the MIT software license

//! Search options

use std::num::NonZeroUsize;
use std::time::Duration;

/// Default interval between two progress reports
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(30);
const MIN_REPORT_INTERVAL: Duration = Duration::from_millis(1);
/// Default number of attempts a worker counts locally before publishing them
pub const DEFAULT_BATCH_SIZE: u64 = 1000;

/// Search options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VanityOptions {
    threads: Option<NonZeroUsize>,
    report_interval: Duration,
    batch_size: u64,
    max_matches: Option<NonZeroUsize>,
}

impl Default for VanityOptions {
    fn default() -> Self {
        Self {
            threads: None,
            report_interval: DEFAULT_REPORT_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
            max_matches: None,
        }
    }
}

impl VanityOptions {
    /// Create new (default) [`VanityOptions`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of workers (default: one per hardware thread)
    pub fn threads(self, threads: usize) -> Self {
        Self {
            threads: NonZeroUsize::new(threads),
            ..self
        }
    }

    /// Interval between progress reports (min 1 ms)
    pub fn report_interval(self, interval: Duration) -> Self {
        Self {
            report_interval: interval.max(MIN_REPORT_INTERVAL),
            ..self
        }
    }

    /// Attempts counted locally by a worker before publishing them (min 1)
    pub fn batch_size(self, batch_size: u64) -> Self {
        Self {
            batch_size: batch_size.max(1),
            ..self
        }
    }

    /// Stop the search after `max` matches. `0` means never stop.
    pub fn max_matches(self, max: usize) -> Self {
        Self {
            max_matches: NonZeroUsize::new(max),
            ..self
        }
    }

    /// Number of workers to spawn
    pub fn get_threads(&self) -> usize {
        match self.threads {
            Some(threads) => threads.get(),
            None => num_cpus::get().max(1),
        }
    }

    #[inline]
    pub(crate) fn get_report_interval(&self) -> Duration {
        self.report_interval
    }

    #[inline]
    pub(crate) fn get_batch_size(&self) -> u64 {
        self.batch_size
    }

    #[inline]
    pub(crate) fn get_max_matches(&self) -> Option<usize> {
        self.max_matches.map(NonZeroUsize::get)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = VanityOptions::new();
        assert_eq!(opts.get_threads(), num_cpus::get().max(1));
        assert_eq!(opts.get_report_interval(), Duration::from_secs(30));
        assert_eq!(opts.get_batch_size(), 1000);
        assert_eq!(opts.get_max_matches(), None);
    }

    #[test]
    fn test_builder() {
        let opts = VanityOptions::new()
            .threads(3)
            .report_interval(Duration::from_millis(50))
            .batch_size(0)
            .max_matches(2);
        assert_eq!(opts.get_threads(), 3);
        assert_eq!(opts.get_report_interval(), Duration::from_millis(50));
        assert_eq!(opts.get_batch_size(), 1);
        assert_eq!(opts.get_max_matches(), Some(2));

        // Zero falls back to the default
        assert_eq!(opts.threads(0).get_threads(), num_cpus::get().max(1));
    }
}
