// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2024 Rust Nostr Developers
// Distributed under the MIT software license

//! Shared state between workers and coordinator

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Attempts counter, shared by all the workers of a search
///
/// Workers add in batches; readers only take snapshots.
#[derive(Debug, Clone, Default)]
pub struct AttemptCounter {
    total: Arc<AtomicU64>,
}

impl AttemptCounter {
    /// New counter, starting from `0`
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `n` attempts
    #[inline]
    pub fn add(&self, n: u64) {
        self.total.fetch_add(n, Ordering::Relaxed);
    }

    /// Snapshot of the total
    #[inline]
    pub fn load(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

/// Cancellation token
///
/// Cloned into every worker. Once cancelled, stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// New token
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if cancelled
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
