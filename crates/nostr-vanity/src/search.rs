// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2024 Rust Nostr Developers
// Distributed under the MIT software license

//! Search coordinator
//!
//! Spawns one [`Worker`] per thread, all sharing the same [`PrefixConstraint`],
//! [`AttemptCounter`] and [`CancellationToken`], then turns matches and the report timer into a
//! stream of [`SearchEvent`]s.

use core::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::Error;
use crate::options::VanityOptions;
use crate::prefix::PrefixConstraint;
use crate::sync::{AttemptCounter, CancellationToken};
use crate::worker::{MatchResult, Worker};

/// Matches buffered between the workers and the consumer. Workers block once it is full.
pub const MATCH_QUEUE_CAPACITY: usize = 256;

/// Throughput snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Cumulative attempts
    pub attempts: u64,
    /// Elapsed time since the search started
    pub elapsed: Duration,
}

impl Progress {
    /// Attempts per second
    pub fn rate(&self) -> f64 {
        let secs: f64 = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.attempts as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tested {} keys ({}/s)", self.attempts, self.rate() as u64)
    }
}

/// Search event
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// A worker found a match
    Match(MatchResult),
    /// Periodic throughput report
    Progress(Progress),
}

/// Vanity search
#[derive(Debug, Clone)]
pub struct VanitySearch {
    constraint: Arc<PrefixConstraint>,
    opts: VanityOptions,
}

impl VanitySearch {
    /// New search for an already compiled constraint
    pub fn new(constraint: PrefixConstraint, opts: VanityOptions) -> Self {
        Self {
            constraint: Arc::new(constraint),
            opts,
        }
    }

    /// Compile `prefix` and build the search
    pub fn compile<S>(prefix: S, opts: VanityOptions) -> Result<Self, Error>
    where
        S: Into<String>,
    {
        let constraint: PrefixConstraint = PrefixConstraint::compile(prefix)?;
        Ok(Self::new(constraint, opts))
    }

    /// Constraint shared by the workers
    pub fn constraint(&self) -> &PrefixConstraint {
        &self.constraint
    }

    /// Number of workers [`VanitySearch::spawn`] starts
    pub fn threads(&self) -> usize {
        self.opts.get_threads()
    }

    /// Start the workers
    pub fn spawn(&self) -> Result<SearchHandle, Error> {
        let threads: usize = self.threads();
        let counter: AttemptCounter = AttemptCounter::new();
        let token: CancellationToken = CancellationToken::new();
        let (tx, rx) = mpsc::sync_channel::<MatchResult>(MATCH_QUEUE_CAPACITY);

        let workers: Result<Vec<JoinHandle<()>>, Error> = (0..threads)
            .map(|id| self.spawn_worker(id, &counter, &token, &tx))
            .collect();

        let workers: Vec<JoinHandle<()>> = match workers {
            Ok(workers) => workers,
            Err(e) => {
                // Stop the workers already running
                token.cancel();
                return Err(e);
            }
        };

        tracing::info!(
            threads,
            prefix = ?self.constraint.prefix(),
            constraint = %self.constraint,
            "Vanity search started"
        );

        let started: Instant = Instant::now();
        let report_interval: Duration = self.opts.get_report_interval();

        Ok(SearchHandle {
            matches: rx,
            workers,
            counter,
            token,
            started,
            next_report: started + report_interval,
            report_interval,
            max_matches: self.opts.get_max_matches(),
            found: 0,
        })
    }

    fn spawn_worker(
        &self,
        id: usize,
        counter: &AttemptCounter,
        token: &CancellationToken,
        tx: &SyncSender<MatchResult>,
    ) -> Result<JoinHandle<()>, Error> {
        let worker: Worker = Worker::new(
            id,
            self.constraint.clone(),
            counter.clone(),
            self.opts.get_batch_size(),
        )?;
        let token: CancellationToken = token.clone();
        let tx: SyncSender<MatchResult> = tx.clone();

        thread::Builder::new()
            .name(format!("vanity-worker-{id}"))
            .spawn(move || worker.run(&token, &tx))
            .map_err(Error::Spawn)
    }
}

/// Running search
///
/// Runs until cancelled, either explicitly or once `max_matches` matches have been yielded.
#[derive(Debug)]
pub struct SearchHandle {
    matches: Receiver<MatchResult>,
    workers: Vec<JoinHandle<()>>,
    counter: AttemptCounter,
    token: CancellationToken,
    started: Instant,
    next_report: Instant,
    report_interval: Duration,
    max_matches: Option<usize>,
    found: usize,
}

impl SearchHandle {
    /// Number of workers
    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Matches yielded so far
    pub fn found(&self) -> usize {
        self.found
    }

    /// Current throughput
    pub fn progress(&self) -> Progress {
        Progress {
            attempts: self.counter.load(),
            elapsed: self.started.elapsed(),
        }
    }

    /// Shared attempts counter
    pub fn counter(&self) -> &AttemptCounter {
        &self.counter
    }

    /// Token observed by the workers
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Ask the workers to stop
    pub fn cancel(&self) {
        self.token.cancel();
    }

    fn limit_reached(&self) -> bool {
        matches!(self.max_matches, Some(max) if self.found >= max)
    }

    /// Wait for the next match or progress report.
    ///
    /// A due report is yielded before any queued match.
    /// Returns `None` once every worker has stopped.
    pub fn next_event(&mut self) -> Option<SearchEvent> {
        loop {
            let now: Instant = Instant::now();

            if now >= self.next_report {
                self.next_report += self.report_interval;
                if self.next_report <= now {
                    self.next_report = now + self.report_interval;
                }
                return Some(SearchEvent::Progress(self.progress()));
            }

            match self.matches.recv_timeout(self.next_report - now) {
                Ok(found) => {
                    // Drain what was found while the workers were stopping
                    if self.limit_reached() {
                        continue;
                    }

                    self.found += 1;

                    if self.limit_reached() {
                        tracing::info!(found = self.found, "Max matches reached, stopping search");
                        self.token.cancel();
                    }

                    return Some(SearchEvent::Match(found));
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Cancel, wait for the workers and return the final throughput
    pub fn join(self) -> Progress {
        self.token.cancel();

        // Workers blocked on a full queue see the disconnection
        drop(self.matches);

        for handle in self.workers.into_iter() {
            if handle.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }

        Progress {
            attempts: self.counter.load(),
            elapsed: self.started.elapsed(),
        }
    }
}

impl Iterator for SearchHandle {
    type Item = SearchEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event()
    }
}
