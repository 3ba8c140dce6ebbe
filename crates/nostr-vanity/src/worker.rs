// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2024 Rust Nostr Developers
// Distributed under the MIT software license

//! Search worker
//!
//! A worker owns its RNG, candidate key and derivation context. It derives, tests, mutates one
//! word of the key and starts again, until cancelled.

use core::fmt;
use std::sync::mpsc::SyncSender;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::Error;
use crate::key::{
    CompressedPublicKey, KeyDerivation, KeyMutator, PrivateKey, Secp256k1Derivation,
};
use crate::prefix::PrefixConstraint;
use crate::sync::{AttemptCounter, CancellationToken};

/// Human readable part rendered before the public key words
pub const PUBLIC_KEY_TAG: &str = "npub1";

/// Key pair satisfying a [`PrefixConstraint`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    worker: usize,
    public_key: CompressedPublicKey,
    private_key: PrivateKey,
}

impl MatchResult {
    /// ID of the worker that found the match
    pub fn worker(&self) -> usize {
        self.worker
    }

    /// Public key
    pub fn public_key(&self) -> &CompressedPublicKey {
        &self.public_key
    }

    /// Private key
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }
}

/// `npub1<words>... <hex private key>`
impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{PUBLIC_KEY_TAG}{}... {}",
            self.public_key.to_bech32_head(),
            self.private_key.to_hex()
        )
    }
}

/// Search worker
pub struct Worker<D = Secp256k1Derivation, R = StdRng> {
    id: usize,
    constraint: Arc<PrefixConstraint>,
    counter: AttemptCounter,
    derivation: D,
    rng: R,
    key: PrivateKey,
    mutator: KeyMutator,
    batch_size: u64,
    pending: u64,
}

impl<D, R> fmt::Debug for Worker<D, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("constraint", &self.constraint)
            .field("batch_size", &self.batch_size)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl Worker {
    /// New worker with a secp256k1 context and an RNG seeded from the OS
    pub fn new(
        id: usize,
        constraint: Arc<PrefixConstraint>,
        counter: AttemptCounter,
        batch_size: u64,
    ) -> Result<Self, Error> {
        let rng: StdRng = StdRng::try_from_os_rng().map_err(|e| Error::Entropy(e.to_string()))?;
        Ok(Self::with_parts(
            id,
            constraint,
            counter,
            Secp256k1Derivation::new(),
            rng,
            batch_size,
        ))
    }
}

impl<D, R> Worker<D, R>
where
    D: KeyDerivation,
    R: RngCore,
{
    /// New worker with custom derivation and RNG
    pub fn with_parts(
        id: usize,
        constraint: Arc<PrefixConstraint>,
        counter: AttemptCounter,
        derivation: D,
        mut rng: R,
        batch_size: u64,
    ) -> Self {
        let key: PrivateKey = PrivateKey::random(&mut rng);
        Self {
            id,
            constraint,
            counter,
            derivation,
            rng,
            key,
            mutator: KeyMutator::new(),
            batch_size: batch_size.max(1),
            pending: 0,
        }
    }

    /// Worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Candidate tested by the next [`Worker::step`]
    pub fn private_key(&self) -> &PrivateKey {
        &self.key
    }

    /// Attempts not yet published to the counter
    pub fn pending(&self) -> u64 {
        self.pending
    }

    /// Run a single attempt
    ///
    /// An invalid scalar just skips the test: the key is mutated and counted anyway.
    pub fn step(&mut self) -> Option<MatchResult> {
        let found: Option<MatchResult> = match self.derivation.derive(&self.key) {
            Some(public_key) if self.constraint.matches(public_key.x_only()) => {
                Some(MatchResult {
                    worker: self.id,
                    public_key,
                    private_key: self.key,
                })
            }
            _ => None,
        };

        self.mutator.mutate(&mut self.key, &mut self.rng);

        self.pending += 1;
        if self.pending == self.batch_size {
            self.counter.add(self.batch_size);
            self.pending = 0;
        }

        found
    }

    /// Publish the attempts of the current partial batch
    pub fn flush(&mut self) {
        if self.pending > 0 {
            self.counter.add(self.pending);
            self.pending = 0;
        }
    }

    /// Search until `token` is cancelled or `matches` is disconnected.
    ///
    /// Blocks on `matches` while it is full.
    pub fn run(mut self, token: &CancellationToken, matches: &SyncSender<MatchResult>) {
        tracing::debug!(worker = self.id, "Worker started");

        while !token.is_cancelled() {
            if let Some(found) = self.step() {
                if matches.send(found).is_err() {
                    tracing::debug!(worker = self.id, "Match receiver dropped");
                    break;
                }
            }
        }

        self.flush();

        tracing::debug!(worker = self.id, "Worker exited");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::mpsc;
    use std::thread;

    use super::*;
    use crate::codec;
    use crate::key::X_ONLY_PUBLIC_KEY_SIZE;

    /// Replays a fixed stream of derivation outcomes, whatever the key
    struct Replay(VecDeque<Option<CompressedPublicKey>>);

    impl Replay {
        fn new<I>(heads: I) -> Self
        where
            I: IntoIterator<Item = Option<u8>>,
        {
            Self(
                heads
                    .into_iter()
                    .map(|head| {
                        head.map(|head| {
                            let mut x_only = [0x5a; X_ONLY_PUBLIC_KEY_SIZE];
                            x_only[0] = head;
                            CompressedPublicKey::from_x_only(x_only)
                        })
                    })
                    .collect(),
            )
        }
    }

    impl KeyDerivation for Replay {
        fn derive(&mut self, _private_key: &PrivateKey) -> Option<CompressedPublicKey> {
            self.0.pop_front().flatten()
        }
    }

    fn worker<D>(constraint: PrefixConstraint, derivation: D, batch_size: u64) -> Worker<D, StdRng>
    where
        D: KeyDerivation,
    {
        Worker::with_parts(
            0,
            Arc::new(constraint),
            AttemptCounter::new(),
            derivation,
            StdRng::seed_from_u64(42),
            batch_size,
        )
    }

    #[test]
    fn test_matches_top_five_bits_only() {
        let constraint =
            PrefixConstraint::from_parts(0xf800000000000000, 0x5000000000000000).unwrap();
        let heads = [0x50, 0x57, 0x58, 0x4f, 0x52, 0xd0];
        let mut worker = worker(constraint, Replay::new(heads.map(Some)), 1000);

        let found: Vec<Option<MatchResult>> = heads.iter().map(|_| worker.step()).collect();
        let matched: Vec<bool> = found.iter().map(Option::is_some).collect();
        assert_eq!(matched, vec![true, true, false, false, true, false]);

        for result in found.into_iter().flatten() {
            let head = result.public_key().to_bech32_head();
            assert_eq!(head.chars().next(), Some('2'));
            assert_eq!(codec::word('2'), Some(0b01010));
            assert!(result.to_string().starts_with("npub12"));
        }
    }

    #[test]
    fn test_match_reports_tested_key() {
        let constraint = PrefixConstraint::compile("q").unwrap();
        let mut worker = worker(constraint, Replay::new([Some(0x00)]), 1000);

        let tested: PrivateKey = *worker.private_key();
        let result = worker.step().unwrap();
        assert_eq!(result.private_key(), &tested);
        assert_ne!(worker.private_key(), &tested);

        let line = result.to_string();
        let (npub, secret) = line.split_once("... ").unwrap();
        assert_eq!(npub.len(), PUBLIC_KEY_TAG.len() + 26);
        assert_eq!(secret, tested.to_hex());
    }

    #[test]
    fn test_derivation_failure_is_skipped() {
        let constraint = PrefixConstraint::compile("q").unwrap();
        let mut worker = worker(constraint, Replay::new([None, None, Some(0x00)]), 1000);

        let first: PrivateKey = *worker.private_key();
        assert!(worker.step().is_none());
        assert_ne!(worker.private_key(), &first);
        assert!(worker.step().is_none());
        assert!(worker.step().is_some());
        assert_eq!(worker.pending(), 3);
    }

    #[test]
    fn test_batched_counting() {
        let constraint = PrefixConstraint::compile("q").unwrap();
        let mut worker = worker(constraint, Replay::new([]), 1000);
        let counter: AttemptCounter = worker.counter.clone();

        for _ in 0..999 {
            worker.step();
        }
        assert_eq!(counter.load(), 0);

        worker.step();
        assert_eq!(counter.load(), 1000);
        assert_eq!(worker.pending(), 0);

        for _ in 0..1500 {
            worker.step();
        }
        assert_eq!(counter.load(), 2000);

        worker.flush();
        assert_eq!(counter.load(), 2500);
    }

    #[test]
    fn test_run_until_cancelled() {
        let constraint = Arc::new(PrefixConstraint::compile("q").unwrap());
        let counter = AttemptCounter::new();
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::sync_channel(4);

        let worker = Worker::new(0, constraint.clone(), counter.clone(), 100).unwrap();
        let handle = {
            let token = token.clone();
            thread::spawn(move || worker.run(&token, &tx))
        };

        // One key out of 32 starts with `q`
        let found: MatchResult = rx.recv().unwrap();
        token.cancel();

        // Unblock a pending send, until the worker drops its sender
        for _ in rx.iter() {}
        handle.join().unwrap();

        assert!(constraint.matches(found.public_key().x_only()));
        assert!(found.public_key().to_bech32_head().starts_with('q'));

        let mut derivation = Secp256k1Derivation::new();
        assert_eq!(derivation.derive(found.private_key()), Some(*found.public_key()));

        assert!(counter.load() >= 1);
        assert!(rx.recv().is_err());
    }
}
