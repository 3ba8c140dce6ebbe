// Copyright (c) 2021 Paul Miller
// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2024 Rust Nostr Developers
// Distributed under the MIT software license

//! Keys
//!
//! Candidate private keys, the mutation policy used between attempts and public key derivation.

use core::fmt;

use rand::RngCore;
use secp256k1::{Secp256k1, SecretKey, SignOnly};

use crate::codec;

/// Private key size, in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;
/// Compressed public key size, in bytes
pub const COMPRESSED_PUBLIC_KEY_SIZE: usize = 33;
/// x-coordinate size, in bytes
pub const X_ONLY_PUBLIC_KEY_SIZE: usize = 32;

/// Words composing a [`PrivateKey`]
pub const PRIVATE_KEY_WORDS: usize = PRIVATE_KEY_SIZE / 8;

/// x-only bytes rendered when reporting a match
pub const RENDERED_PUBLIC_KEY_BYTES: usize = 16;

/// Candidate private key
///
/// A 32-byte scalar kept as four `u64` words so a single word can be replaced cheaply.
/// The byte form is the big-endian concatenation of the words, word `0` first.
/// Validity (non-zero and below the curve order) is only checked on derivation.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PrivateKey {
    words: [u64; PRIVATE_KEY_WORDS],
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey").finish_non_exhaustive()
    }
}

impl PrivateKey {
    /// Construct from words
    #[inline]
    pub const fn from_words(words: [u64; PRIVATE_KEY_WORDS]) -> Self {
        Self { words }
    }

    /// Construct from big-endian bytes
    pub fn from_bytes(bytes: [u8; PRIVATE_KEY_SIZE]) -> Self {
        let mut words = [0u64; PRIVATE_KEY_WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            *word = u64::from_be_bytes(buf);
        }
        Self { words }
    }

    /// Draw every word from `rng`
    pub fn random<R>(rng: &mut R) -> Self
    where
        R: RngCore + ?Sized,
    {
        let mut words = [0u64; PRIVATE_KEY_WORDS];
        for word in words.iter_mut() {
            *word = rng.next_u64();
        }
        Self { words }
    }

    /// Words
    #[inline]
    pub fn words(&self) -> &[u64; PRIVATE_KEY_WORDS] {
        &self.words
    }

    /// Replace the word at `index`
    #[inline]
    pub fn set_word(&mut self, index: usize, word: u64) {
        self.words[index % PRIVATE_KEY_WORDS] = word;
    }

    /// Big-endian bytes
    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        let mut bytes = [0u8; PRIVATE_KEY_SIZE];
        for (chunk, word) in bytes.chunks_exact_mut(8).zip(self.words.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        bytes
    }

    /// Lowercase hex of [`PrivateKey::to_bytes`]
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Convert to a [`SecretKey`], failing if the scalar is zero or not below the curve order
    pub fn to_secret_key(&self) -> Result<SecretKey, secp256k1::Error> {
        SecretKey::from_slice(&self.to_bytes())
    }
}

/// Mutation policy applied between two attempts
///
/// Replaces exactly one word per step with a fresh draw, cycling through the words:
/// any four consecutive steps replace every word once. One 8-byte draw per attempt
/// instead of 32 is an amortization of the RNG cost, not a correctness requirement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyMutator {
    index: usize,
}

impl KeyMutator {
    /// New mutator, starting from word `0`
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the word replaced by the next [`KeyMutator::mutate`]
    #[inline]
    pub fn next_index(&self) -> usize {
        self.index
    }

    /// Replace one word of `key` and advance. Returns the replaced index.
    #[inline]
    pub fn mutate<R>(&mut self, key: &mut PrivateKey, rng: &mut R) -> usize
    where
        R: RngCore + ?Sized,
    {
        let index: usize = self.index;
        key.set_word(index, rng.next_u64());
        self.index = (index + 1) % PRIVATE_KEY_WORDS;
        index
    }
}

/// Compressed public key (parity tag + x-coordinate)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompressedPublicKey([u8; COMPRESSED_PUBLIC_KEY_SIZE]);

impl fmt::Debug for CompressedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompressedPublicKey({})", hex::encode(self.0))
    }
}

impl CompressedPublicKey {
    /// Construct from serialized bytes
    #[inline]
    pub const fn from_bytes(bytes: [u8; COMPRESSED_PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Construct from an x-coordinate, with an even parity tag
    pub fn from_x_only(x_only: [u8; X_ONLY_PUBLIC_KEY_SIZE]) -> Self {
        let mut bytes = [0x02; COMPRESSED_PUBLIC_KEY_SIZE];
        bytes[1..].copy_from_slice(&x_only);
        Self(bytes)
    }

    /// Serialized bytes
    #[inline]
    pub fn as_bytes(&self) -> &[u8; COMPRESSED_PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Parity tag (`0x02` or `0x03`)
    #[inline]
    pub fn parity(&self) -> u8 {
        self.0[0]
    }

    /// x-coordinate, the only part taking part in matching and rendering
    #[inline]
    pub fn x_only(&self) -> &[u8] {
        &self.0[1..]
    }

    /// Bech32 words of the first [`RENDERED_PUBLIC_KEY_BYTES`] x-only bytes
    pub fn to_bech32_head(&self) -> String {
        codec::encode(&self.x_only()[..RENDERED_PUBLIC_KEY_BYTES])
    }
}

impl From<secp256k1::PublicKey> for CompressedPublicKey {
    fn from(public_key: secp256k1::PublicKey) -> Self {
        Self(public_key.serialize())
    }
}

/// Private to public key derivation
pub trait KeyDerivation {
    /// Derive the public key of `private_key`.
    ///
    /// Returns `None` if the private key is not a valid scalar.
    fn derive(&mut self, private_key: &PrivateKey) -> Option<CompressedPublicKey>;
}

/// secp256k1 derivation, with its own signing context
pub struct Secp256k1Derivation {
    secp: Secp256k1<SignOnly>,
}

impl fmt::Debug for Secp256k1Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secp256k1Derivation").finish()
    }
}

impl Default for Secp256k1Derivation {
    fn default() -> Self {
        Self::new()
    }
}

impl Secp256k1Derivation {
    /// Create a new signing context
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::signing_only(),
        }
    }
}

impl KeyDerivation for Secp256k1Derivation {
    #[inline]
    fn derive(&mut self, private_key: &PrivateKey) -> Option<CompressedPublicKey> {
        let secret_key: SecretKey = private_key.to_secret_key().ok()?;
        Some(secret_key.public_key(&self.secp).into())
    }
}
