// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2024 Rust Nostr Developers
// Distributed under the MIT software license

#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

//! Vanity nostr public keys
//!
//! Brute-force search of secp256k1 key pairs whose `npub` starts with a chosen bech32 prefix.
//!
//! The prefix is compiled once into a `(mask, value)` pair over the leading 8 bytes of the
//! public key x-coordinate ([`PrefixConstraint`]), so workers never encode while searching:
//! bech32 rendering only happens when a match is reported.

pub use secp256k1;

pub mod codec;
mod error;
pub mod key;
pub mod options;
pub mod prefix;
pub mod search;
pub mod sync;
pub mod worker;

pub use self::error::Error;
pub use self::key::{
    CompressedPublicKey, KeyDerivation, KeyMutator, PrivateKey, Secp256k1Derivation,
};
pub use self::options::VanityOptions;
pub use self::prefix::PrefixConstraint;
pub use self::search::{Progress, SearchEvent, SearchHandle, VanitySearch};
pub use self::sync::{AttemptCounter, CancellationToken};
pub use self::worker::{MatchResult, Worker};

/// Result
pub type Result<T, E = Error> = std::result::Result<T, E>;
