// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2024 Rust Nostr Developers
// Distributed under the MIT software license

use core::fmt;
use std::io;

use crate::prefix;

/// Vanity search error
#[derive(Debug)]
pub enum Error {
    /// Prefix error
    Prefix(prefix::Error),
    /// Impossible to seed a worker RNG from the OS
    Entropy(String),
    /// Impossible to spawn a worker thread
    Spawn(io::Error),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix(e) => write!(f, "{e}"),
            Self::Entropy(e) => write!(f, "Entropy: {e}"),
            Self::Spawn(e) => write!(f, "Impossible to spawn worker thread: {e}"),
        }
    }
}

impl From<prefix::Error> for Error {
    fn from(e: prefix::Error) -> Self {
        Self::Prefix(e)
    }
}
