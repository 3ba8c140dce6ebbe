// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2024 Rust Nostr Developers
// Distributed under the MIT software license

//! Prefix constraint
//!
//! Compiles a bech32 prefix into a `(mask, value)` pair over the leading 8 bytes of a public key
//! x-coordinate, so a candidate can be tested with one `and` and one comparison.
//!
//! The 8 leading bytes are always read as a big-endian `u64`: the first byte of the key is the
//! most significant byte of the register, whatever the host endianness.

use core::fmt;
use core::str::FromStr;

use crate::codec::{self, WORD_BITS};

/// Width of the comparison register, in bytes
pub const REGISTER_BYTES: usize = 8;

/// Longest prefix that fits the register: `ceil(12 * 5 / 8) = 8` bytes
pub const MAX_PREFIX_LEN: usize = (REGISTER_BYTES * 8) / WORD_BITS;

/// Prefix error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Empty prefix
    Empty,
    /// Char is not part of the bech32 charset
    InvalidChar {
        /// Char
        c: char,
        /// Char index
        index: usize,
    },
    /// Prefix needs more bytes than the comparison register holds
    TooLong {
        /// Prefix length, in chars
        len: usize,
    },
    /// Value has bits outside of the mask
    ValueOutsideMask {
        /// Mask
        mask: u64,
        /// Value
        value: u64,
    },
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Prefix search string is empty"),
            Self::InvalidChar { c, index } => write!(
                f,
                "Invalid character '{c}' at index {index} (not bech32)\nValid characters are: a-z 0-9 EXCLUDING b, i, o and 1"
            ),
            Self::TooLong { len } => write!(
                f,
                "Prefix search string is too long ({len} chars, {} bytes): at most {MAX_PREFIX_LEN} chars fit in the {REGISTER_BYTES} bytes compared per key",
                prefix_bytes(*len)
            ),
            Self::ValueOutsideMask { mask, value } => {
                write!(f, "Value {value:016x} has bits outside of mask {mask:016x}")
            }
        }
    }
}

/// Bytes touched by a prefix of `len` chars
#[inline]
pub const fn prefix_bytes(len: usize) -> usize {
    (len * WORD_BITS).div_ceil(8)
}

/// Read the comparison register from the leading bytes of a key.
///
/// Missing bytes (keys shorter than [`REGISTER_BYTES`]) read as zero.
#[inline]
pub fn head<T>(bytes: T) -> u64
where
    T: AsRef<[u8]>,
{
    let bytes: &[u8] = bytes.as_ref();
    let mut register = [0u8; REGISTER_BYTES];
    let len: usize = bytes.len().min(REGISTER_BYTES);
    register[..len].copy_from_slice(&bytes[..len]);
    u64::from_be_bytes(register)
}

/// Compiled prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixConstraint {
    mask: u64,
    value: u64,
    prefix: Option<String>,
}

impl PrefixConstraint {
    /// Compile a bech32 prefix
    pub fn compile<S>(prefix: S) -> Result<Self, Error>
    where
        S: Into<String>,
    {
        let prefix: String = prefix.into();

        let len: usize = prefix.chars().count();
        if len == 0 {
            return Err(Error::Empty);
        }

        if prefix_bytes(len) > REGISTER_BYTES {
            return Err(Error::TooLong { len });
        }

        let words: Vec<u8> = prefix
            .chars()
            .enumerate()
            .map(|(index, c)| codec::word(c).ok_or(Error::InvalidChar { c, index }))
            .collect::<Result<Vec<u8>, Error>>()?;

        // Left-align the bitstream in the register, zero padding on the right
        let bits: usize = len * WORD_BITS;
        let value: u64 = words
            .iter()
            .fold(0u64, |acc, word| (acc << WORD_BITS) | *word as u64)
            << (64 - bits);
        let mask: u64 = u64::MAX << (64 - bits);

        Ok(Self {
            mask,
            value,
            prefix: Some(prefix),
        })
    }

    /// Build from a raw `(mask, value)` pair
    pub fn from_parts(mask: u64, value: u64) -> Result<Self, Error> {
        if value & !mask != 0 {
            return Err(Error::ValueOutsideMask { mask, value });
        }

        Ok(Self {
            mask,
            value,
            prefix: None,
        })
    }

    /// Mask
    #[inline]
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Value
    #[inline]
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Source prefix, if compiled from one
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Number of leading bytes of the mask that are not zero
    pub fn len_bytes(&self) -> usize {
        REGISTER_BYTES - (self.mask.trailing_zeros() as usize / 8)
    }

    /// Test the comparison register
    #[inline]
    pub fn matches_head(&self, head: u64) -> bool {
        head & self.mask == self.value
    }

    /// Test the leading bytes of a public key x-coordinate
    #[inline]
    pub fn matches<T>(&self, x_only: T) -> bool
    where
        T: AsRef<[u8]>,
    {
        self.matches_head(head(x_only))
    }
}

impl FromStr for PrefixConstraint {
    type Err = Error;

    fn from_str(prefix: &str) -> Result<Self, Self::Err> {
        Self::compile(prefix)
    }
}

impl fmt::Display for PrefixConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mask={:016x} value={:016x}", self.mask, self.value)
    }
}
