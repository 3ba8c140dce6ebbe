// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2024 Rust Nostr Developers
// Distributed under the MIT software license

//! Bech32 word codec
//!
//! Maps bytes to the 32-symbol bech32 alphabet and back, 5 bits per symbol.
//! Only the data-word mapping is implemented: no human-readable part, no checksum.
//!
//! <https://github.com/bitcoin/bips/blob/master/bip-0173.mediawiki>

use core::fmt;

/// Bech32 charset, indexed by word value
pub const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Bits carried by a single word
pub const WORD_BITS: usize = 5;

const WORD_MASK: u32 = 0x1f;

/// Reverse lookup: ASCII -> word value, `-1` when not in [`CHARSET`]
const CHARSET_REV: [i8; 128] = {
    let mut rev = [-1i8; 128];
    let mut i = 0;
    while i < CHARSET.len() {
        rev[CHARSET[i] as usize] = i as i8;
        i += 1;
    }
    rev
};

/// Codec error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Char is not part of the bech32 charset
    InvalidChar {
        /// Char
        c: char,
        /// Char index
        index: usize,
    },
    /// Leftover bits are too many or not zero
    InvalidPadding,
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChar { c, index } => {
                write!(f, "Invalid character '{c}' at index {index} (not bech32)")
            }
            Self::InvalidPadding => write!(f, "Invalid padding"),
        }
    }
}

/// Get the word value of a bech32 char.
///
/// Uppercase chars are rejected, as well as `1`, `b`, `i` and `o`.
#[inline]
pub fn word(c: char) -> Option<u8> {
    if !c.is_ascii() {
        return None;
    }
    match CHARSET_REV[c as usize] {
        -1 => None,
        w => Some(w as u8),
    }
}

/// Map every char of `text` to its word value
pub fn words<S>(text: S) -> Result<Vec<u8>, Error>
where
    S: AsRef<str>,
{
    text.as_ref()
        .chars()
        .enumerate()
        .map(|(index, c)| word(c).ok_or(Error::InvalidChar { c, index }))
        .collect()
}

/// Number of chars produced by [`encode`] for `len` bytes
#[inline]
pub const fn encoded_len(len: usize) -> usize {
    (len * 8).div_ceil(WORD_BITS)
}

/// Encode bytes as bech32 words (MSB first, last word zero-padded)
pub fn encode<T>(data: T) -> String
where
    T: AsRef<[u8]>,
{
    let bytes: &[u8] = data.as_ref();
    let mut text: String = String::with_capacity(encoded_len(bytes.len()));

    let mut acc: u32 = 0;
    let mut bits: usize = 0;

    for byte in bytes.iter() {
        acc = (acc << 8) | *byte as u32;
        bits += 8;

        while bits >= WORD_BITS {
            bits -= WORD_BITS;
            text.push(CHARSET[((acc >> bits) & WORD_MASK) as usize] as char);
        }

        // Keep only the bits not emitted yet
        acc &= (1 << bits) - 1;
    }

    if bits > 0 {
        text.push(CHARSET[((acc << (WORD_BITS - bits)) & WORD_MASK) as usize] as char);
    }

    text
}

/// Decode bech32 words back to bytes.
///
/// Fails if a char is not bech32 or if the trailing bits can't be the zero padding of [`encode`].
pub fn decode<S>(text: S) -> Result<Vec<u8>, Error>
where
    S: AsRef<str>,
{
    let words: Vec<u8> = words(text)?;
    let mut bytes: Vec<u8> = Vec::with_capacity(words.len() * WORD_BITS / 8);

    let mut acc: u32 = 0;
    let mut bits: usize = 0;

    for word in words.into_iter() {
        acc = (acc << WORD_BITS) | word as u32;
        bits += WORD_BITS;

        if bits >= 8 {
            bits -= 8;
            bytes.push((acc >> bits) as u8);
        }

        acc &= (1 << bits) - 1;
    }

    if bits >= WORD_BITS || acc != 0 {
        return Err(Error::InvalidPadding);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use bech32::{ByteIterExt, Fe32};

    use super::*;

    fn reference_encode(data: &[u8]) -> String {
        data.iter().copied().bytes_to_fes().map(Fe32::to_char).collect()
    }

    #[test]
    fn test_charset_reverse_lookup() {
        for (i, c) in CHARSET.iter().enumerate() {
            assert_eq!(word(*c as char), Some(i as u8));
        }
    }

    #[test]
    fn test_excluded_chars() {
        for c in ['b', 'i', 'o', '1', 'A', 'Q', 'L', '-', ' ', 'é'] {
            assert_eq!(word(c), None, "{c}");
        }
    }

    #[test]
    fn test_words_invalid_char() {
        assert_eq!(words("qpzb").unwrap_err(), Error::InvalidChar { c: 'b', index: 3 });
        assert_eq!(words("Qp").unwrap_err(), Error::InvalidChar { c: 'Q', index: 0 });
        assert_eq!(words("q0p").unwrap(), vec![0, 15, 1]);
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode(b""), "");
        assert_eq!(encode([0x3a]), "8g");
        assert_eq!(encode([0xff]), "lu");
        assert_eq!(encode([0x00; 5]), "qqqqqqqq");
    }

    #[test]
    fn test_encoded_len() {
        assert_eq!(encoded_len(0), 0);
        assert_eq!(encoded_len(1), 2);
        assert_eq!(encoded_len(5), 8);
        assert_eq!(encoded_len(16), 26);
        assert_eq!(encoded_len(32), 52);
    }

    #[test]
    fn test_encode_matches_reference() {
        let data: Vec<u8> = (0u8..=255).map(|b| b.wrapping_mul(167).wrapping_add(13)).collect();
        for len in 0..=data.len().min(40) {
            let chunk: &[u8] = &data[..len];
            let text: String = encode(chunk);
            assert_eq!(text.len(), encoded_len(len));
            assert_eq!(text, reference_encode(chunk));
        }
    }

    #[test]
    fn test_decode_round_trip() {
        let data = hex::decode("7e7e9c42a91bfef19fa929e5fda1b72e0ebc1a4c1141673e2794234d86addf4e")
            .unwrap();
        for len in 0..=data.len() {
            assert_eq!(decode(encode(&data[..len])).unwrap(), &data[..len]);
        }
    }

    #[test]
    fn test_decode_invalid_padding() {
        assert_eq!(decode("lq").unwrap(), vec![0xf8]);
        assert_eq!(decode("ll").unwrap_err(), Error::InvalidPadding);
        // 15 bits: one byte plus a whole padding word
        assert_eq!(decode("qqq").unwrap_err(), Error::InvalidPadding);
        assert_eq!(decode("qo").unwrap_err(), Error::InvalidChar { c: 'o', index: 1 });
    }
}
