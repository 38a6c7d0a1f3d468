//! Compact text encoding for small integers.
//!
//! Each value in `0..64` maps to exactly one printable character.
//! Weight vectors travel to clients in this form and allow-lists
//! arrive in it.

use crate::error::CodecError;

/// Symbol order is part of the wire contract. Never reorder.
pub const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Encode one value as its alphabet character.
pub fn encode_value(value: usize) -> Result<char, CodecError> {
    ALPHABET
        .get(value)
        .map(|&b| char::from(b))
        .ok_or(CodecError::OutOfRange {
            value,
            len: ALPHABET.len(),
        })
}

/// Decode one alphabet character back to its value.
pub fn decode_char(c: char) -> Result<usize, CodecError> {
    match c {
        'A'..='Z' => Ok(c as usize - 'A' as usize),
        'a'..='z' => Ok(c as usize - 'a' as usize + 26),
        '0'..='9' => Ok(c as usize - '0' as usize + 52),
        '+' => Ok(62),
        '/' => Ok(63),
        _ => Err(CodecError::UnknownCharacter(c)),
    }
}

pub fn encode<I>(values: I) -> Result<String, CodecError>
where
    I: IntoIterator<Item = usize>,
{
    values.into_iter().map(encode_value).collect()
}

pub fn decode(text: &str) -> Result<Vec<usize>, CodecError> {
    text.chars().map(decode_char).collect()
}
