// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Byte Buffer
//!
//! `Data` is the byte sequence every other module speaks in: payloads,
//! advert fragments, keys and ciphertext. Numeric fields are always
//! big-endian. Accessors return `None` rather than panicking when a read
//! would run past the end of the buffer.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use half::f16;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Byte buffer error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(String),

    #[error("String of {length} bytes does not fit a {encoding:?} length prefix")]
    StringTooLong {
        length: usize,
        encoding: StringLengthEncoding,
    },
}

/// Width of the length prefix written before an encoded string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringLengthEncoding {
    U8,
    U16,
    U32,
    U64,
}

impl StringLengthEncoding {
    fn width(self) -> usize {
        match self {
            StringLengthEncoding::U8 => 1,
            StringLengthEncoding::U16 => 2,
            StringLengthEncoding::U32 => 4,
            StringLengthEncoding::U64 => 8,
        }
    }

    fn max_length(self) -> u64 {
        match self {
            StringLengthEncoding::U8 => u8::MAX as u64,
            StringLengthEncoding::U16 => u16::MAX as u64,
            StringLengthEncoding::U32 => u32::MAX as u64,
            StringLengthEncoding::U64 => u64::MAX,
        }
    }
}

/// Immutable-by-convention byte buffer with content equality.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Data {
    bytes: Vec<u8>,
}

impl Data {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Data { bytes: Vec::new() }
    }

    /// Creates a buffer from raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Data {
            bytes: bytes.into(),
        }
    }

    /// Creates a buffer of `length` zero bytes.
    pub fn zeros(length: usize) -> Self {
        Self::repeating(0, length)
    }

    /// Creates a buffer of `length` copies of `byte`.
    pub fn repeating(byte: u8, length: usize) -> Self {
        Data {
            bytes: vec![byte; length],
        }
    }

    /// Decodes a hex string (either case).
    pub fn from_hex(hex_string: &str) -> Result<Self, DataError> {
        hex::decode(hex_string)
            .map(Data::from_bytes)
            .map_err(|e| DataError::InvalidHex(e.to_string()))
    }

    /// Decodes a standard base64 string.
    pub fn from_base64(encoded: &str) -> Result<Self, DataError> {
        BASE64
            .decode(encoded)
            .map(Data::from_bytes)
            .map_err(|e| DataError::InvalidBase64(e.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    // ------------------------------------------------------------
    // Append
    // ------------------------------------------------------------

    pub fn append(&mut self, other: &Data) {
        self.bytes.extend_from_slice(&other.bytes);
    }

    pub fn append_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn append_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub fn append_u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn append_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn append_u64(&mut self, value: u64) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn append_i8(&mut self, value: i8) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn append_i16(&mut self, value: i16) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn append_i32(&mut self, value: i32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn append_i64(&mut self, value: i64) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends `value` as an IEEE 754 half-precision float.
    pub fn append_f16(&mut self, value: f32) {
        self.append_u16(f32_to_f16_bits(value));
    }

    /// Appends a UTF-8 string preceded by its byte length.
    pub fn append_string(
        &mut self,
        value: &str,
        encoding: StringLengthEncoding,
    ) -> Result<(), DataError> {
        let length = value.len();
        if length as u64 > encoding.max_length() {
            return Err(DataError::StringTooLong { length, encoding });
        }
        match encoding {
            StringLengthEncoding::U8 => self.append_u8(length as u8),
            StringLengthEncoding::U16 => self.append_u16(length as u16),
            StringLengthEncoding::U32 => self.append_u32(length as u32),
            StringLengthEncoding::U64 => self.append_u64(length as u64),
        }
        self.append_bytes(value.as_bytes());
        Ok(())
    }

    // ------------------------------------------------------------
    // Read
    // ------------------------------------------------------------

    fn array_at<const N: usize>(&self, index: usize) -> Option<[u8; N]> {
        let end = index.checked_add(N)?;
        self.bytes.get(index..end)?.try_into().ok()
    }

    pub fn u8_at(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).copied()
    }

    pub fn u16_at(&self, index: usize) -> Option<u16> {
        self.array_at(index).map(u16::from_be_bytes)
    }

    pub fn u32_at(&self, index: usize) -> Option<u32> {
        self.array_at(index).map(u32::from_be_bytes)
    }

    pub fn u64_at(&self, index: usize) -> Option<u64> {
        self.array_at(index).map(u64::from_be_bytes)
    }

    pub fn i8_at(&self, index: usize) -> Option<i8> {
        self.array_at(index).map(i8::from_be_bytes)
    }

    pub fn i16_at(&self, index: usize) -> Option<i16> {
        self.array_at(index).map(i16::from_be_bytes)
    }

    pub fn i32_at(&self, index: usize) -> Option<i32> {
        self.array_at(index).map(i32::from_be_bytes)
    }

    pub fn i64_at(&self, index: usize) -> Option<i64> {
        self.array_at(index).map(i64::from_be_bytes)
    }

    /// Reads a half-precision float and widens it to `f32`.
    pub fn f16_at(&self, index: usize) -> Option<f32> {
        self.u16_at(index).map(f16_bits_to_f32)
    }

    /// Reads a length-prefixed UTF-8 string.
    ///
    /// Returns the string and the offset of the first byte after it.
    pub fn string_at(&self, index: usize, encoding: StringLengthEncoding) -> Option<(String, usize)> {
        let length = match encoding {
            StringLengthEncoding::U8 => self.u8_at(index)? as u64,
            StringLengthEncoding::U16 => self.u16_at(index)? as u64,
            StringLengthEncoding::U32 => self.u32_at(index)? as u64,
            StringLengthEncoding::U64 => self.u64_at(index)?,
        };
        let start = index.checked_add(encoding.width())?;
        let end = start.checked_add(usize::try_from(length).ok()?)?;
        let bytes = self.bytes.get(start..end)?;
        let value = String::from_utf8(bytes.to_vec()).ok()?;
        Some((value, end))
    }

    /// Returns `length` bytes starting at `offset`, if they exist.
    pub fn subdata(&self, offset: usize, length: usize) -> Option<Data> {
        let end = offset.checked_add(length)?;
        self.bytes.get(offset..end).map(Data::from_bytes)
    }

    /// Returns every byte from `offset` to the end.
    pub fn subdata_from(&self, offset: usize) -> Option<Data> {
        self.bytes.get(offset..).map(Data::from_bytes)
    }

    /// Returns a copy with the byte order reversed.
    pub fn reversed(&self) -> Data {
        let mut bytes = self.bytes.clone();
        bytes.reverse();
        Data { bytes }
    }

    // ------------------------------------------------------------
    // Codecs
    // ------------------------------------------------------------

    /// Uppercase hex representation.
    pub fn hex_encoded(&self) -> String {
        hex::encode_upper(&self.bytes)
    }

    pub fn base64_encoded(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Data({})", self.hex_encoded())
    }
}

impl std::fmt::Display for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.hex_encoded())
    }
}

impl From<Vec<u8>> for Data {
    fn from(bytes: Vec<u8>) -> Self {
        Data { bytes }
    }
}

impl From<&[u8]> for Data {
    fn from(bytes: &[u8]) -> Self {
        Data {
            bytes: bytes.to_vec(),
        }
    }
}

impl<const N: usize> From<[u8; N]> for Data {
    fn from(bytes: [u8; N]) -> Self {
        Data {
            bytes: bytes.to_vec(),
        }
    }
}

impl AsRef<[u8]> for Data {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Serialize for Data {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.base64_encoded())
    }
}

impl<'de> Deserialize<'de> for Data {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Data::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// Half-precision floats
// ============================================================

/// Converts an `f32` to IEEE 754 binary16 bits, rounding to nearest even.
pub fn f32_to_f16_bits(value: f32) -> u16 {
    f16::from_f32(value).to_bits()
}

/// Converts IEEE 754 binary16 bits to `f32`.
pub fn f16_bits_to_f32(bits: u16) -> f32 {
    f16::from_bits(bits).to_f32()
}
