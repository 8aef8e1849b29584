// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Extended Data Sections
//!
//! Optional TLV records appended after the fixed payload:
//! `[code (1)][length (1)][length bytes]*`. Parsing never fails; a
//! truncated buffer yields a shortened final section and fewer than two
//! trailing bytes are ignored.

use serde::{Deserialize, Serialize};

use super::error::PayloadError;
use crate::data::{f32_to_f16_bits, Data};

/// Well-known section codes.
pub mod codes {
    pub const TEXT_PREMISES: u8 = 0x10;
    pub const TEXT_LOCATION: u8 = 0x20;
    pub const TEXT_AREA: u8 = 0x30;
    pub const LOCATION_URL: u8 = 0x40;
}

/// Largest value a single section can carry.
pub const MAX_SECTION_LENGTH: usize = u8::MAX as usize;

/// Typed value of a section, encoded big-endian.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    /// Stored as a half-precision float
    F16(f32),
    Text(String),
    Bytes(Data),
}

impl SectionValue {
    fn encode(&self) -> Vec<u8> {
        match self {
            SectionValue::U8(v) => v.to_be_bytes().to_vec(),
            SectionValue::U16(v) => v.to_be_bytes().to_vec(),
            SectionValue::U32(v) => v.to_be_bytes().to_vec(),
            SectionValue::U64(v) => v.to_be_bytes().to_vec(),
            SectionValue::I8(v) => v.to_be_bytes().to_vec(),
            SectionValue::I16(v) => v.to_be_bytes().to_vec(),
            SectionValue::I32(v) => v.to_be_bytes().to_vec(),
            SectionValue::I64(v) => v.to_be_bytes().to_vec(),
            SectionValue::F16(v) => f32_to_f16_bits(*v).to_be_bytes().to_vec(),
            SectionValue::Text(s) => s.as_bytes().to_vec(),
            SectionValue::Bytes(d) => d.as_bytes().to_vec(),
        }
    }
}

macro_rules! section_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for SectionValue {
                fn from(value: $ty) -> Self {
                    SectionValue::$variant(value)
                }
            }
        )*
    };
}

section_value_from!(
    u8 => U8, u16 => U16, u32 => U32, u64 => U64,
    i8 => I8, i16 => I16, i32 => I32, i64 => I64,
    String => Text, Data => Bytes,
);

impl From<f32> for SectionValue {
    fn from(value: f32) -> Self {
        SectionValue::F16(value)
    }
}

impl From<&str> for SectionValue {
    fn from(value: &str) -> Self {
        SectionValue::Text(value.to_string())
    }
}

/// One decoded TLV record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedDataSection {
    pub code: u8,
    /// Number of data bytes actually present
    pub length: u8,
    pub data: Data,
}

/// Append-only TLV builder and parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedData {
    payload: Data,
}

impl ExtendedData {
    pub fn new() -> Self {
        ExtendedData {
            payload: Data::new(),
        }
    }

    /// Wraps received section bytes for parsing.
    pub fn from_payload(payload: Data) -> Self {
        ExtendedData { payload }
    }

    /// Appends `code, length, value`.
    pub fn add_section(
        &mut self,
        code: u8,
        value: impl Into<SectionValue>,
    ) -> Result<(), PayloadError> {
        let bytes = value.into().encode();
        if bytes.len() > MAX_SECTION_LENGTH {
            return Err(PayloadError::SectionTooLong { length: bytes.len() });
        }
        self.payload.append_u8(code);
        self.payload.append_u8(bytes.len() as u8);
        self.payload.append_bytes(&bytes);
        Ok(())
    }

    pub fn has_data(&self) -> bool {
        !self.payload.is_empty()
    }

    pub fn payload(&self) -> &Data {
        &self.payload
    }

    /// Decodes every section in order; unknown codes are kept.
    pub fn sections(&self) -> Vec<ExtendedDataSection> {
        let bytes = self.payload.as_bytes();
        let mut sections = Vec::new();
        let mut offset = 0;

        while bytes.len() - offset >= 2 {
            let code = bytes[offset];
            let declared = bytes[offset + 1] as usize;
            let start = offset + 2;
            let length = declared.min(bytes.len() - start);
            sections.push(ExtendedDataSection {
                code,
                length: length as u8,
                data: Data::from(&bytes[start..start + length]),
            });
            offset = start + length;
        }

        sections
    }
}
