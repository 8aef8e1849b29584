// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! BLE Advertisement Parsing
//!
//! Decodes raw advertisement and scan-response bytes into AD structures
//! (`[length][type][length - 1 bytes]`) and pulls vendor messages out of
//! manufacturer-specific data. Garbled radio data never produces an
//! error: parsing stops at the first structure that does not fit.

use serde::{Deserialize, Serialize};

use crate::data::Data;

/// Bluetooth SIG company identifier of Apple.
pub const MANUFACTURER_APPLE: u16 = 0x004c;

/// AD structure types this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvertSegmentType {
    Flags,
    IncompleteServiceUuids16,
    CompleteServiceUuids16,
    IncompleteServiceUuids32,
    CompleteServiceUuids32,
    IncompleteServiceUuids128,
    CompleteServiceUuids128,
    ShortenedLocalName,
    CompleteLocalName,
    TxPowerLevel,
    ServiceData16,
    ManufacturerData,
    Other(u8),
}

impl From<u8> for AdvertSegmentType {
    fn from(code: u8) -> Self {
        match code {
            0x01 => AdvertSegmentType::Flags,
            0x02 => AdvertSegmentType::IncompleteServiceUuids16,
            0x03 => AdvertSegmentType::CompleteServiceUuids16,
            0x04 => AdvertSegmentType::IncompleteServiceUuids32,
            0x05 => AdvertSegmentType::CompleteServiceUuids32,
            0x06 => AdvertSegmentType::IncompleteServiceUuids128,
            0x07 => AdvertSegmentType::CompleteServiceUuids128,
            0x08 => AdvertSegmentType::ShortenedLocalName,
            0x09 => AdvertSegmentType::CompleteLocalName,
            0x0a => AdvertSegmentType::TxPowerLevel,
            0x16 => AdvertSegmentType::ServiceData16,
            0xff => AdvertSegmentType::ManufacturerData,
            other => AdvertSegmentType::Other(other),
        }
    }
}

/// One AD structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertSegment {
    pub segment_type: AdvertSegmentType,
    /// Bytes after the type byte
    pub data: Data,
    /// The whole structure, length byte included
    pub raw: Data,
}

/// Manufacturer-specific data for one company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManufacturerData {
    pub manufacturer: u16,
    /// Bytes after the company identifier
    pub data: Data,
    pub raw: Data,
}

/// How sub-messages are delimited inside manufacturer data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageFraming {
    /// `[length][length bytes]`
    LengthPrefixed,
    /// `[type][length][length bytes]`, as in Apple Continuity messages
    #[default]
    TypeLength,
}

/// Every AD structure of one advertisement, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvertRecord {
    segments: Vec<AdvertSegment>,
}

/// Parses raw advertisement bytes.
pub fn parse_advert(raw: &[u8]) -> AdvertRecord {
    let mut segments = Vec::new();
    let mut offset = 0;

    while offset < raw.len() {
        let length = raw[offset] as usize;
        // Zero length marks the end of significant data
        if length == 0 {
            break;
        }
        let end = offset + 1 + length;
        if end > raw.len() {
            break;
        }
        segments.push(AdvertSegment {
            segment_type: AdvertSegmentType::from(raw[offset + 1]),
            data: Data::from(&raw[offset + 2..end]),
            raw: Data::from(&raw[offset..end]),
        });
        offset = end;
    }

    AdvertRecord { segments }
}

impl AdvertRecord {
    pub fn segments(&self) -> &[AdvertSegment] {
        &self.segments
    }

    fn first_of(&self, segment_type: AdvertSegmentType) -> Option<&AdvertSegment> {
        self.segments
            .iter()
            .find(|segment| segment.segment_type == segment_type)
    }

    pub fn flags(&self) -> Option<u8> {
        self.first_of(AdvertSegmentType::Flags)?.data.u8_at(0)
    }

    /// Advertised transmit power in dBm.
    pub fn tx_power(&self) -> Option<i8> {
        self.first_of(AdvertSegmentType::TxPowerLevel)?.data.i8_at(0)
    }

    /// Complete local name, falling back to the shortened one.
    pub fn local_name(&self) -> Option<String> {
        let segment = self
            .first_of(AdvertSegmentType::CompleteLocalName)
            .or_else(|| self.first_of(AdvertSegmentType::ShortenedLocalName))?;
        String::from_utf8(segment.data.as_bytes().to_vec()).ok()
    }

    /// 16-bit service UUIDs from both the complete and incomplete lists.
    pub fn service_uuids16(&self) -> Vec<u16> {
        self.segments
            .iter()
            .filter(|segment| {
                matches!(
                    segment.segment_type,
                    AdvertSegmentType::IncompleteServiceUuids16
                        | AdvertSegmentType::CompleteServiceUuids16
                )
            })
            .flat_map(|segment| {
                segment
                    .data
                    .as_bytes()
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// All manufacturer data blocks, optionally restricted to one company.
    ///
    /// A scan response may carry the same company more than once, so every
    /// matching block is returned in order.
    pub fn manufacturer_data(&self, manufacturer: Option<u16>) -> Vec<ManufacturerData> {
        self.segments
            .iter()
            .filter(|segment| segment.segment_type == AdvertSegmentType::ManufacturerData)
            .filter_map(|segment| {
                let bytes = segment.data.as_bytes();
                if bytes.len() < 2 {
                    return None;
                }
                let company = u16::from_le_bytes([bytes[0], bytes[1]]);
                if manufacturer.is_some_and(|wanted| wanted != company) {
                    return None;
                }
                Some(ManufacturerData {
                    manufacturer: company,
                    data: Data::from(&bytes[2..]),
                    raw: segment.raw.clone(),
                })
            })
            .collect()
    }
}

/// Splits the concatenated data of `segments` into vendor messages.
///
/// Boundaries come from the embedded length bytes, not from the AD
/// structures, so a message may span two structures. A truncated final
/// message is dropped.
pub fn extract_messages(segments: &[ManufacturerData], framing: MessageFraming) -> Vec<Data> {
    let mut joined = Data::new();
    for segment in segments {
        joined.append(&segment.data);
    }

    let bytes = joined.as_bytes();
    let header = match framing {
        MessageFraming::LengthPrefixed => 1,
        MessageFraming::TypeLength => 2,
    };

    let mut messages = Vec::new();
    let mut offset = 0;
    while offset + header <= bytes.len() {
        let length = bytes[offset + header - 1] as usize;
        let end = offset + header + length;
        if end > bytes.len() {
            break;
        }
        messages.push(Data::from(&bytes[offset..end]));
        offset = end;
    }
    messages
}
