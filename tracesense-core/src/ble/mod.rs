// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! BLE Advert Fingerprinting
//!
//! Parses advertisement records handed over by the radio layer and
//! recognises devices running a foreign protocol on the same channel.

pub mod advert;
pub mod filter;

pub use advert::{
    extract_messages, parse_advert, AdvertRecord, AdvertSegment, AdvertSegmentType,
    ManufacturerData, MessageFraming, MANUFACTURER_APPLE,
};
pub use filter::{
    AdvertFilterConfig, FilterError, MessagePattern, PatternFilter, DEFAULT_IGNORE_PATTERNS,
};
