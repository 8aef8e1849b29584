// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Broadcast Payloads
//!
//! Rotating pseudonymous identifiers and the payloads that carry them.

pub mod beacon;
pub mod error;
pub mod extended;
pub mod fixed;
pub mod simple;
pub mod supplier;

pub use beacon::{
    beacon_code_seed, beacon_codes, day_codes, BeaconCode, BeaconCodeSeed, BeaconCodes,
    BeaconPayloadSupplier, DayCode, DayCodes, BEACON_CODE_LENGTH,
};
pub use error::{DerivationError, PayloadError};
pub use extended::{codes, ExtendedData, ExtendedDataSection, SectionValue};
pub use fixed::FixedPayloadSupplier;
pub use simple::{
    contact_identifiers, ContactIdentifier, ContactKey, ContactKeySeed, KeyDerivationPolicy,
    KeySchedule, MatchingKey, MatchingKeySeed, SeedChainPolicy, SimplePayload,
    SimplePayloadSupplier, CONTACT_IDENTIFIER_LENGTH, SIMPLE_PAYLOAD_LENGTH,
};
pub use supplier::{
    split_payloads, DerivationConfig, PayloadData, PayloadHeader, PayloadSupplier,
    PayloadTimestamp, SecretKey, BEACON_PROTOCOL_AND_VERSION, EPOCH_2020_SECONDS, HEADER_LENGTH,
    SIMPLE_PROTOCOL_AND_VERSION,
};
