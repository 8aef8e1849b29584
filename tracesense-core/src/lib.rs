// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tracesense Core Library
//!
//! Proximity sensing core for decentralized contact tracing: rotating
//! unlinkable broadcast identifiers, advert fingerprinting across address
//! rotation, and a connectionless secure channel between two devices.
//! The radio transport is external; this crate only turns bytes into
//! bytes.

pub mod ble;
pub mod config;
pub mod crypto;
pub mod data;
pub mod payload;
pub mod security;

pub use ble::{
    extract_messages, parse_advert, AdvertFilterConfig, AdvertRecord, FilterError,
    ManufacturerData, MessageFraming, MessagePattern, PatternFilter,
};
pub use config::{ConfigError, SecurityConfig, SensorConfig};
pub use data::{Data, DataError};
pub use payload::{
    BeaconPayloadSupplier, DerivationConfig, DerivationError, ExtendedData, ExtendedDataSection,
    FixedPayloadSupplier, PayloadData, PayloadError, PayloadHeader, PayloadSupplier,
    PayloadTimestamp, SecretKey, SectionValue, SimplePayload, SimplePayloadSupplier,
};
pub use security::{
    DiffieHellmanKeyExchange, DiffieHellmanParameters, KeyExchangeKeyPair, RandomSource,
    SecureSession, SecurityError, SessionId,
};
