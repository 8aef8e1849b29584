// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Payload Supplier Contract
//!
//! Shared types for every broadcast payload variant: timestamps, the
//! derivation calendar, the fixed header, and the `PayloadSupplier` trait
//! the radio layer drives once per advertisement cycle.

use std::time::{SystemTime, UNIX_EPOCH};

use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use zeroize::Zeroize;

use super::error::DerivationError;
use super::extended::ExtendedData;
use crate::data::Data;

/// 2020-01-01T00:00:00Z as seconds since the Unix epoch.
pub const EPOCH_2020_SECONDS: i64 = 1_577_836_800;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Default number of days covered by one provisioned secret.
pub const DEFAULT_DAYS: usize = 2000;

/// Default number of broadcast periods per day (6 minutes each).
pub const DEFAULT_PERIODS_PER_DAY: usize = 240;

/// Length of a provisioned secret key in bytes.
pub const SECRET_KEY_LENGTH: usize = 2048;

/// Length of the encoded `PayloadHeader`.
pub const HEADER_LENGTH: usize = 7;

/// Point in time a payload is generated for, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PayloadTimestamp {
    seconds: i64,
}

impl PayloadTimestamp {
    pub fn from_unix_seconds(seconds: i64) -> Self {
        PayloadTimestamp { seconds }
    }

    pub fn now() -> Self {
        SystemTime::now().into()
    }

    pub fn unix_seconds(&self) -> i64 {
        self.seconds
    }

    /// Returns a timestamp `seconds` later (or earlier, if negative).
    pub fn offset_by(&self, seconds: i64) -> Self {
        PayloadTimestamp {
            seconds: self.seconds.saturating_add(seconds),
        }
    }
}

impl From<SystemTime> for PayloadTimestamp {
    fn from(time: SystemTime) -> Self {
        let seconds = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => after.as_secs() as i64,
            Err(before) => -(before.duration().as_secs() as i64),
        };
        PayloadTimestamp { seconds }
    }
}

/// Calendar used to map timestamps onto day and period indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationConfig {
    /// Start of day 0, seconds since the Unix epoch
    pub epoch_seconds: i64,

    /// Number of days one secret provisions identifiers for
    pub days: usize,

    /// Broadcast periods per day
    pub periods_per_day: usize,
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self {
            epoch_seconds: EPOCH_2020_SECONDS,
            days: DEFAULT_DAYS,
            periods_per_day: DEFAULT_PERIODS_PER_DAY,
        }
    }
}

impl DerivationConfig {
    pub fn with_days(mut self, days: usize) -> Self {
        self.days = days;
        self
    }

    pub fn with_epoch_seconds(mut self, epoch_seconds: i64) -> Self {
        self.epoch_seconds = epoch_seconds;
        self
    }

    pub fn with_periods_per_day(mut self, periods_per_day: usize) -> Self {
        self.periods_per_day = periods_per_day;
        self
    }

    /// Length of one broadcast period in seconds (360 by default).
    pub fn period_seconds(&self) -> i64 {
        SECONDS_PER_DAY / self.periods_per_day.max(1) as i64
    }

    /// Day index of `timestamp` within the provisioned window.
    pub fn day(&self, timestamp: PayloadTimestamp) -> Result<usize, DerivationError> {
        let seconds = timestamp.unix_seconds();
        let elapsed = seconds.saturating_sub(self.epoch_seconds);
        if elapsed < 0 {
            return Err(DerivationError::BeforeEpoch { seconds });
        }
        let day = usize::try_from(elapsed / SECONDS_PER_DAY).unwrap_or(usize::MAX);
        if day >= self.days {
            return Err(DerivationError::OutOfWindow {
                day,
                window: self.days,
            });
        }
        Ok(day)
    }

    /// Period index of `timestamp` within its day.
    pub fn period(&self, timestamp: PayloadTimestamp) -> usize {
        let second_of_day = timestamp
            .unix_seconds()
            .saturating_sub(self.epoch_seconds)
            .rem_euclid(SECONDS_PER_DAY);
        let period = (second_of_day / self.period_seconds()) as usize;
        period.min(self.periods_per_day.saturating_sub(1))
    }
}

/// Protocol byte of the day-code payload.
pub const BEACON_PROTOCOL_AND_VERSION: u8 = 0x08;

/// Protocol byte of the matching-key payload.
pub const SIMPLE_PROTOCOL_AND_VERSION: u8 = 0x10;

/// Fixed fields that precede the identifier in every payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadHeader {
    pub protocol_and_version: u8,
    pub country_code: u16,
    pub state_code: u16,
    /// Transmit power in dBm, encoded as a half-precision float
    pub transmit_power: f32,
}

impl Default for PayloadHeader {
    fn default() -> Self {
        Self {
            protocol_and_version: SIMPLE_PROTOCOL_AND_VERSION,
            country_code: 0,
            state_code: 0,
            transmit_power: 0.0,
        }
    }
}

impl PayloadHeader {
    pub fn new(protocol_and_version: u8, country_code: u16, state_code: u16) -> Self {
        PayloadHeader {
            protocol_and_version,
            country_code,
            state_code,
            transmit_power: 0.0,
        }
    }

    pub fn with_transmit_power(mut self, transmit_power: f32) -> Self {
        self.transmit_power = transmit_power;
        self
    }

    /// Encodes the header as `HEADER_LENGTH` big-endian bytes.
    pub fn encode(&self) -> Data {
        let mut data = Data::new();
        data.append_u8(self.protocol_and_version);
        data.append_u16(self.country_code);
        data.append_u16(self.state_code);
        data.append_f16(self.transmit_power);
        data
    }

    /// Decodes a header from the start of `data`.
    pub fn decode(data: &Data) -> Option<Self> {
        Some(PayloadHeader {
            protocol_and_version: data.u8_at(0)?,
            country_code: data.u16_at(1)?,
            state_code: data.u16_at(3)?,
            transmit_power: data.f16_at(5)?,
        })
    }
}

/// Wire-format broadcast payload.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayloadData(Data);

impl PayloadData {
    pub fn new(data: Data) -> Self {
        PayloadData(data)
    }

    pub fn data(&self) -> &Data {
        &self.0
    }

    pub fn into_data(self) -> Data {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Short human-readable tag for logs.
    pub fn short_name(&self) -> String {
        let encoded = self.0.base64_encoded();
        encoded.chars().take(6).collect()
    }

    /// Returns a copy with `extended` appended after the fixed payload.
    pub fn with_extended_data(&self, extended: &ExtendedData) -> PayloadData {
        let mut data = self.0.clone();
        data.append(extended.payload());
        PayloadData(data)
    }
}

impl std::fmt::Debug for PayloadData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PayloadData({})", self.0.hex_encoded())
    }
}

impl From<Data> for PayloadData {
    fn from(data: Data) -> Self {
        PayloadData(data)
    }
}

/// Long-term secret every identifier of a device is derived from.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey {
    bytes: Vec<u8>,
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("bytes", &"[REDACTED]")
            .field("length", &self.bytes.len())
            .finish()
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl SecretKey {
    /// Generates a new random `SECRET_KEY_LENGTH`-byte secret.
    pub fn generate() -> Result<Self, DerivationError> {
        let rng = SystemRandom::new();
        let mut bytes = vec![0u8; SECRET_KEY_LENGTH];
        rng.fill(&mut bytes)
            .map_err(|_| DerivationError::RandomUnavailable)?;
        Ok(SecretKey { bytes })
    }

    /// Wraps provisioned secret bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        SecretKey {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Source of broadcast payloads, driven by the radio layer.
pub trait PayloadSupplier: Send + Sync {
    /// Total length of every payload this supplier produces.
    fn payload_length(&self) -> usize;

    /// Payload to broadcast at `timestamp`.
    ///
    /// Never fails: when no identifier is available the payload carries an
    /// all-zero identifier of the correct width.
    fn payload(&self, timestamp: PayloadTimestamp) -> PayloadData;

    /// Splits concatenated payloads received from a peer.
    fn parse_payloads(&self, raw: &Data) -> Vec<PayloadData> {
        split_payloads(raw, self.payload_length())
    }
}

/// Fixed-stride slicing; trailing partial bytes are dropped.
pub fn split_payloads(raw: &Data, payload_length: usize) -> Vec<PayloadData> {
    if payload_length == 0 {
        return Vec::new();
    }
    raw.as_bytes()
        .chunks_exact(payload_length)
        .map(|chunk| PayloadData::new(Data::from(chunk)))
        .collect()
}

/// Appends the derived identifier to `header`, substituting zeros on failure.
pub(crate) fn assemble_payload(
    header: &Data,
    identifier: Result<Data, DerivationError>,
    identifier_length: usize,
) -> PayloadData {
    let identifier = match identifier {
        Ok(identifier) if identifier.len() == identifier_length => identifier,
        Ok(identifier) => {
            error!(
                "{}",
                DerivationError::IdentifierLength {
                    expected: identifier_length,
                    actual: identifier.len(),
                }
            );
            Data::zeros(identifier_length)
        }
        Err(e) => {
            warn!("No identifier available, broadcasting placeholder: {}", e);
            Data::zeros(identifier_length)
        }
    };

    let mut data = header.clone();
    data.append(&identifier);
    PayloadData::new(data)
}
