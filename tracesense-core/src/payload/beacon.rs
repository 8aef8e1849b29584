// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Day-Code Beacon Payloads
//!
//! secret -> day code (one per day in the window) -> beacon code seed ->
//! beacon codes (one per period). Day codes are 64-bit truncations of a
//! hash chain over the secret; each day's beacon codes come from a second
//! chain seeded by that day's code.

use parking_lot::Mutex;
use tracing::debug;

use super::error::DerivationError;
use super::supplier::{
    assemble_payload, DerivationConfig, PayloadData, PayloadHeader, PayloadSupplier,
    PayloadTimestamp, SecretKey, HEADER_LENGTH,
};
use crate::crypto::hash_chain::{derive_u64_sequence, h, truncate_to_u64};
use crate::data::Data;

/// Width of a broadcast beacon code.
pub const BEACON_CODE_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayCode(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BeaconCodeSeed {
    pub day: usize,
    pub value: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BeaconCode(pub u64);

impl BeaconCode {
    pub fn to_data(self) -> Data {
        Data::from(self.0.to_be_bytes())
    }
}

/// Day codes for `days` days; index 0 is the first day of the window.
pub fn day_codes(secret: &SecretKey, days: usize) -> Vec<DayCode> {
    derive_u64_sequence(secret.as_bytes(), days)
        .into_iter()
        .map(DayCode)
        .collect()
}

/// Seed for the beacon codes of the day `day_code` belongs to.
pub fn beacon_code_seed(day: usize, day_code: DayCode) -> BeaconCodeSeed {
    let mut reversed = day_code.0.to_be_bytes();
    reversed.reverse();
    BeaconCodeSeed {
        day,
        value: truncate_to_u64(&h(&reversed)),
    }
}

/// `count` beacon codes for one day.
pub fn beacon_codes(seed: BeaconCodeSeed, count: usize) -> Vec<BeaconCode> {
    let mut reversed = seed.value.to_be_bytes();
    reversed.reverse();
    derive_u64_sequence(&reversed, count)
        .into_iter()
        .map(BeaconCode)
        .collect()
}

/// All day codes of the provisioned window.
pub struct DayCodes {
    config: DerivationConfig,
    values: Vec<DayCode>,
}

impl DayCodes {
    pub fn new(secret: &SecretKey, config: DerivationConfig) -> Self {
        let values = day_codes(secret, config.days);
        DayCodes { config, values }
    }

    pub fn config(&self) -> &DerivationConfig {
        &self.config
    }

    pub fn day(&self, timestamp: PayloadTimestamp) -> Result<usize, DerivationError> {
        self.config.day(timestamp)
    }

    pub fn get(&self, timestamp: PayloadTimestamp) -> Result<DayCode, DerivationError> {
        let day = self.day(timestamp)?;
        self.values
            .get(day)
            .copied()
            .ok_or(DerivationError::OutOfWindow {
                day,
                window: self.values.len(),
            })
    }

    pub fn seed(&self, timestamp: PayloadTimestamp) -> Result<BeaconCodeSeed, DerivationError> {
        let day = self.day(timestamp)?;
        Ok(beacon_code_seed(day, self.get(timestamp)?))
    }
}

struct DayCache {
    day: usize,
    values: Vec<BeaconCode>,
}

/// Beacon codes for the current day, recomputed when the day changes.
pub struct BeaconCodes {
    day_codes: DayCodes,
    cache: Mutex<Option<DayCache>>,
}

impl BeaconCodes {
    pub fn new(day_codes: DayCodes) -> Self {
        BeaconCodes {
            day_codes,
            cache: Mutex::new(None),
        }
    }

    pub fn day_codes(&self) -> &DayCodes {
        &self.day_codes
    }

    /// Beacon code broadcast during the period containing `timestamp`.
    pub fn get(&self, timestamp: PayloadTimestamp) -> Result<BeaconCode, DerivationError> {
        let seed = self.day_codes.seed(timestamp)?;
        let config = self.day_codes.config();
        let period = config.period(timestamp);

        let mut cache = self.cache.lock();
        let stale = cache.as_ref().map_or(true, |c| c.day != seed.day);
        if stale {
            debug!("Deriving beacon codes for day {}", seed.day);
            *cache = Some(DayCache {
                day: seed.day,
                values: beacon_codes(seed, config.periods_per_day),
            });
        }

        cache
            .as_ref()
            .and_then(|c| c.values.get(period).copied())
            .ok_or(DerivationError::IdentifierLength {
                expected: BEACON_CODE_LENGTH,
                actual: 0,
            })
    }
}

/// Payload supplier broadcasting `header || beacon code`.
pub struct BeaconPayloadSupplier {
    header: Data,
    beacon_codes: BeaconCodes,
}

impl BeaconPayloadSupplier {
    pub fn new(secret: &SecretKey, header: &PayloadHeader, config: DerivationConfig) -> Self {
        BeaconPayloadSupplier {
            header: header.encode(),
            beacon_codes: BeaconCodes::new(DayCodes::new(secret, config)),
        }
    }

    pub fn beacon_codes(&self) -> &BeaconCodes {
        &self.beacon_codes
    }

    /// Extracts the beacon code from a received payload.
    pub fn beacon_code(payload: &PayloadData) -> Option<BeaconCode> {
        payload.data().u64_at(HEADER_LENGTH).map(BeaconCode)
    }
}

impl PayloadSupplier for BeaconPayloadSupplier {
    fn payload_length(&self) -> usize {
        HEADER_LENGTH + BEACON_CODE_LENGTH
    }

    fn payload(&self, timestamp: PayloadTimestamp) -> PayloadData {
        let identifier = self.beacon_codes.get(timestamp).map(BeaconCode::to_data);
        assemble_payload(&self.header, identifier, BEACON_CODE_LENGTH)
    }
}
