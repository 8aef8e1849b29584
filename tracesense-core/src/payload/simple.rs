// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Matching-Key Payloads
//!
//! secret -> matching key (per day) -> contact key (per period) ->
//! contact identifier (16 bytes). Publishing a day's matching key lets
//! others regenerate that day's contact identifiers without exposing any
//! later day.
//!
//! Wire layout (23 bytes, big-endian):
//! `protocol (1) || country (2) || state (2) || tx power f16 (2) || contact identifier (16)`

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::error::{DerivationError, PayloadError};
use super::extended::{ExtendedData, ExtendedDataSection};
use super::supplier::{
    assemble_payload, DerivationConfig, PayloadData, PayloadHeader, PayloadSupplier,
    PayloadTimestamp, SecretKey, HEADER_LENGTH, SIMPLE_PROTOCOL_AND_VERSION,
};
use crate::crypto::hash_chain::{derive_seed_chain, h, t, t_n, xor, Hash};
use crate::data::Data;

/// Width of matching keys, contact keys and their seeds.
pub const KEY_LENGTH: usize = 32;

/// Width of a broadcast contact identifier.
pub const CONTACT_IDENTIFIER_LENGTH: usize = 16;

/// Total length of a matching-key payload without extended data.
pub const SIMPLE_PAYLOAD_LENGTH: usize = HEADER_LENGTH + CONTACT_IDENTIFIER_LENGTH;

macro_rules! key_type {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name([u8; $len]);

        impl $name {
            pub fn from_bytes(bytes: [u8; $len]) -> Self {
                $name(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn to_data(&self) -> Data {
                Data::from(self.0)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode_upper(self.0))
            }
        }
    };
}

key_type!(
    /// Link of the per-day seed chain.
    MatchingKeySeed,
    KEY_LENGTH
);
key_type!(
    /// Per-day key; published to let others match that day's identifiers.
    MatchingKey,
    KEY_LENGTH
);
key_type!(ContactKeySeed, KEY_LENGTH);
key_type!(ContactKey, KEY_LENGTH);
key_type!(
    /// Broadcast identifier for one period.
    ContactIdentifier,
    CONTACT_IDENTIFIER_LENGTH
);

/// How the matching-key chain is wired together.
///
/// Only the external contract is fixed: deterministic output, a distinct
/// key per day and per period, 32-byte keys and 16-byte identifiers.
pub trait KeyDerivationPolicy: Send + Sync {
    /// Matching keys for days `0..=days`.
    fn matching_keys(&self, secret: &SecretKey, days: usize) -> Vec<MatchingKey>;

    /// Contact keys for periods `0..=periods` of one day.
    fn contact_keys(&self, matching_key: &MatchingKey, periods: usize) -> Vec<ContactKey>;

    fn contact_identifier(&self, contact_key: &ContactKey) -> ContactIdentifier;
}

/// Default wiring: reverse truncating seed chains combined pairwise.
///
/// seed = derive_seed_chain(input, n); key[i] = h(xor(seed[i], seed[i-1]))
/// with seed[-1] = h(t(seed[0])); identifier = t(contact key, 16).
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedChainPolicy;

impl SeedChainPolicy {
    fn chain_keys(input: &[u8], count: usize) -> Vec<Hash> {
        let seeds = derive_seed_chain(input, count);
        let seed_minus_one = h(t(&seeds[0]));
        seeds
            .iter()
            .enumerate()
            .map(|(i, seed)| {
                let previous = if i == 0 { &seed_minus_one } else { &seeds[i - 1] };
                h(&xor(seed, previous))
            })
            .collect()
    }

    /// Seeds behind each matching key, for callers that publish seeds.
    pub fn matching_key_seeds(secret: &SecretKey, days: usize) -> Vec<MatchingKeySeed> {
        derive_seed_chain(secret.as_bytes(), days)
            .into_iter()
            .map(MatchingKeySeed)
            .collect()
    }

    /// Seeds behind each contact key of one day.
    pub fn contact_key_seeds(matching_key: &MatchingKey, periods: usize) -> Vec<ContactKeySeed> {
        derive_seed_chain(matching_key.as_bytes(), periods)
            .into_iter()
            .map(ContactKeySeed)
            .collect()
    }
}

impl KeyDerivationPolicy for SeedChainPolicy {
    fn matching_keys(&self, secret: &SecretKey, days: usize) -> Vec<MatchingKey> {
        Self::chain_keys(secret.as_bytes(), days)
            .into_iter()
            .map(MatchingKey)
            .collect()
    }

    fn contact_keys(&self, matching_key: &MatchingKey, periods: usize) -> Vec<ContactKey> {
        Self::chain_keys(matching_key.as_bytes(), periods)
            .into_iter()
            .map(ContactKey)
            .collect()
    }

    fn contact_identifier(&self, contact_key: &ContactKey) -> ContactIdentifier {
        let mut identifier = [0u8; CONTACT_IDENTIFIER_LENGTH];
        identifier.copy_from_slice(t_n(contact_key.as_bytes(), CONTACT_IDENTIFIER_LENGTH));
        ContactIdentifier(identifier)
    }
}

/// Contact identifiers for every period of the day `matching_key` covers.
pub fn contact_identifiers(
    policy: &dyn KeyDerivationPolicy,
    matching_key: &MatchingKey,
    periods: usize,
) -> Vec<ContactIdentifier> {
    policy
        .contact_keys(matching_key, periods)
        .iter()
        .map(|key| policy.contact_identifier(key))
        .collect()
}

struct DayCache {
    day: usize,
    identifiers: Vec<ContactIdentifier>,
}

/// Matching keys for the window plus the current day's identifiers.
pub struct KeySchedule {
    config: DerivationConfig,
    policy: Arc<dyn KeyDerivationPolicy>,
    matching_keys: Vec<MatchingKey>,
    cache: Mutex<Option<DayCache>>,
}

impl KeySchedule {
    pub fn new(secret: &SecretKey, config: DerivationConfig) -> Self {
        Self::with_policy(secret, config, Arc::new(SeedChainPolicy))
    }

    pub fn with_policy(
        secret: &SecretKey,
        config: DerivationConfig,
        policy: Arc<dyn KeyDerivationPolicy>,
    ) -> Self {
        let matching_keys = policy.matching_keys(secret, config.days);
        KeySchedule {
            config,
            policy,
            matching_keys,
            cache: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &DerivationConfig {
        &self.config
    }

    pub fn matching_key(&self, day: usize) -> Result<MatchingKey, DerivationError> {
        if day >= self.config.days {
            return Err(DerivationError::OutOfWindow {
                day,
                window: self.config.days,
            });
        }
        self.matching_keys
            .get(day)
            .copied()
            .ok_or(DerivationError::OutOfWindow {
                day,
                window: self.matching_keys.len(),
            })
    }

    /// Contact identifier broadcast during the period containing `timestamp`.
    pub fn contact_identifier(
        &self,
        timestamp: PayloadTimestamp,
    ) -> Result<ContactIdentifier, DerivationError> {
        let day = self.config.day(timestamp)?;
        let period = self.config.period(timestamp);

        let mut cache = self.cache.lock();
        let stale = cache.as_ref().map_or(true, |c| c.day != day);
        if stale {
            debug!("Deriving contact identifiers for day {}", day);
            let matching_key = self.matching_key(day)?;
            *cache = Some(DayCache {
                day,
                identifiers: contact_identifiers(
                    self.policy.as_ref(),
                    &matching_key,
                    self.config.periods_per_day,
                ),
            });
        }

        cache
            .as_ref()
            .and_then(|c| c.identifiers.get(period).copied())
            .ok_or(DerivationError::IdentifierLength {
                expected: CONTACT_IDENTIFIER_LENGTH,
                actual: 0,
            })
    }
}

/// Payload supplier broadcasting the 23-byte matching-key layout.
pub struct SimplePayloadSupplier {
    header: Data,
    schedule: KeySchedule,
}

impl SimplePayloadSupplier {
    pub fn new(secret: &SecretKey, header: &PayloadHeader, config: DerivationConfig) -> Self {
        Self::with_schedule(header, KeySchedule::new(secret, config))
    }

    pub fn with_schedule(header: &PayloadHeader, schedule: KeySchedule) -> Self {
        SimplePayloadSupplier {
            header: header.encode(),
            schedule,
        }
    }

    pub fn schedule(&self) -> &KeySchedule {
        &self.schedule
    }
}

impl PayloadSupplier for SimplePayloadSupplier {
    fn payload_length(&self) -> usize {
        SIMPLE_PAYLOAD_LENGTH
    }

    fn payload(&self, timestamp: PayloadTimestamp) -> PayloadData {
        let identifier = self
            .schedule
            .contact_identifier(timestamp)
            .map(|id| id.to_data());
        assemble_payload(&self.header, identifier, CONTACT_IDENTIFIER_LENGTH)
    }
}

/// Decoded matching-key payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SimplePayload {
    pub header: PayloadHeader,
    pub contact_identifier: ContactIdentifier,
    pub extended_data: Vec<ExtendedDataSection>,
}

impl SimplePayload {
    /// Decodes the fixed fields and any trailing extended-data sections.
    pub fn parse(payload: &PayloadData) -> Result<Self, PayloadError> {
        let data = payload.data();
        if data.len() < SIMPLE_PAYLOAD_LENGTH {
            return Err(PayloadError::TooShort {
                expected: SIMPLE_PAYLOAD_LENGTH,
                actual: data.len(),
            });
        }

        let header = PayloadHeader::decode(data).ok_or(PayloadError::TooShort {
            expected: HEADER_LENGTH,
            actual: data.len(),
        })?;
        if header.protocol_and_version != SIMPLE_PROTOCOL_AND_VERSION {
            return Err(PayloadError::UnsupportedProtocol(header.protocol_and_version));
        }

        let mut identifier = [0u8; CONTACT_IDENTIFIER_LENGTH];
        identifier.copy_from_slice(&data.as_bytes()[HEADER_LENGTH..SIMPLE_PAYLOAD_LENGTH]);

        let extended_data = data
            .subdata_from(SIMPLE_PAYLOAD_LENGTH)
            .map(|rest| ExtendedData::from_payload(rest).sections())
            .unwrap_or_default();

        Ok(SimplePayload {
            header,
            contact_identifier: ContactIdentifier(identifier),
            extended_data,
        })
    }
}
