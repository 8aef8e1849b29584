// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for payload::simple
//! Matching keys, contact identifiers and the 23-byte payload

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use common::fixtures::{at, init_tracing, hex, test_config, test_secret, PERIOD_SECONDS};
use tracesense_core::data::Data;
use tracesense_core::payload::*;

fn header() -> PayloadHeader {
    PayloadHeader::new(SIMPLE_PROTOCOL_AND_VERSION, 826, 4).with_transmit_power(-8.0)
}

fn supplier() -> SimplePayloadSupplier {
    SimplePayloadSupplier::new(&test_secret(), &header(), test_config())
}

#[test]
fn test_payload_layout() {
    let supplier = supplier();
    let timestamp = at(1, 20);
    let payload = supplier.payload(timestamp);

    assert_eq!(payload.len(), SIMPLE_PAYLOAD_LENGTH);
    assert_eq!(supplier.payload_length(), 23);
    assert_eq!(payload.data().u8_at(0), Some(0x10));
    assert_eq!(payload.data().u16_at(1), Some(826));
    assert_eq!(payload.data().u16_at(3), Some(4));
    assert_eq!(payload.data().f16_at(5), Some(-8.0));

    let identifier = supplier.schedule().contact_identifier(timestamp).unwrap();
    assert_eq!(payload.data().subdata_from(7).unwrap(), identifier.to_data());
}

#[test]
fn test_parse_roundtrip() {
    let supplier = supplier();
    let timestamp = at(2, 200);
    let parsed = SimplePayload::parse(&supplier.payload(timestamp)).unwrap();

    assert_eq!(parsed.header, header());
    assert_eq!(
        parsed.contact_identifier,
        supplier.schedule().contact_identifier(timestamp).unwrap()
    );
    assert!(parsed.extended_data.is_empty());
}

#[test]
fn test_parse_with_extended_data() {
    let mut extended = ExtendedData::new();
    extended.add_section(codes::TEXT_PREMISES, "Cafe").unwrap();
    extended.add_section(codes::TEXT_AREA, 42u16).unwrap();

    let payload = supplier().payload(at(1, 1)).with_extended_data(&extended);
    assert_eq!(payload.len(), 23 + 6 + 4);

    let parsed = SimplePayload::parse(&payload).unwrap();
    assert_eq!(parsed.extended_data.len(), 2);
    assert_eq!(parsed.extended_data[0].code, codes::TEXT_PREMISES);
    assert_eq!(parsed.extended_data[0].data, Data::from(&b"Cafe"[..]));
    assert_eq!(parsed.extended_data[1].data.u16_at(0), Some(42));
}

#[test]
fn test_parse_rejects_short_payload() {
    let result = SimplePayload::parse(&PayloadData::new(Data::zeros(22)));
    assert_eq!(
        result,
        Err(PayloadError::TooShort {
            expected: 23,
            actual: 22
        })
    );
}

#[test]
fn test_parse_rejects_other_protocol() {
    let mut data = hex("08");
    data.append(&Data::zeros(22));
    assert_eq!(
        SimplePayload::parse(&PayloadData::new(data)),
        Err(PayloadError::UnsupportedProtocol(0x08))
    );
}

#[test]
fn test_identifier_stable_within_period_and_rotates() {
    let schedule = supplier();
    let schedule = schedule.schedule();
    let start = at(3, 7);
    let id = schedule.contact_identifier(start).unwrap();
    assert_eq!(
        id,
        schedule
            .contact_identifier(start.offset_by(PERIOD_SECONDS - 1))
            .unwrap()
    );
    assert_ne!(
        id,
        schedule
            .contact_identifier(start.offset_by(PERIOD_SECONDS))
            .unwrap()
    );
}

#[test]
fn test_identifiers_unique_within_day() {
    let schedule = KeySchedule::new(&test_secret(), test_config());
    let matching_key = schedule.matching_key(4).unwrap();
    let identifiers = contact_identifiers(&SeedChainPolicy, &matching_key, 240);
    let unique: HashSet<_> = identifiers.iter().collect();
    assert_eq!(unique.len(), identifiers.len());
}

#[test]
fn test_matching_keys_unique_across_days() {
    let keys = SeedChainPolicy.matching_keys(&test_secret(), 10);
    assert_eq!(keys.len(), 11);
    let unique: HashSet<_> = keys.iter().collect();
    assert_eq!(unique.len(), keys.len());
}

#[test]
fn test_published_matching_key_regenerates_identifiers() {
    let supplier = supplier();
    let schedule = supplier.schedule();
    let matching_key = schedule.matching_key(5).unwrap();
    let identifiers = contact_identifiers(&SeedChainPolicy, &matching_key, 240);

    for period in [0usize, 1, 120, 239] {
        let payload = supplier.payload(at(5, period as i64));
        let parsed = SimplePayload::parse(&payload).unwrap();
        assert_eq!(parsed.contact_identifier, identifiers[period]);
    }
}

#[test]
fn test_key_widths() {
    let matching_key = SeedChainPolicy.matching_keys(&test_secret(), 1)[0];
    assert_eq!(matching_key.as_bytes().len(), 32);
    let contact_key = SeedChainPolicy.contact_keys(&matching_key, 1)[0];
    assert_eq!(contact_key.as_bytes().len(), 32);
    let identifier = SeedChainPolicy.contact_identifier(&contact_key);
    assert_eq!(identifier.as_bytes()[..], contact_key.as_bytes()[..16]);
}

#[test]
fn test_seed_helpers_cover_chain() {
    let seeds = SeedChainPolicy::matching_key_seeds(&test_secret(), 10);
    assert_eq!(seeds.len(), 11);
    let matching_key = SeedChainPolicy.matching_keys(&test_secret(), 10)[0];
    assert_eq!(SeedChainPolicy::contact_key_seeds(&matching_key, 240).len(), 241);
}

#[test]
fn test_matching_key_out_of_window() {
    let schedule = KeySchedule::new(&test_secret(), test_config());
    assert!(matches!(
        schedule.matching_key(10),
        Err(DerivationError::OutOfWindow { day: 10, window: 10 })
    ));
}

#[test]
fn test_before_epoch_broadcasts_zero_identifier() {
    init_tracing();
    let payload = supplier().payload(at(0, 0).offset_by(-3600));
    assert_eq!(payload.len(), 23);
    assert_eq!(payload.data().subdata_from(7).unwrap(), Data::zeros(16));
}

#[test]
fn test_out_of_window_broadcasts_zero_identifier() {
    init_tracing();
    let payload = supplier().payload(at(20, 0));
    assert_eq!(payload.data().subdata_from(7).unwrap(), Data::zeros(16));
}

struct ConstantPolicy;

impl KeyDerivationPolicy for ConstantPolicy {
    fn matching_keys(&self, _secret: &SecretKey, days: usize) -> Vec<MatchingKey> {
        (0..=days)
            .map(|day| MatchingKey::from_bytes([day as u8; 32]))
            .collect()
    }

    fn contact_keys(&self, matching_key: &MatchingKey, periods: usize) -> Vec<ContactKey> {
        (0..=periods)
            .map(|period| {
                let mut bytes = *matching_key.as_bytes();
                bytes[31] = period as u8;
                ContactKey::from_bytes(bytes)
            })
            .collect()
    }

    fn contact_identifier(&self, contact_key: &ContactKey) -> ContactIdentifier {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&contact_key.as_bytes()[16..]);
        ContactIdentifier::from_bytes(bytes)
    }
}

#[test]
fn test_custom_policy_drives_payload() {
    let schedule = KeySchedule::with_policy(&test_secret(), test_config(), Arc::new(ConstantPolicy));
    let supplier = SimplePayloadSupplier::with_schedule(&header(), schedule);

    let payload = supplier.payload(at(2, 9));
    let mut expected = [2u8; 16];
    expected[15] = 9;
    assert_eq!(payload.data().subdata_from(7).unwrap(), Data::from(expected));
}

#[test]
fn test_secret_key_generation_is_unique() {
    let mut seen = HashSet::new();
    for _ in 0..1000 {
        let secret = SecretKey::generate().unwrap();
        assert_eq!(secret.as_bytes().len(), 2048);
        assert!(seen.insert(secret.as_bytes().to_vec()));
    }
}

#[test]
fn test_secret_key_debug_redacted() {
    let debug = format!("{:?}", test_secret());
    assert!(debug.contains("REDACTED"));
    assert!(!debug.contains("0, 1, 2"));
}

// ============================================================
// Shared supplier across threads
// ============================================================

#[test]
fn test_concurrent_payloads_match_single_threaded() {
    let shared = Arc::new(supplier());
    let reference = supplier();

    // Alternating days force the day cache to be rebuilt under contention
    let handles: Vec<_> = (0..8i64)
        .map(|i| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                (0..40i64)
                    .map(|step| {
                        let timestamp = at(1 + (i + step) % 2, (i * 29 + step) % 240);
                        (timestamp, shared.payload(timestamp))
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        for (timestamp, payload) in handle.join().unwrap() {
            assert_eq!(payload, reference.payload(timestamp));
        }
    }
}
