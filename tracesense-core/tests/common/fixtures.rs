// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Test Fixtures
//!
//! Deterministic secrets, timestamps and advert captures.

use tracesense_core::data::Data;
use tracesense_core::payload::{DerivationConfig, PayloadTimestamp, SecretKey, EPOCH_2020_SECONDS};

pub const SECONDS_PER_DAY: i64 = 86_400;
pub const PERIOD_SECONDS: i64 = 360;

/// Secret with a recognisable byte pattern.
pub fn test_secret() -> SecretKey {
    SecretKey::from_bytes((0..2048).map(|i| (i % 251) as u8).collect::<Vec<u8>>())
}

pub fn other_secret() -> SecretKey {
    SecretKey::from_bytes(vec![0x5a; 2048])
}

/// Small window so tests stay fast.
pub fn test_config() -> DerivationConfig {
    DerivationConfig::default().with_days(10)
}

/// Start of `period` on `day` of the 2020 epoch.
pub fn at(day: i64, period: i64) -> PayloadTimestamp {
    PayloadTimestamp::from_unix_seconds(
        EPOCH_2020_SECONDS + day * SECONDS_PER_DAY + period * PERIOD_SECONDS,
    )
}

pub fn hex(s: &str) -> Data {
    Data::from_hex(s).expect("valid hex fixture")
}

/// Advert with flags, tx power and an Apple nearby-info message.
pub const APPLE_NEARBY_ADVERT: &str = "02011A020A0C0BFF4C0010060C044FDE4DF7";

/// Advert carrying two Apple manufacturer structures, the second padded
/// with zeros.
pub const APPLE_TWO_SEGMENT_ADVERT: &str =
    "02011A020A0C0BFF4C001006071EA3DD89E014FF4C000100000000000000000000000000000000";

/// Advert with an Apple message no default pattern matches.
pub const APPLE_OTHER_ADVERT: &str = "02011A0AFF4C00100503AABBCCDD";

/// Routes `tracing` output to the test harness; set `RUST_LOG` to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
