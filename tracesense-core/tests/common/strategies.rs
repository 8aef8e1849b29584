// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proptest Strategies
//!
//! Reusable proptest strategies for property-based testing.

use proptest::prelude::*;
use tracesense_core::data::Data;

/// Arbitrary bytes up to `max` long.
pub fn data_strategy(max: usize) -> impl Strategy<Value = Data> {
    prop::collection::vec(any::<u8>(), 0..=max).prop_map(Data::from)
}

/// A TLV section value that fits one section.
pub fn section_strategy() -> impl Strategy<Value = (u8, Data)> {
    (any::<u8>(), data_strategy(255))
}

/// Seconds within the default 2000-day window.
pub fn in_window_seconds_strategy() -> impl Strategy<Value = i64> {
    0i64..(2000 * 86_400)
}

/// Hex characters in either case.
pub fn hex_message_strategy() -> impl Strategy<Value = String> {
    "[0-9A-Fa-f]{2,40}"
}
