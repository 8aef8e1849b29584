// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fixed-Identifier Payloads
//!
//! Broadcasts the same identifier forever. Used for bench and interop
//! testing where rotating pseudonyms get in the way.

use super::supplier::{PayloadData, PayloadSupplier, PayloadTimestamp};
use crate::data::Data;

/// Total payload length.
pub const FIXED_PAYLOAD_LENGTH: usize = 129;

/// Reserved bytes before the identifier.
pub const FIXED_IDENTIFIER_OFFSET: usize = 3;

/// Payload supplier with a constant 32-bit identifier.
#[derive(Debug, Clone)]
pub struct FixedPayloadSupplier {
    identifier: i32,
    payload: PayloadData,
}

impl FixedPayloadSupplier {
    pub fn new(identifier: i32) -> Self {
        let mut data = Data::zeros(FIXED_IDENTIFIER_OFFSET);
        data.append_i32(identifier);
        data.append(&Data::zeros(
            FIXED_PAYLOAD_LENGTH - FIXED_IDENTIFIER_OFFSET - 4,
        ));
        FixedPayloadSupplier {
            identifier,
            payload: PayloadData::new(data),
        }
    }

    pub fn identifier(&self) -> i32 {
        self.identifier
    }

    /// Reads the identifier back out of a received payload.
    pub fn parse_identifier(payload: &PayloadData) -> Option<i32> {
        payload.data().i32_at(FIXED_IDENTIFIER_OFFSET)
    }
}

impl PayloadSupplier for FixedPayloadSupplier {
    fn payload_length(&self) -> usize {
        FIXED_PAYLOAD_LENGTH
    }

    fn payload(&self, _timestamp: PayloadTimestamp) -> PayloadData {
        self.payload.clone()
    }
}
