// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Payload Error Types

use thiserror::Error;

/// Why an identifier could not be derived for a timestamp.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DerivationError {
    #[error("Timestamp {seconds}s is before the derivation epoch")]
    BeforeEpoch { seconds: i64 },

    #[error("Day {day} is outside the provisioned window of {window} days")]
    OutOfWindow { day: usize, window: usize },

    #[error("Derived identifier has {actual} bytes, expected {expected}")]
    IdentifierLength { expected: usize, actual: usize },

    #[error("Random source unavailable")]
    RandomUnavailable,
}

impl DerivationError {
    /// Transient errors clear up on their own (e.g. once the clock is set);
    /// the others need the secret to be reprovisioned or the code fixed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DerivationError::BeforeEpoch { .. })
    }
}

/// Errors building or decoding payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Section value of {length} bytes exceeds the 255 byte limit")]
    SectionTooLong { length: usize },

    #[error("Payload too short: {actual} bytes, expected at least {expected}")]
    TooShort { expected: usize, actual: usize },

    #[error("Unsupported protocol and version byte: {0:#04x}")]
    UnsupportedProtocol(u8),
}
