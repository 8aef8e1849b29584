// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Advert Pattern Filter
//!
//! Recognises devices that run a different protocol on the same advert
//! channel so the sensor neither double counts them nor tries to connect.
//!
//! Patterns are hex strings anchored at the start of a message, one
//! character per nibble, with `.` matching any character. A leading `^`
//! is accepted and ignored. Patterns are compiled once and the compiled
//! set is read-only afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::advert::{extract_messages, AdvertRecord, MessageFraming, MANUFACTURER_APPLE};
use crate::data::Data;

/// Pattern compilation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Empty pattern")]
    EmptyPattern,

    #[error("Invalid character {character:?} at position {position} in pattern {pattern:?}")]
    InvalidCharacter {
        pattern: String,
        character: char,
        position: usize,
    },
}

/// One compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePattern {
    source: String,
    /// `None` is a wildcard
    nibbles: Vec<Option<u8>>,
}

impl MessagePattern {
    pub fn compile(pattern: &str) -> Result<Self, FilterError> {
        let body = pattern.strip_prefix('^').unwrap_or(pattern);
        if body.is_empty() {
            return Err(FilterError::EmptyPattern);
        }

        let nibbles = body
            .chars()
            .enumerate()
            .map(|(position, character)| match character {
                '.' => Ok(None),
                c => c
                    .to_digit(16)
                    .map(|n| Some(n as u8))
                    .ok_or_else(|| FilterError::InvalidCharacter {
                        pattern: pattern.to_string(),
                        character: c,
                        position,
                    }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MessagePattern {
            source: pattern.to_string(),
            nibbles,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Matches against the hex representation of `message`.
    pub fn matches(&self, message: &Data) -> bool {
        self.matches_hex(&message.hex_encoded())
    }

    /// Matches against a hex string; non-hex characters only match wildcards.
    pub fn matches_hex(&self, message: &str) -> bool {
        let mut characters = message.chars();
        self.nibbles.iter().all(|expected| match characters.next() {
            None => false,
            Some(c) => match expected {
                None => true,
                Some(nibble) => c.to_digit(16) == Some(*nibble as u32),
            },
        })
    }
}

/// Default signatures of co-resident protocols on Apple manufacturer data.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    "^10....04",
    "^10....14",
    "^0100000000000000000000000000000000",
    "^05",
    "^07",
    "^09",
    "^0C",
    "^0D",
    "^0F",
];

/// Which manufacturer data to inspect and what to ignore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvertFilterConfig {
    pub manufacturer_id: u16,
    pub framing: MessageFraming,
    pub ignore_patterns: Vec<String>,
}

impl Default for AdvertFilterConfig {
    fn default() -> Self {
        Self {
            manufacturer_id: MANUFACTURER_APPLE,
            framing: MessageFraming::TypeLength,
            ignore_patterns: DEFAULT_IGNORE_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl AdvertFilterConfig {
    pub fn with_manufacturer_id(mut self, manufacturer_id: u16) -> Self {
        self.manufacturer_id = manufacturer_id;
        self
    }

    pub fn with_framing(mut self, framing: MessageFraming) -> Self {
        self.framing = framing;
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }
}

/// Compiled pattern set.
#[derive(Debug, Clone)]
pub struct PatternFilter {
    manufacturer_id: u16,
    framing: MessageFraming,
    patterns: Vec<MessagePattern>,
}

impl PatternFilter {
    /// Compiles `patterns` for Apple manufacturer data with type-length framing.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, FilterError> {
        Ok(PatternFilter {
            manufacturer_id: MANUFACTURER_APPLE,
            framing: MessageFraming::TypeLength,
            patterns: patterns
                .iter()
                .map(|p| MessagePattern::compile(p.as_ref()))
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn from_config(config: &AdvertFilterConfig) -> Result<Self, FilterError> {
        let mut filter = Self::new(config.ignore_patterns.as_slice())?;
        filter.manufacturer_id = config.manufacturer_id;
        filter.framing = config.framing;
        Ok(filter)
    }

    pub fn patterns(&self) -> &[MessagePattern] {
        &self.patterns
    }

    /// First pattern matching `message`, if any.
    pub fn matching_pattern(&self, message: &Data) -> Option<&MessagePattern> {
        let hex = message.hex_encoded();
        self.patterns.iter().find(|p| p.matches_hex(&hex))
    }

    pub fn matches_any(&self, messages: &[Data]) -> bool {
        messages.iter().any(|m| self.matching_pattern(m).is_some())
    }

    /// True when `record` carries a message of an ignored protocol.
    ///
    /// Both the individual vendor messages and each whole manufacturer
    /// data block are tested, since some signatures span the full block.
    pub fn should_ignore(&self, record: &AdvertRecord) -> bool {
        let segments = record.manufacturer_data(Some(self.manufacturer_id));
        if segments.is_empty() {
            return false;
        }
        let messages = extract_messages(&segments, self.framing);
        if self.matches_any(&messages) {
            return true;
        }
        segments
            .iter()
            .any(|segment| self.matching_pattern(&segment.data).is_some())
    }
}
