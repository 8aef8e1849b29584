// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sensor Configuration
//!
//! One JSON document configures the derivation calendar, the payload
//! header, the advert filter and the session parameters. Missing fields
//! fall back to their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ble::filter::{AdvertFilterConfig, MessagePattern};
use crate::payload::supplier::{DerivationConfig, PayloadHeader, SECONDS_PER_DAY};
use crate::security::diffie_hellman::ParameterStrength;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Session parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub strength: ParameterStrength,
}

/// Complete sensor configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub derivation: DerivationConfig,
    pub payload: PayloadHeader,
    pub advert_filter: AdvertFilterConfig,
    pub security: SecurityConfig,
}

impl SensorConfig {
    /// Parses and validates a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SensorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_derivation(mut self, derivation: DerivationConfig) -> Self {
        self.derivation = derivation;
        self
    }

    pub fn with_payload(mut self, payload: PayloadHeader) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_advert_filter(mut self, advert_filter: AdvertFilterConfig) -> Self {
        self.advert_filter = advert_filter;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let derivation = &self.derivation;
        if derivation.days == 0 {
            return Err(ConfigError::Invalid("days must be positive".into()));
        }
        if derivation.periods_per_day == 0
            || SECONDS_PER_DAY % derivation.periods_per_day as i64 != 0
        {
            return Err(ConfigError::Invalid(format!(
                "periods_per_day must divide {} seconds, got {}",
                SECONDS_PER_DAY, derivation.periods_per_day
            )));
        }
        if !self.payload.transmit_power.is_finite() {
            return Err(ConfigError::Invalid("transmit_power must be finite".into()));
        }
        for pattern in &self.advert_filter.ignore_patterns {
            MessagePattern::compile(pattern)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(())
    }
}
