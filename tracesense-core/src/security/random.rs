// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Random Sources
//!
//! Key generation and nonces draw from a `RandomSource` so tests can pin
//! the output. Production code uses the system generator.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use ring::rand::{SecureRandom, SystemRandom};

use super::error::SecurityError;

/// Pluggable source of random bytes.
pub trait RandomSource: Send + Sync {
    fn fill(&self, dest: &mut [u8]) -> Result<(), SecurityError>;

    fn next_u128(&self) -> Result<u128, SecurityError> {
        let mut bytes = [0u8; 16];
        self.fill(&mut bytes)?;
        Ok(u128::from_be_bytes(bytes))
    }
}

/// Operating system CSPRNG.
#[derive(Debug)]
pub struct SystemRandomSource {
    rng: SystemRandom,
}

impl SystemRandomSource {
    pub fn new() -> Self {
        SystemRandomSource {
            rng: SystemRandom::new(),
        }
    }
}

impl Default for SystemRandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRandomSource {
    fn fill(&self, dest: &mut [u8]) -> Result<(), SecurityError> {
        self.rng
            .fill(dest)
            .map_err(|_| SecurityError::RandomUnavailable)
    }
}

/// Deterministic generator for reproducible tests. Not for production.
#[derive(Debug)]
pub struct SeededRandomSource {
    rng: Mutex<StdRng>,
}

impl SeededRandomSource {
    pub fn new(seed: u64) -> Self {
        SeededRandomSource {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandomSource {
    fn fill(&self, dest: &mut [u8]) -> Result<(), SecurityError> {
        self.rng.lock().fill_bytes(dest);
        Ok(())
    }
}
