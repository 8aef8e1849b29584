// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! HKDF Key Derivation Function
//!
//! HMAC-based Extract-and-Expand Key Derivation Function (RFC 5869) over
//! HMAC-SHA256. Turns a Diffie-Hellman shared secret into the values a
//! session needs, one `info` string per value.

use ring::hmac;
use thiserror::Error;

/// HMAC-SHA256 output length.
const HASH_LEN: usize = 32;

/// Largest output RFC 5869 allows for SHA-256.
const MAX_OUTPUT: usize = 255 * HASH_LEN;

/// KDF error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KdfError {
    #[error("Output length exceeds maximum (255 * hash_len)")]
    OutputTooLong,
}

/// HKDF-SHA256 key derivation.
pub struct Hkdf;

impl Hkdf {
    /// PRK = HMAC-SHA256(salt, IKM); a missing salt is HashLen zeros.
    pub fn extract(salt: Option<&[u8]>, ikm: &[u8]) -> [u8; HASH_LEN] {
        let default_salt = [0u8; HASH_LEN];
        let key = hmac::Key::new(hmac::HMAC_SHA256, salt.unwrap_or(&default_salt));
        let mut prk = [0u8; HASH_LEN];
        prk.copy_from_slice(hmac::sign(&key, ikm).as_ref());
        prk
    }

    /// OKM = T(1) || T(2) || ... truncated to `length`,
    /// where T(i) = HMAC-SHA256(PRK, T(i-1) || info || i).
    pub fn expand(prk: &[u8; HASH_LEN], info: &[u8], length: usize) -> Result<Vec<u8>, KdfError> {
        if length > MAX_OUTPUT {
            return Err(KdfError::OutputTooLong);
        }

        let key = hmac::Key::new(hmac::HMAC_SHA256, prk);
        let mut okm = Vec::with_capacity(length.div_ceil(HASH_LEN) * HASH_LEN);
        let mut previous: Vec<u8> = Vec::new();

        for i in 1..=length.div_ceil(HASH_LEN) {
            let mut context = hmac::Context::with_key(&key);
            context.update(&previous);
            context.update(info);
            context.update(&[i as u8]);
            previous = context.sign().as_ref().to_vec();
            okm.extend_from_slice(&previous);
        }

        okm.truncate(length);
        Ok(okm)
    }

    /// Extract-then-Expand in one step.
    pub fn derive(
        salt: Option<&[u8]>,
        ikm: &[u8],
        info: &[u8],
        length: usize,
    ) -> Result<Vec<u8>, KdfError> {
        Self::expand(&Self::extract(salt, ikm), info, length)
    }

    /// Derives a single 32-byte key, which is exactly T(1).
    pub fn derive_key(salt: Option<&[u8]>, ikm: &[u8], info: &[u8]) -> [u8; HASH_LEN] {
        let prk = Self::extract(salt, ikm);
        let key = hmac::Key::new(hmac::HMAC_SHA256, &prk);
        let mut context = hmac::Context::with_key(&key);
        context.update(info);
        context.update(&[1u8]);
        let mut out = [0u8; HASH_LEN];
        out.copy_from_slice(context.sign().as_ref());
        out
    }
}
