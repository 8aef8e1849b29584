// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Diffie-Hellman Key Agreement
//!
//! Finite-field Diffie-Hellman over moduli of up to 128 bits, sized for
//! the short characteristic writes of the device-to-device channel.
//!
//! Keys travel as `[length (4, big-endian)][key bytes]`, with the key
//! padded to the byte width of the prime: 20 bytes for 128-bit parameters.

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::error::SecurityError;
use super::random::RandomSource;
use crate::data::Data;

/// Width of the length prefix on serialized keys.
pub const KEY_LENGTH_PREFIX: usize = 4;

/// 2^128 - 15449, the largest 128-bit safe prime.
pub const SAFE_PRIME_128: u128 = 0xffff_ffff_ffff_ffff_ffff_ffff_ffff_c3a7;

/// Generates the prime-order subgroup of `SAFE_PRIME_128`.
pub const GENERATOR_128: u128 = 2;

const SMALL_PRIMES: [u128; 20] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71,
];

/// Named parameter sets selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParameterStrength {
    #[default]
    #[serde(rename = "128-bit")]
    Bits128,
}

impl ParameterStrength {
    pub fn parameters(self) -> DiffieHellmanParameters {
        match self {
            ParameterStrength::Bits128 => DiffieHellmanParameters::strength_128(),
        }
    }
}

/// Shared prime and generator both peers agree on in advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffieHellmanParameters {
    prime: u128,
    generator: u128,
}

impl DiffieHellmanParameters {
    pub fn new(prime: u128, generator: u128) -> Result<Self, SecurityError> {
        if prime < 5 {
            return Err(SecurityError::InvalidParameters(
                "prime must be at least 5".into(),
            ));
        }
        if !is_probable_prime(prime) {
            return Err(SecurityError::InvalidParameters(
                "modulus is not prime".into(),
            ));
        }
        if generator < 2 || generator > prime - 2 {
            return Err(SecurityError::InvalidParameters(
                "generator must lie in [2, p-2]".into(),
            ));
        }
        Ok(DiffieHellmanParameters { prime, generator })
    }

    /// The fixed 128-bit parameter set.
    pub fn strength_128() -> Self {
        DiffieHellmanParameters {
            prime: SAFE_PRIME_128,
            generator: GENERATOR_128,
        }
    }

    /// Fresh parameters with a random safe prime of `bits` bits.
    ///
    /// The generator is 4, a quadratic residue, so it generates the
    /// subgroup of prime order (p-1)/2.
    pub fn generate(bits: u32, random: &dyn RandomSource) -> Result<Self, SecurityError> {
        if !(8..=128).contains(&bits) {
            return Err(SecurityError::InvalidParameters(format!(
                "unsupported modulus size: {} bits",
                bits
            )));
        }
        let mask = if bits == 128 {
            u128::MAX
        } else {
            (1u128 << bits) - 1
        };
        let top = 1u128 << (bits - 1);

        loop {
            // p = 2q + 1 with p ≡ 3 (mod 4) keeps q odd
            let candidate = (random.next_u128()? & mask) | top | 0b11;
            let q = candidate >> 1;
            if q > 2 && is_probable_prime(q) && is_probable_prime(candidate) {
                return Ok(DiffieHellmanParameters {
                    prime: candidate,
                    generator: 4,
                });
            }
        }
    }

    pub fn prime(&self) -> u128 {
        self.prime
    }

    pub fn generator(&self) -> u128 {
        self.generator
    }

    /// Bytes needed to hold any residue modulo the prime.
    pub fn key_length(&self) -> usize {
        (128 - self.prime.leading_zeros() as usize).div_ceil(8)
    }

    /// Length of a serialized key, prefix included.
    pub fn serialized_key_length(&self) -> usize {
        KEY_LENGTH_PREFIX + self.key_length()
    }
}

// ============================================================
// Key material
// ============================================================

fn encode_key(value: u128, width: usize) -> Data {
    let mut data = Data::new();
    data.append_u32(width as u32);
    data.append_bytes(&value.to_be_bytes()[16 - width..]);
    data
}

fn decode_key(data: &Data) -> Result<u128, SecurityError> {
    let length = data
        .u32_at(0)
        .ok_or_else(|| SecurityError::MalformedKey("missing length prefix".into()))?
        as usize;
    if length > 16 {
        return Err(SecurityError::MalformedKey(format!(
            "{} byte key exceeds 128 bits",
            length
        )));
    }
    let bytes = data
        .subdata(KEY_LENGTH_PREFIX, length)
        .ok_or_else(|| SecurityError::MalformedKey("truncated key".into()))?;

    let mut padded = [0u8; 16];
    padded[16 - length..].copy_from_slice(bytes.as_bytes());
    Ok(u128::from_be_bytes(padded))
}

/// Private half of a key pair. Never transmitted.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyExchangePrivateKey(Data);

impl std::fmt::Debug for KeyExchangePrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyExchangePrivateKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl Drop for KeyExchangePrivateKey {
    fn drop(&mut self) {
        let mut bytes = std::mem::take(&mut self.0).into_bytes();
        bytes.zeroize();
    }
}

impl KeyExchangePrivateKey {
    pub fn from_data(data: Data) -> Result<Self, SecurityError> {
        decode_key(&data)?;
        Ok(KeyExchangePrivateKey(data))
    }

    /// Serialized form, `[length][key bytes]`.
    pub fn as_data(&self) -> &Data {
        &self.0
    }

    fn value(&self) -> Result<u128, SecurityError> {
        decode_key(&self.0)
    }
}

/// Public half of a key pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyExchangePublicKey(Data);

impl KeyExchangePublicKey {
    pub fn from_data(data: Data) -> Result<Self, SecurityError> {
        decode_key(&data)?;
        Ok(KeyExchangePublicKey(data))
    }

    /// Serialized form, `[length][key bytes]`.
    pub fn as_data(&self) -> &Data {
        &self.0
    }

    fn value(&self) -> Result<u128, SecurityError> {
        decode_key(&self.0)
    }
}

/// Secret both peers derive independently.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyExchangeSharedKey(Data);

impl std::fmt::Debug for KeyExchangeSharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyExchangeSharedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl Drop for KeyExchangeSharedKey {
    fn drop(&mut self) {
        let mut bytes = std::mem::take(&mut self.0).into_bytes();
        bytes.zeroize();
    }
}

impl KeyExchangeSharedKey {
    pub fn from_data(data: Data) -> Self {
        KeyExchangeSharedKey(data)
    }

    pub fn as_data(&self) -> &Data {
        &self.0
    }
}

/// Key pair for one handshake attempt.
#[derive(Debug, Clone)]
pub struct KeyExchangeKeyPair {
    pub private_key: KeyExchangePrivateKey,
    pub public_key: KeyExchangePublicKey,
}

/// Key pair generation and shared-key derivation for one parameter set.
#[derive(Debug, Clone, Copy)]
pub struct DiffieHellmanKeyExchange {
    parameters: DiffieHellmanParameters,
}

impl DiffieHellmanKeyExchange {
    pub fn new(parameters: DiffieHellmanParameters) -> Self {
        DiffieHellmanKeyExchange { parameters }
    }

    pub fn parameters(&self) -> &DiffieHellmanParameters {
        &self.parameters
    }

    pub fn key_pair(&self, random: &dyn RandomSource) -> Result<KeyExchangeKeyPair, SecurityError> {
        let p = self.parameters.prime;
        let width = self.parameters.key_length();

        // Private exponent in [2, p-2]
        let private = 2 + random.next_u128()? % (p - 3);
        let public = pow_mod(self.parameters.generator, private, p);

        Ok(KeyExchangeKeyPair {
            private_key: KeyExchangePrivateKey(encode_key(private, width)),
            public_key: KeyExchangePublicKey(encode_key(public, width)),
        })
    }

    pub fn shared_key(
        &self,
        own_private_key: &KeyExchangePrivateKey,
        peer_public_key: &KeyExchangePublicKey,
    ) -> Result<KeyExchangeSharedKey, SecurityError> {
        let p = self.parameters.prime;
        let peer = peer_public_key.value()?;
        // Rejects 0, 1 and p-1, which pin the shared secret to a tiny set
        if peer < 2 || peer > p - 2 {
            return Err(SecurityError::InvalidPublicKey);
        }
        let secret = pow_mod(peer, own_private_key.value()?, p);
        Ok(KeyExchangeSharedKey(encode_key(
            secret,
            self.parameters.key_length(),
        )))
    }
}

// ============================================================
// 128-bit modular arithmetic
// ============================================================

fn add_mod(a: u128, b: u128, m: u128) -> u128 {
    let (sum, overflow) = a.overflowing_add(b);
    if overflow || sum >= m {
        sum.wrapping_sub(m)
    } else {
        sum
    }
}

fn mul_mod(a: u128, b: u128, m: u128) -> u128 {
    let mut a = a % m;
    let mut b = b;
    let mut result = 0;
    while b > 0 {
        if b & 1 == 1 {
            result = add_mod(result, a, m);
        }
        a = add_mod(a, a, m);
        b >>= 1;
    }
    result
}

fn pow_mod(base: u128, exponent: u128, m: u128) -> u128 {
    let mut base = base % m;
    let mut exponent = exponent;
    let mut result = 1 % m;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = mul_mod(result, base, m);
        }
        base = mul_mod(base, base, m);
        exponent >>= 1;
    }
    result
}

/// Miller-Rabin with the first twenty primes as witnesses.
fn is_probable_prime(n: u128) -> bool {
    if n < 2 {
        return false;
    }
    for &p in SMALL_PRIMES.iter() {
        if n == p {
            return true;
        }
        if n % p == 0 {
            return false;
        }
    }

    let mut d = n - 1;
    let mut r = 0;
    while d % 2 == 0 {
        d /= 2;
        r += 1;
    }

    'witness: for &a in SMALL_PRIMES.iter() {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..r {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}
