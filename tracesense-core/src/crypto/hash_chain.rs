// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Hash Chains
//!
//! Forward-secure derivation of pseudo-random sequences from a single seed.
//! A chain is walked from the far end towards index 0: the last value costs
//! one hash, the first costs `count` hashes. Only a truncation of each
//! hash is ever handed out, so a published value cannot be fed back into
//! the chain to compute the values that follow it.

use ring::digest::{digest, SHA256};

/// Length of a SHA-256 digest in bytes.
pub const HASH_LENGTH: usize = 32;

/// A full SHA-256 digest.
pub type Hash = [u8; HASH_LENGTH];

/// h(x): SHA-256.
pub fn h(data: &[u8]) -> Hash {
    let mut out = [0u8; HASH_LENGTH];
    out.copy_from_slice(digest(&SHA256, data).as_ref());
    out
}

/// t(x): first half of `data`.
pub fn t(data: &[u8]) -> &[u8] {
    &data[..data.len() / 2]
}

/// t(x, n): first `n` bytes of `data` (all of it when shorter).
pub fn t_n(data: &[u8], n: usize) -> &[u8] {
    &data[..n.min(data.len())]
}

/// xor(a, b): byte-wise XOR over the shorter of the two inputs.
pub fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect()
}

/// First eight bytes of a digest as a big-endian integer.
pub fn truncate_to_u64(hash: &Hash) -> u64 {
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash[..8]);
    u64::from_be_bytes(prefix)
}

/// Derives `count` values from `seed`.
///
/// hash = h(seed); for i = count-1 down to 0: value[i] = project(hash),
/// hash = h(hash). Exactly one hash application per produced value.
pub fn derive_sequence<T>(seed: &[u8], count: usize, project: impl Fn(&Hash) -> T) -> Vec<T> {
    let mut values = Vec::with_capacity(count);
    let mut hash = h(seed);
    for _ in 0..count {
        values.push(project(&hash));
        hash = h(&hash);
    }
    // Produced from the far end, so index 0 ends up last
    values.reverse();
    values
}

/// `derive_sequence` projected onto 64-bit truncations.
pub fn derive_u64_sequence(seed: &[u8], count: usize) -> Vec<u64> {
    derive_sequence(seed, count, truncate_to_u64)
}

/// Derives a truncating seed chain of `count + 1` links.
///
/// chain[count] = h(seed); chain[i] = h(t(chain[i + 1])). Each step
/// discards half of the previous digest before hashing again.
pub fn derive_seed_chain(seed: &[u8], count: usize) -> Vec<Hash> {
    let mut chain = Vec::with_capacity(count + 1);
    let mut link = h(seed);
    chain.push(link);
    for _ in 0..count {
        link = h(t(&link));
        chain.push(link);
    }
    chain.reverse();
    chain
}
