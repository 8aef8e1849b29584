// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Content integrity checks using SHA-256

use ring::digest::{Context, SHA256};

use crate::data::Data;

/// SHA-256 digest of `data`.
///
/// # Example
/// ```
/// use tracesense_core::data::Data;
/// use tracesense_core::security::integrity::hash;
///
/// let digest = hash(&Data::from(&b"hello world"[..]));
/// assert_eq!(digest.len(), 32);
/// ```
pub fn hash(data: &Data) -> Data {
    let mut context = Context::new(&SHA256);
    context.update(data.as_bytes());
    Data::from(context.finish().as_ref())
}

/// Returns true when `expected` is the SHA-256 digest of `data`.
pub fn verify(data: &Data, expected: &Data) -> bool {
    hash(data) == *expected
}
