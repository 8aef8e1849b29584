// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod hash_chain;
pub mod kdf;

pub use hash_chain::{
    derive_seed_chain, derive_sequence, derive_u64_sequence, truncate_to_u64, Hash, HASH_LENGTH,
};
pub use kdf::{Hkdf, KdfError};
