// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Device-to-Device Security
//!
//! Diffie-Hellman key agreement, AES-128-GCM and per-peer session
//! bookkeeping for payloads exchanged directly between two devices.

pub mod diffie_hellman;
pub mod encryption;
pub mod error;
pub mod integrity;
pub mod random;
pub mod session;

pub use diffie_hellman::{
    DiffieHellmanKeyExchange, DiffieHellmanParameters, KeyExchangeKeyPair, KeyExchangePrivateKey,
    KeyExchangePublicKey, KeyExchangeSharedKey, ParameterStrength,
};
pub use encryption::{decrypt, encrypt, CIPHER_KEY_INFO};
pub use error::SecurityError;
pub use random::{RandomSource, SeededRandomSource, SystemRandomSource};
pub use session::{SecureSession, SessionId, SESSION_ID_INFO, SESSION_ID_LENGTH};
