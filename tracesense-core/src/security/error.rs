// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Security Error Types

use thiserror::Error;

use super::session::SessionId;

/// Errors raised by key exchange, encryption and session bookkeeping.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecurityError {
    #[error("Random source unavailable")]
    RandomUnavailable,

    #[error("Invalid Diffie-Hellman parameters: {0}")]
    InvalidParameters(String),

    #[error("Malformed key: {0}")]
    MalformedKey(String),

    #[error("Peer public key is outside the valid range")]
    InvalidPublicKey,

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed: data may be corrupted or wrong key")]
    DecryptionFailed,

    #[error("Ciphertext too short")]
    CiphertextTooShort,

    #[error("Malformed session message: {0}")]
    MalformedMessage(String),

    #[error("Unknown session {0}, key exchange required")]
    UnknownSession(SessionId),
}
