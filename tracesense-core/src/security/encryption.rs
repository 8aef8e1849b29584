// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Symmetric Encryption (AES-128-GCM)
//!
//! The cipher key is the first 16 bytes of HKDF-SHA256 over the shared
//! key agreed by Diffie-Hellman, with `CIPHER_KEY_INFO` as the info
//! string. Every message gets a fresh 96-bit nonce from the caller's
//! `RandomSource`, so encrypting the same plaintext twice
//! yields different ciphertext.
//!
//! Ciphertext format: `nonce (12 bytes) || ciphertext || tag (16 bytes)`

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_128_GCM};
use zeroize::Zeroize;

use super::diffie_hellman::KeyExchangeSharedKey;
use super::error::SecurityError;
use super::random::RandomSource;
use crate::crypto::kdf::Hkdf;
use crate::data::Data;

/// Nonce size for AES-GCM (96 bits = 12 bytes).
const NONCE_SIZE: usize = 12;
/// Authentication tag size.
const TAG_SIZE: usize = 16;
/// AES-128 key size.
const CIPHER_KEY_SIZE: usize = 16;

/// HKDF info for the message cipher key.
pub const CIPHER_KEY_INFO: &[u8] = b"Tracesense_Cipher_Key";

/// 128-bit cipher key derived from a shared key.
struct CipherKey {
    bytes: [u8; CIPHER_KEY_SIZE],
}

impl Drop for CipherKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl CipherKey {
    fn derive(shared_key: &KeyExchangeSharedKey) -> Self {
        let mut okm = Hkdf::derive_key(None, shared_key.as_data().as_bytes(), CIPHER_KEY_INFO);
        let mut bytes = [0u8; CIPHER_KEY_SIZE];
        bytes.copy_from_slice(&okm[..CIPHER_KEY_SIZE]);
        okm.zeroize();
        CipherKey { bytes }
    }

    fn aead_key(&self) -> Result<LessSafeKey, SecurityError> {
        let unbound =
            UnboundKey::new(&AES_128_GCM, &self.bytes).map_err(|_| SecurityError::EncryptionFailed)?;
        Ok(LessSafeKey::new(unbound))
    }
}

/// Encrypts `plaintext` under `shared_key`.
pub fn encrypt(
    shared_key: &KeyExchangeSharedKey,
    plaintext: &Data,
    random: &dyn RandomSource,
) -> Result<Data, SecurityError> {
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    random.fill(&mut nonce_bytes)?;

    let key = CipherKey::derive(shared_key).aead_key()?;
    let mut in_out = plaintext.as_bytes().to_vec();
    key.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(nonce_bytes),
        Aad::empty(),
        &mut in_out,
    )
    .map_err(|_| SecurityError::EncryptionFailed)?;

    let mut output = Data::from(nonce_bytes);
    output.append_bytes(&in_out);
    Ok(output)
}

/// Decrypts data produced by `encrypt`.
pub fn decrypt(shared_key: &KeyExchangeSharedKey, ciphertext: &Data) -> Result<Data, SecurityError> {
    let bytes = ciphertext.as_bytes();
    if bytes.len() < NONCE_SIZE + TAG_SIZE {
        return Err(SecurityError::CiphertextTooShort);
    }

    let nonce_bytes: [u8; NONCE_SIZE] = bytes[..NONCE_SIZE]
        .try_into()
        .map_err(|_| SecurityError::DecryptionFailed)?;
    let key = CipherKey::derive(shared_key)
        .aead_key()
        .map_err(|_| SecurityError::DecryptionFailed)?;

    let mut buffer = bytes[NONCE_SIZE..].to_vec();
    let plaintext = key
        .open_in_place(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::empty(),
            &mut buffer,
        )
        .map_err(|_| SecurityError::DecryptionFailed)?;

    Ok(Data::from(&*plaintext))
}
