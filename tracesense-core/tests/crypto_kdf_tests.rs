// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for crypto::kdf

use tracesense_core::crypto::{Hkdf, KdfError};
use tracesense_core::security::{CIPHER_KEY_INFO, SESSION_ID_INFO};

#[test]
fn test_rfc5869_case_1() {
    let ikm = [0x0bu8; 22];
    let salt = hex::decode("000102030405060708090a0b0c").unwrap();
    let info = hex::decode("f0f1f2f3f4f5f6f7f8f9").unwrap();

    let prk = Hkdf::extract(Some(salt.as_slice()), &ikm);
    assert_eq!(
        hex::encode(prk),
        "077709362c2e32df0ddc3f0dc47bba6390b6c73bb50f9c3122ec844ad7c2b3e5"
    );

    let okm = Hkdf::expand(&prk, &info, 42).unwrap();
    assert_eq!(
        hex::encode(okm),
        "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf34007208d5b887185865"
    );
}

#[test]
fn test_rfc5869_case_3_missing_salt() {
    let ikm = [0x0bu8; 22];
    let prk = Hkdf::extract(None, &ikm);
    assert_eq!(
        hex::encode(prk),
        "19ef24a32c717b167f33a91d6f648bdf96596776afdb6377ac434c1c293ccb04"
    );
    assert_eq!(Hkdf::extract(Some(&[][..]), &ikm), prk);

    let okm = Hkdf::expand(&prk, &[], 42).unwrap();
    assert_eq!(
        hex::encode(okm),
        "8da4e775a563c18f715f802a063c5a31b8a11f5c5ee1879ec3454e5f3c738d2d9d201395faa4b61a96c8"
    );
}

#[test]
fn test_derive_key_is_first_block() {
    let shared = b"00000010 shared secret";
    let long = Hkdf::derive(None, shared, CIPHER_KEY_INFO, 64).unwrap();
    let key = Hkdf::derive_key(None, shared, CIPHER_KEY_INFO);
    assert_eq!(&long[..32], &key[..]);
}

#[test]
fn test_cipher_key_and_session_id_separated() {
    let shared = b"same shared secret";
    assert_ne!(CIPHER_KEY_INFO, SESSION_ID_INFO);
    assert_ne!(
        Hkdf::derive_key(None, shared, CIPHER_KEY_INFO)[..16],
        Hkdf::derive_key(None, shared, SESSION_ID_INFO)[..16]
    );
}

#[test]
fn test_salt_changes_output() {
    let shared = b"same shared secret";
    assert_ne!(
        Hkdf::derive_key(Some(&b"salt1"[..]), shared, CIPHER_KEY_INFO),
        Hkdf::derive_key(Some(&b"salt2"[..]), shared, CIPHER_KEY_INFO)
    );
}

#[test]
fn test_output_length_limits() {
    let prk = [0u8; 32];
    assert!(Hkdf::expand(&prk, b"x", 0).unwrap().is_empty());
    assert_eq!(Hkdf::expand(&prk, b"x", 255 * 32).unwrap().len(), 8160);
    assert_eq!(Hkdf::expand(&prk, b"x", 8161), Err(KdfError::OutputTooLong));
}
