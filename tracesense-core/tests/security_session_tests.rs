// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for security::session
//! Four-message exchange between two devices

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracesense_core::data::Data;
use tracesense_core::security::*;

fn endpoint() -> SecureSession {
    SecureSession::new(DiffieHellmanParameters::strength_128()).unwrap()
}

fn text(s: &str) -> Data {
    Data::from(s.as_bytes())
}

#[test]
fn test_public_key_width() {
    assert_eq!(endpoint().read_public_key().len(), 20);
}

#[test]
fn test_full_exchange() {
    let alice = endpoint();
    let bob = endpoint();

    // 1. Alice reads Bob's public key
    let bob_public = bob.read_public_key();

    // 2. Alice seals a request for Bob
    let (alice_session, handshake) = alice
        .write_encrypted_data(&bob_public, &text("hello bob"))
        .unwrap();
    assert_eq!(handshake.u8_at(0), Some(0x01));

    // 3. Bob opens it
    let (bob_session, request) = bob.receive_encrypted_data(&handshake).unwrap();
    assert_eq!(request, text("hello bob"));
    assert_eq!(alice_session, bob_session);

    // 4. Bob replies under the session and Alice opens it
    let reply = bob.read_encrypted_data(&bob_session, &text("hello alice")).unwrap();
    assert_eq!(reply.u8_at(0), Some(0x02));
    assert_eq!(
        reply.subdata(1, SESSION_ID_LENGTH).unwrap().as_bytes(),
        bob_session.as_bytes()
    );
    let (session, response) = alice.receive_encrypted_data(&reply).unwrap();
    assert_eq!(session, alice_session);
    assert_eq!(response, text("hello alice"));
}

#[test]
fn test_session_reused_in_both_directions() {
    let alice = endpoint();
    let bob = endpoint();
    let (id, handshake) = alice
        .write_encrypted_data(&bob.read_public_key(), &text("one"))
        .unwrap();
    bob.receive_encrypted_data(&handshake).unwrap();

    let from_alice = alice.read_encrypted_data(&id, &text("two")).unwrap();
    assert_eq!(bob.receive_encrypted_data(&from_alice).unwrap().1, text("two"));
    assert_eq!(alice.session_count(), 1);
    assert_eq!(bob.session_count(), 1);
    assert!(bob.has_session(&id));
    assert!(bob.established_at(&id).is_some());
}

#[test]
fn test_unknown_session() {
    let alice = endpoint();
    let bob = endpoint();
    let stranger = endpoint();

    let (id, handshake) = alice
        .write_encrypted_data(&bob.read_public_key(), &text("hi"))
        .unwrap();
    bob.receive_encrypted_data(&handshake).unwrap();
    let reply = bob.read_encrypted_data(&id, &text("reply")).unwrap();

    assert_eq!(
        stranger.receive_encrypted_data(&reply),
        Err(SecurityError::UnknownSession(id))
    );
    assert_eq!(
        stranger.read_encrypted_data(&id, &text("x")),
        Err(SecurityError::UnknownSession(id))
    );
}

#[test]
fn test_handshake_for_someone_else_fails() {
    let alice = endpoint();
    let bob = endpoint();
    let eve = endpoint();
    let (_, handshake) = alice
        .write_encrypted_data(&bob.read_public_key(), &text("secret"))
        .unwrap();
    assert_eq!(
        eve.receive_encrypted_data(&handshake),
        Err(SecurityError::DecryptionFailed)
    );
    assert_eq!(eve.session_count(), 0);
}

#[test]
fn test_tampered_handshake_fails() {
    let alice = endpoint();
    let bob = endpoint();
    let (_, handshake) = alice
        .write_encrypted_data(&bob.read_public_key(), &text("secret"))
        .unwrap();
    let mut bytes = handshake.into_bytes();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x80;
    assert_eq!(
        bob.receive_encrypted_data(&Data::from(bytes)),
        Err(SecurityError::DecryptionFailed)
    );
}

#[test]
fn test_malformed_messages() {
    let bob = endpoint();
    assert!(matches!(
        bob.receive_encrypted_data(&Data::new()),
        Err(SecurityError::MalformedMessage(_))
    ));
    assert!(matches!(
        bob.receive_encrypted_data(&Data::from_hex("07AABB").unwrap()),
        Err(SecurityError::MalformedMessage(_))
    ));
    assert!(matches!(
        bob.receive_encrypted_data(&Data::from_hex("01000000").unwrap()),
        Err(SecurityError::MalformedMessage(_))
    ));
    assert!(matches!(
        bob.receive_encrypted_data(&Data::from_hex("01FFFFFFFF00").unwrap()),
        Err(SecurityError::MalformedMessage(_))
    ));
    assert!(matches!(
        bob.receive_encrypted_data(&Data::from_hex("020102").unwrap()),
        Err(SecurityError::MalformedMessage(_))
    ));
}

#[test]
fn test_invalid_peer_key() {
    let alice = endpoint();
    assert!(alice
        .write_encrypted_data(&Data::from_hex("00000010").unwrap(), &text("x"))
        .is_err());
}

#[test]
fn test_remove_session() {
    let alice = endpoint();
    let bob = endpoint();
    let (id, _) = alice
        .write_encrypted_data(&bob.read_public_key(), &text("x"))
        .unwrap();
    assert!(alice.remove_session(&id));
    assert!(!alice.remove_session(&id));
    assert!(!alice.has_session(&id));
}

#[test]
fn test_rotate_key_pair_keeps_sessions() {
    let alice = endpoint();
    let bob = endpoint();
    let (id, handshake) = alice
        .write_encrypted_data(&bob.read_public_key(), &text("x"))
        .unwrap();
    bob.receive_encrypted_data(&handshake).unwrap();

    let before = bob.read_public_key();
    bob.rotate_key_pair().unwrap();
    assert_ne!(before, bob.read_public_key());
    assert!(bob.has_session(&id));

    // Handshakes sealed for the old key no longer open
    let (_, stale) = alice.write_encrypted_data(&before, &text("y")).unwrap();
    assert!(bob.receive_encrypted_data(&stale).is_err());
}

#[test]
fn test_seeded_sessions_reproducible() {
    let params = DiffieHellmanParameters::strength_128();
    let a = SecureSession::with_random(params, Arc::new(SeededRandomSource::new(9))).unwrap();
    let b = SecureSession::with_random(params, Arc::new(SeededRandomSource::new(9))).unwrap();
    assert_eq!(a.read_public_key(), b.read_public_key());

    let peer = endpoint().read_public_key();
    let (id_a, message_a) = a.write_encrypted_data(&peer, &text("same")).unwrap();
    let (id_b, message_b) = b.write_encrypted_data(&peer, &text("same")).unwrap();
    assert_eq!(id_a, id_b);
    assert_eq!(message_a, message_b);
}

#[test]
fn test_session_id_display() {
    let id = SessionId::from_bytes([0xab; SESSION_ID_LENGTH]);
    assert_eq!(id.to_string(), "ab".repeat(16));
    assert_eq!(format!("{:?}", id), format!("SessionId({})", "ab".repeat(16)));
}

#[test]
fn test_session_id_derived_from_shared_key() {
    let params = DiffieHellmanParameters::strength_128();
    let exchange = DiffieHellmanKeyExchange::new(params);
    let bob = SecureSession::with_random(params, Arc::new(SeededRandomSource::new(5))).unwrap();
    let bob_pair = exchange.key_pair(&SeededRandomSource::new(5)).unwrap();
    assert_eq!(&bob.read_public_key(), bob_pair.public_key.as_data());

    let alice = SecureSession::with_random(params, Arc::new(SeededRandomSource::new(6))).unwrap();
    let (id, _) = alice
        .write_encrypted_data(&bob.read_public_key(), &text("x"))
        .unwrap();

    // Alice's stream: her own key pair, then the ephemeral one
    let alice_random = SeededRandomSource::new(6);
    exchange.key_pair(&alice_random).unwrap();
    let ephemeral = exchange.key_pair(&alice_random).unwrap();
    let shared = exchange
        .shared_key(&ephemeral.private_key, &bob_pair.public_key)
        .unwrap();

    assert_eq!(id, SessionId::from_shared_key(&shared));
    let digest = tracesense_core::security::integrity::hash(shared.as_data());
    assert_ne!(id.as_bytes()[..], digest.as_bytes()[..SESSION_ID_LENGTH]);
}

#[test]
fn test_prune_older_than() {
    let alice = endpoint();
    let bob = endpoint();
    let (id, _) = alice
        .write_encrypted_data(&bob.read_public_key(), &text("one"))
        .unwrap();
    alice
        .write_encrypted_data(&bob.read_public_key(), &text("two"))
        .unwrap();
    assert_eq!(alice.session_count(), 2);

    assert_eq!(alice.prune_older_than(Duration::from_secs(3600)), 0);
    assert!(alice.has_session(&id));

    assert_eq!(alice.prune_older_than(Duration::ZERO), 2);
    assert_eq!(alice.session_count(), 0);
    assert_eq!(
        alice.read_encrypted_data(&id, &text("late")),
        Err(SecurityError::UnknownSession(id))
    );
}

// ============================================================
// Concurrent peers
// ============================================================

#[test]
fn test_concurrent_handshakes_with_one_responder() {
    let bob = Arc::new(endpoint());
    let bob_public = bob.read_public_key();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let bob = Arc::clone(&bob);
            let bob_public = bob_public.clone();
            thread::spawn(move || {
                let alice = endpoint();
                let request = text(&format!("request {}", i));
                let (alice_id, handshake) =
                    alice.write_encrypted_data(&bob_public, &request).unwrap();

                let (bob_id, received) = bob.receive_encrypted_data(&handshake).unwrap();
                assert_eq!(received, request);
                assert_eq!(bob_id, alice_id);

                let reply = text(&format!("reply {}", i));
                let sealed = bob.read_encrypted_data(&bob_id, &reply).unwrap();
                let (_, opened) = alice.receive_encrypted_data(&sealed).unwrap();
                assert_eq!(opened, reply);
                bob_id
            })
        })
        .collect();

    let ids: Vec<SessionId> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(bob.session_count(), 8);
    for id in &ids {
        assert!(bob.has_session(id));
    }
}

#[test]
fn test_concurrent_initiators_share_one_endpoint() {
    let alice = Arc::new(endpoint());
    let peers: Vec<_> = (0..8).map(|_| Arc::new(endpoint())).collect();

    let handles: Vec<_> = peers
        .iter()
        .enumerate()
        .map(|(i, peer)| {
            let alice = Arc::clone(&alice);
            let peer = Arc::clone(peer);
            thread::spawn(move || {
                let message = text(&format!("hello {}", i));
                let (id, handshake) = alice
                    .write_encrypted_data(&peer.read_public_key(), &message)
                    .unwrap();
                assert_eq!(peer.receive_encrypted_data(&handshake).unwrap().1, message);
                id
            })
        })
        .collect();

    for handle in handles {
        let id = handle.join().unwrap();
        assert!(alice.has_session(&id));
    }
    assert_eq!(alice.session_count(), 8);
}
