// SPDX-FileCopyrightText: 2026 Tracesense Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Connectionless Secure Sessions
//!
//! A four-message exchange over one-way characteristic writes:
//!
//! 1. A reads B's public key (`read_public_key`).
//! 2. A seals a payload for B with a fresh key pair (`write_encrypted_data`).
//! 3. B opens it with its own private key (`receive_encrypted_data`),
//!    establishing the session.
//! 4. B replies under the session (`read_encrypted_data`) and A opens the
//!    reply with `receive_encrypted_data`.
//!
//! Both peers derive the session ID from the shared key with HKDF under
//! `SESSION_ID_INFO`, so it never has to be negotiated and is unrelated
//! to the cipher key derived from the same secret.
//!
//! Wire format:
//! - handshake: `0x01 || sender public key || sealed`
//! - session:   `0x02 || session id (16 bytes) || sealed`

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::diffie_hellman::{
    DiffieHellmanKeyExchange, DiffieHellmanParameters, KeyExchangeKeyPair, KeyExchangePublicKey,
    KeyExchangeSharedKey, KEY_LENGTH_PREFIX,
};
use super::encryption::{decrypt, encrypt};
use super::error::SecurityError;
use super::random::{RandomSource, SystemRandomSource};
use crate::crypto::kdf::Hkdf;
use crate::data::Data;

/// Message tag of a handshake.
const TAG_HANDSHAKE: u8 = 0x01;
/// Message tag of a message inside an established session.
const TAG_SESSION: u8 = 0x02;

/// Session ID width.
pub const SESSION_ID_LENGTH: usize = 16;

/// HKDF info for the session ID.
pub const SESSION_ID_INFO: &[u8] = b"Tracesense_Session_Id";

/// Identifies one encrypted exchange with a peer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId([u8; SESSION_ID_LENGTH]);

impl SessionId {
    /// The ID both peers of `shared_key` arrive at.
    pub fn from_shared_key(shared_key: &KeyExchangeSharedKey) -> Self {
        let okm = Hkdf::derive_key(None, shared_key.as_data().as_bytes(), SESSION_ID_INFO);
        let mut id = [0u8; SESSION_ID_LENGTH];
        id.copy_from_slice(&okm[..SESSION_ID_LENGTH]);
        SessionId(id)
    }

    pub fn from_bytes(bytes: [u8; SESSION_ID_LENGTH]) -> Self {
        SessionId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SESSION_ID_LENGTH] {
        &self.0
    }
}

impl std::fmt::Debug for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionId({})", hex::encode(self.0))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

struct SessionEntry {
    shared_key: KeyExchangeSharedKey,
    established_at: Instant,
}

/// Per-device session table plus the device's receiving key pair.
pub struct SecureSession {
    exchange: DiffieHellmanKeyExchange,
    key_pair: RwLock<KeyExchangeKeyPair>,
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
    random: Arc<dyn RandomSource>,
}

impl SecureSession {
    /// Creates a session endpoint backed by the system random generator.
    pub fn new(parameters: DiffieHellmanParameters) -> Result<Self, SecurityError> {
        Self::with_random(parameters, Arc::new(SystemRandomSource::new()))
    }

    /// Creates a session endpoint with an explicit random source.
    pub fn with_random(
        parameters: DiffieHellmanParameters,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self, SecurityError> {
        let exchange = DiffieHellmanKeyExchange::new(parameters);
        let key_pair = exchange.key_pair(random.as_ref())?;
        Ok(SecureSession {
            exchange,
            key_pair: RwLock::new(key_pair),
            sessions: RwLock::new(HashMap::new()),
            random,
        })
    }

    pub fn parameters(&self) -> &DiffieHellmanParameters {
        self.exchange.parameters()
    }

    /// Our serialized public key, for a peer to start a handshake with.
    pub fn read_public_key(&self) -> Data {
        self.key_pair.read().public_key.as_data().clone()
    }

    /// Starts a session with the peer owning `peer_public_key` and seals
    /// `data` for it. Returns the session ID and the handshake message.
    pub fn write_encrypted_data(
        &self,
        peer_public_key: &Data,
        data: &Data,
    ) -> Result<(SessionId, Data), SecurityError> {
        let peer = KeyExchangePublicKey::from_data(peer_public_key.clone())?;
        let ephemeral = self.exchange.key_pair(self.random.as_ref())?;
        let shared_key = self.exchange.shared_key(&ephemeral.private_key, &peer)?;

        let sealed = encrypt(&shared_key, data, self.random.as_ref())?;
        let session_id = self.insert(shared_key);

        let mut message = Data::new();
        message.append_u8(TAG_HANDSHAKE);
        message.append(ephemeral.public_key.as_data());
        message.append(&sealed);
        Ok((session_id, message))
    }

    /// Opens a handshake or session message from a peer.
    pub fn receive_encrypted_data(&self, data: &Data) -> Result<(SessionId, Data), SecurityError> {
        match data.u8_at(0) {
            Some(TAG_HANDSHAKE) => self.receive_handshake(data),
            Some(TAG_SESSION) => self.receive_session_message(data),
            Some(tag) => Err(SecurityError::MalformedMessage(format!(
                "unknown message tag {:#04x}",
                tag
            ))),
            None => Err(SecurityError::MalformedMessage("empty message".into())),
        }
    }

    /// Seals `data` for the peer of an established session.
    pub fn read_encrypted_data(
        &self,
        session_id: &SessionId,
        data: &Data,
    ) -> Result<Data, SecurityError> {
        let sessions = self.sessions.read();
        let entry = sessions
            .get(session_id)
            .ok_or(SecurityError::UnknownSession(*session_id))?;
        let sealed = encrypt(&entry.shared_key, data, self.random.as_ref())?;

        let mut message = Data::new();
        message.append_u8(TAG_SESSION);
        message.append_bytes(session_id.as_bytes());
        message.append(&sealed);
        Ok(message)
    }

    pub fn has_session(&self, session_id: &SessionId) -> bool {
        self.sessions.read().contains_key(session_id)
    }

    pub fn remove_session(&self, session_id: &SessionId) -> bool {
        self.sessions.write().remove(session_id).is_some()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// When `session_id` was established, if it is known.
    pub fn established_at(&self, session_id: &SessionId) -> Option<Instant> {
        self.sessions
            .read()
            .get(session_id)
            .map(|entry| entry.established_at)
    }

    /// Drops every session established at least `max_age` ago and returns
    /// how many were dropped. Initiators never hear back from some peers,
    /// so their table only shrinks through this.
    pub fn prune_older_than(&self, max_age: Duration) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, entry| entry.established_at.elapsed() < max_age);
        let pruned = before - sessions.len();
        if pruned > 0 {
            debug!("Pruned {} sessions older than {:?}", pruned, max_age);
        }
        pruned
    }

    /// Replaces our receiving key pair. Existing sessions are kept.
    pub fn rotate_key_pair(&self) -> Result<(), SecurityError> {
        let key_pair = self.exchange.key_pair(self.random.as_ref())?;
        *self.key_pair.write() = key_pair;
        Ok(())
    }

    fn insert(&self, shared_key: KeyExchangeSharedKey) -> SessionId {
        let session_id = SessionId::from_shared_key(&shared_key);
        self.sessions
            .write()
            .entry(session_id)
            .or_insert_with(|| {
                debug!("Session {} established", session_id);
                SessionEntry {
                    shared_key,
                    established_at: Instant::now(),
                }
            });
        session_id
    }

    fn receive_handshake(&self, data: &Data) -> Result<(SessionId, Data), SecurityError> {
        let key_length = data
            .u32_at(1)
            .ok_or_else(|| SecurityError::MalformedMessage("missing sender key".into()))?
            as usize;
        let sender_key = KEY_LENGTH_PREFIX
            .checked_add(key_length)
            .and_then(|length| data.subdata(1, length))
            .ok_or_else(|| SecurityError::MalformedMessage("truncated sender key".into()))?;
        let sealed = data.subdata_from(1 + sender_key.len()).unwrap_or_default();

        let sender = KeyExchangePublicKey::from_data(sender_key)?;
        let shared_key = {
            let key_pair = self.key_pair.read();
            self.exchange.shared_key(&key_pair.private_key, &sender)?
        };

        let plaintext = decrypt(&shared_key, &sealed).inspect_err(|e| {
            warn!("Handshake could not be opened: {}", e);
        })?;
        let session_id = self.insert(shared_key);
        Ok((session_id, plaintext))
    }

    fn receive_session_message(&self, data: &Data) -> Result<(SessionId, Data), SecurityError> {
        let id_bytes: [u8; SESSION_ID_LENGTH] = data
            .subdata(1, SESSION_ID_LENGTH)
            .and_then(|id| id.as_bytes().try_into().ok())
            .ok_or_else(|| SecurityError::MalformedMessage("truncated session id".into()))?;
        let session_id = SessionId(id_bytes);
        let sealed = data
            .subdata_from(1 + SESSION_ID_LENGTH)
            .unwrap_or_default();

        let sessions = self.sessions.read();
        let entry = sessions
            .get(&session_id)
            .ok_or(SecurityError::UnknownSession(session_id))?;
        let plaintext = decrypt(&entry.shared_key, &sealed)?;
        Ok((session_id, plaintext))
    }
}
