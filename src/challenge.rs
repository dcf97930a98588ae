//! In-flight ceremony challenge storage.
//!
//! A [`Challenge`] binds one server-generated nonce to one username and one
//! ceremony kind for the duration of a single begin/complete exchange. The
//! [`ChallengeStore`] is process-local shared state: entries are consumed
//! exactly once (success or failure) or reaped by the expiry sweep. Absence
//! is the normal signal for "invalid or expired challenge", not a fault.
//!
//! A deployment that scales horizontally must replace this store with a
//! shared backend offering atomic get-and-delete, such as Redis.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::id::{generate_prefixed_id, validate_prefixed_id};

/// Which half of the protocol a challenge was issued for.
///
/// A challenge issued for registration must never complete an authentication
/// ceremony, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyKind {
    Registration,
    Authentication,
}

/// Opaque handle correlating a "begin" response with its "complete" request.
///
/// Carries 128 bits of entropy; the raw challenge nonce is never the
/// correlation key the server trusts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChallengeId(String);

impl ChallengeId {
    pub fn new(id: &str) -> Self {
        ChallengeId(id.to_string())
    }

    pub fn new_random() -> Self {
        ChallengeId(generate_prefixed_id("cer"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "cer")
    }
}

impl From<&str> for ChallengeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One in-flight ceremony challenge.
#[derive(Debug, Clone)]
pub struct Challenge {
    /// Raw server-generated nonce the authenticator signs over.
    pub challenge: Vec<u8>,
    /// Username the ceremony is bound to; authoritative on completion.
    pub username: String,
    pub kind: CeremonyKind,
    pub created_at: DateTime<Utc>,
}

impl Challenge {
    pub fn new(challenge: Vec<u8>, username: &str, kind: CeremonyKind) -> Self {
        Self {
            challenge,
            username: username.to_string(),
            kind,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, max_age: Duration) -> bool {
        Utc::now() - self.created_at > max_age
    }
}

/// Process-wide store of in-flight challenges keyed by [`ChallengeId`].
///
/// Backed by a sharded concurrent map so `consume` is an atomic
/// retrieve-and-remove: of two completions racing on the same id, exactly one
/// observes the challenge.
#[derive(Default)]
pub struct ChallengeStore {
    entries: DashMap<ChallengeId, Challenge>,
}

impl ChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a challenge. Overwrites silently if the id collides; ids carry
    /// enough randomness that a collision indicates a broken generator.
    pub fn insert(&self, id: ChallengeId, challenge: Challenge) {
        self.entries.insert(id, challenge);
    }

    /// Look up a challenge without consuming it.
    pub fn get(&self, id: &ChallengeId) -> Option<Challenge> {
        self.entries.get(id).map(|entry| entry.clone())
    }

    /// Atomically retrieve and remove a challenge.
    pub fn consume(&self, id: &ChallengeId) -> Option<Challenge> {
        self.entries.remove(id).map(|(_, challenge)| challenge)
    }

    /// Remove all entries older than `max_age`, returning how many were
    /// removed. Safe to run concurrently with `insert` and `consume`.
    pub fn sweep_expired(&self, max_age: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, challenge| !challenge.is_expired(max_age));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
