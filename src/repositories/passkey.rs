use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, UserId};

/// A durable passkey credential owned by exactly one user.
///
/// `credential_id` is stored in canonical form: unpadded base64url of the
/// authenticator-assigned raw id. Every lookup normalizes client input to
/// this form first, so the same credential is never stored under two
/// spellings.
#[derive(Debug, Clone)]
pub struct PasskeyCredential {
    pub user_id: UserId,
    pub credential_id: String,
    /// Opaque public-key material from registration; read-only thereafter.
    pub public_key: Vec<u8>,
    /// Authenticator usage counter; expected to increase on every assertion.
    pub sign_count: u32,
    pub transports: Vec<String>,
    pub backup_eligible: bool,
    pub backup_state: bool,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Fields for persisting a credential at the end of a registration ceremony.
#[derive(Debug, Clone)]
pub struct NewPasskeyCredential {
    pub user_id: UserId,
    pub credential_id: String,
    pub public_key: Vec<u8>,
    pub sign_count: u32,
    pub transports: Vec<String>,
    pub backup_eligible: bool,
    pub backup_state: bool,
}

/// Public projection of a credential, safe to return to clients.
///
/// The public-key material is deliberately excluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialInfo {
    pub credential_id: String,
    pub sign_count: u32,
    pub transports: Vec<String>,
    pub backup_eligible: bool,
    pub backup_state: bool,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl From<&PasskeyCredential> for CredentialInfo {
    fn from(credential: &PasskeyCredential) -> Self {
        Self {
            credential_id: credential.credential_id.clone(),
            sign_count: credential.sign_count,
            transports: credential.transports.clone(),
            backup_eligible: credential.backup_eligible,
            backup_state: credential.backup_state,
            created_at: credential.created_at,
            last_used_at: credential.last_used_at,
        }
    }
}

/// Durable storage for passkey credentials.
#[async_trait]
pub trait PasskeyRepository: Send + Sync + 'static {
    /// Persist a newly registered credential.
    async fn add_credential(
        &self,
        credential: NewPasskeyCredential,
    ) -> Result<PasskeyCredential, Error>;

    /// All credentials owned by a user, newest first.
    async fn credentials_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<PasskeyCredential>, Error>;

    /// A specific credential owned by a user, by canonical credential id.
    async fn find_credential(
        &self,
        user_id: &UserId,
        credential_id: &str,
    ) -> Result<Option<PasskeyCredential>, Error>;

    /// Record a successful authentication: set the sign count to the
    /// verifier-reported value and stamp `last_used_at`.
    ///
    /// Implementations must apply the sign count as a single conditional
    /// update that only moves the counter forward, so a completion racing
    /// with a newer one cannot write a stale count back.
    async fn record_authentication(
        &self,
        credential_id: &str,
        new_sign_count: u32,
        used_at: DateTime<Utc>,
    ) -> Result<(), Error>;
}
