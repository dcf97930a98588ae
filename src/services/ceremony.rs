//! WebAuthn ceremony coordination.
//!
//! The coordinator owns the begin/complete state machine for registration and
//! authentication ceremonies: it issues challenges, enforces rate limits,
//! decodes client payloads, calls the cryptographic verifier and updates the
//! credential store. Each ceremony moves `Began -> Completed`,
//! `Began -> Failed` or `Began -> Expired`, and its challenge is consumed
//! exactly once regardless of outcome; a failed completion always requires a
//! fresh "begin".
//!
//! # Thread Safety
//!
//! The coordinator is shared across request handlers. The challenge store and
//! rate limiter handle their own synchronization, and no store guard is held
//! across repository or verifier calls.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Error, User,
    challenge::{Challenge, ChallengeId, ChallengeStore, CeremonyKind},
    error::{NotFoundError, RateLimitedError, VerificationFailedError},
    id::generate_challenge,
    options::{
        AuthenticationOptions, CredentialDescriptor, DEFAULT_TIMEOUT_MS, RegistrationOptions,
        RelyingParty,
    },
    rate_limit::RateLimiter,
    repositories::{CredentialInfo, NewPasskeyCredential, PasskeyRepository, UserRepository},
    tokens::{TokenIssuer, TokenPair},
    validation::{
        decode_base64url_padded, decode_standard, encode_base64url_unpadded, validate_encoded,
        validate_encoded_url_safe, validate_username,
    },
    verifier::{AuthenticationAssertion, CeremonyVerifier, RegistrationAssertion},
};

const OP_AUTHENTICATE_BEGIN: &str = "authenticate_begin";
const OP_AUTHENTICATE_COMPLETE: &str = "authenticate_complete";

/// Relying-party identity and ceremony policy.
#[derive(Debug, Clone)]
pub struct CeremonyConfig {
    pub rp_id: String,
    pub rp_name: String,
    pub rp_origin: String,
    /// Unconsumed challenges older than this are swept.
    pub challenge_ttl: Duration,
    /// Client-side timeout advertised in ceremony options, in milliseconds.
    pub timeout_ms: u32,
    /// Attempt budget per rate-limited operation and username.
    pub max_attempts: usize,
    pub rate_limit_window: Duration,
}

impl CeremonyConfig {
    pub fn new(
        rp_id: impl Into<String>,
        rp_name: impl Into<String>,
        rp_origin: impl Into<String>,
    ) -> Self {
        Self {
            rp_id: rp_id.into(),
            rp_name: rp_name.into(),
            rp_origin: rp_origin.into(),
            challenge_ttl: Duration::minutes(10),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_attempts: 5,
            rate_limit_window: Duration::minutes(5),
        }
    }

    pub fn with_challenge_ttl(mut self, ttl: Duration) -> Self {
        self.challenge_ttl = ttl;
        self
    }

    pub fn with_rate_limit(mut self, max_attempts: usize, window: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.rate_limit_window = window;
        self
    }
}

/// Response to a "begin" call: options for the client-side ceremony plus the
/// id the server trusts on completion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CeremonyBegin<O> {
    pub options: O,
    pub challenge_id: ChallengeId,
}

/// Client payload completing a registration ceremony.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationAttempt {
    pub challenge_id: String,
    pub username: String,
    /// base64url, padding optional.
    pub credential_id: String,
    /// Standard base64.
    pub attestation_object: String,
    /// Standard base64.
    pub client_data_json: String,
    #[serde(default)]
    pub transports: Vec<String>,
    #[serde(default)]
    pub backup_eligible: bool,
    #[serde(default)]
    pub backup_state: bool,
}

/// Client payload completing an authentication ceremony.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationAttempt {
    pub challenge_id: String,
    pub username: String,
    /// base64url, padding optional.
    pub credential_id: String,
    /// Standard base64.
    pub authenticator_data: String,
    /// Standard base64.
    pub client_data_json: String,
    /// Standard base64.
    pub signature: String,
}

/// Result of a completed authentication ceremony.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticationSuccess {
    pub user: User,
    pub tokens: TokenPair,
}

/// Orchestrates passkey registration and authentication ceremonies.
pub struct CeremonyCoordinator<U, P, V, T>
where
    U: UserRepository,
    P: PasskeyRepository,
    V: CeremonyVerifier,
    T: TokenIssuer,
{
    users: Arc<U>,
    passkeys: Arc<P>,
    verifier: Arc<V>,
    tokens: Arc<T>,
    challenges: Arc<ChallengeStore>,
    rate_limiter: Arc<RateLimiter>,
    config: CeremonyConfig,
}

impl<U, P, V, T> CeremonyCoordinator<U, P, V, T>
where
    U: UserRepository,
    P: PasskeyRepository,
    V: CeremonyVerifier,
    T: TokenIssuer,
{
    pub fn new(
        users: Arc<U>,
        passkeys: Arc<P>,
        verifier: Arc<V>,
        tokens: Arc<T>,
        challenges: Arc<ChallengeStore>,
        rate_limiter: Arc<RateLimiter>,
        config: CeremonyConfig,
    ) -> Self {
        Self {
            users,
            passkeys,
            verifier,
            tokens,
            challenges,
            rate_limiter,
            config,
        }
    }

    pub fn config(&self) -> &CeremonyConfig {
        &self.config
    }

    /// Begin a registration ceremony for an existing user.
    pub async fn begin_registration(
        &self,
        username: &str,
        display_name: Option<&str>,
    ) -> Result<CeremonyBegin<RegistrationOptions>, Error> {
        validate_username(username)?;

        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(NotFoundError::User)?;

        let challenge = generate_challenge();
        let options = RegistrationOptions::new(
            &challenge,
            RelyingParty {
                name: self.config.rp_name.clone(),
                id: self.config.rp_id.clone(),
            },
            username,
            display_name.unwrap_or(username),
            self.config.timeout_ms,
        );

        let challenge_id = ChallengeId::new_random();
        self.challenges.insert(
            challenge_id.clone(),
            Challenge::new(challenge, username, CeremonyKind::Registration),
        );

        tracing::info!(user_id = %user.id, ceremony = %challenge_id, "began passkey registration");

        Ok(CeremonyBegin {
            options,
            challenge_id,
        })
    }

    /// Complete a registration ceremony, persisting the verified credential.
    pub async fn complete_registration(
        &self,
        attempt: RegistrationAttempt,
    ) -> Result<CredentialInfo, Error> {
        let stored = self.consume_challenge(
            &attempt.challenge_id,
            &attempt.username,
            CeremonyKind::Registration,
        )?;

        // The stored username is authoritative for resolving the user.
        let user = self
            .users
            .find_by_username(&stored.username)
            .await?
            .ok_or(NotFoundError::User)?;

        let raw_id = decode_base64url_padded("credential_id", &attempt.credential_id)?;
        let canonical_id = encode_base64url_unpadded(&raw_id);
        let attestation_object = decode_standard("attestation_object", &attempt.attestation_object)?;
        let client_data_json = decode_standard("client_data_json", &attempt.client_data_json)?;

        let verified = self
            .verifier
            .verify_registration(RegistrationAssertion {
                raw_credential_id: &raw_id,
                attestation_object: &attestation_object,
                client_data_json: &client_data_json,
                expected_challenge: &stored.challenge,
                expected_rp_id: &self.config.rp_id,
                expected_origin: &self.config.rp_origin,
            })
            .await
            .map_err(|e| {
                tracing::warn!(username = %stored.username, error = %e, "registration verification failed");
                VerificationFailedError::Registration(e.to_string())
            })?;

        let credential = self
            .passkeys
            .add_credential(NewPasskeyCredential {
                user_id: user.id.clone(),
                credential_id: canonical_id,
                public_key: verified.public_key,
                sign_count: verified.sign_count,
                transports: attempt.transports,
                backup_eligible: attempt.backup_eligible,
                backup_state: attempt.backup_state,
            })
            .await?;

        tracing::info!(
            user_id = %user.id,
            credential_id = %credential.credential_id,
            "registered passkey credential"
        );

        Ok(CredentialInfo::from(&credential))
    }

    /// Begin an authentication ceremony for a user with registered passkeys.
    pub async fn begin_authentication(
        &self,
        username: &str,
    ) -> Result<CeremonyBegin<AuthenticationOptions>, Error> {
        self.sweep_expired();
        validate_username(username)?;
        self.admit(OP_AUTHENTICATE_BEGIN, username)?;

        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(NotFoundError::User)?;

        let credentials = self.passkeys.credentials_for_user(&user.id).await?;
        if credentials.is_empty() {
            return Err(NotFoundError::NoCredentials.into());
        }

        let allow_credentials = credentials
            .iter()
            .map(|credential| CredentialDescriptor {
                credential_type: "public-key".to_string(),
                id: credential.credential_id.clone(),
                transports: credential.transports.clone(),
            })
            .collect();

        let challenge = generate_challenge();
        let options = AuthenticationOptions::new(
            &challenge,
            &self.config.rp_id,
            allow_credentials,
            self.config.timeout_ms,
        );

        let challenge_id = ChallengeId::new_random();
        self.challenges.insert(
            challenge_id.clone(),
            Challenge::new(challenge, username, CeremonyKind::Authentication),
        );

        tracing::info!(user_id = %user.id, ceremony = %challenge_id, "began passkey authentication");

        Ok(CeremonyBegin {
            options,
            challenge_id,
        })
    }

    /// Complete an authentication ceremony, returning the user and a fresh
    /// token pair.
    pub async fn complete_authentication(
        &self,
        attempt: AuthenticationAttempt,
    ) -> Result<AuthenticationSuccess, Error> {
        self.sweep_expired();
        validate_username(&attempt.username)?;

        // First malformed field short-circuits with its own error.
        validate_encoded_url_safe("credential_id", &attempt.credential_id)?;
        validate_encoded("authenticator_data", &attempt.authenticator_data)?;
        validate_encoded("client_data_json", &attempt.client_data_json)?;
        validate_encoded("signature", &attempt.signature)?;

        self.admit(OP_AUTHENTICATE_COMPLETE, &attempt.username)?;

        let stored = self.consume_challenge(
            &attempt.challenge_id,
            &attempt.username,
            CeremonyKind::Authentication,
        )?;

        let user = self
            .users
            .find_by_username(&stored.username)
            .await?
            .ok_or(NotFoundError::User)?;

        let raw_id = decode_base64url_padded("credential_id", &attempt.credential_id)?;
        let canonical_id = encode_base64url_unpadded(&raw_id);

        let credential = self
            .passkeys
            .find_credential(&user.id, &canonical_id)
            .await?
            .ok_or(NotFoundError::Credential)?;

        let authenticator_data = decode_standard("authenticator_data", &attempt.authenticator_data)?;
        let client_data_json = decode_standard("client_data_json", &attempt.client_data_json)?;
        let signature = decode_standard("signature", &attempt.signature)?;

        let verified = self
            .verifier
            .verify_authentication(AuthenticationAssertion {
                raw_credential_id: &raw_id,
                authenticator_data: &authenticator_data,
                client_data_json: &client_data_json,
                signature: &signature,
                expected_challenge: &stored.challenge,
                expected_rp_id: &self.config.rp_id,
                expected_origin: &self.config.rp_origin,
                public_key: &credential.public_key,
                current_sign_count: credential.sign_count,
            })
            .await
            .map_err(|e| {
                tracing::warn!(user_id = %user.id, error = %e, "authentication verification failed");
                VerificationFailedError::Authentication(e.to_string())
            })?;

        self.passkeys
            .record_authentication(&canonical_id, verified.new_sign_count, Utc::now())
            .await?;

        let tokens = self.tokens.issue_tokens(&user).await?;

        tracing::info!(
            user_id = %user.id,
            credential_id = %credential.credential_id,
            sign_count = verified.new_sign_count,
            "passkey authentication succeeded"
        );

        Ok(AuthenticationSuccess { user, tokens })
    }

    /// Consume the stored challenge and check it matches the attempt.
    ///
    /// A kind or username mismatch reports the same invalid-challenge error
    /// as an unknown id, so callers cannot probe which part was wrong. The
    /// challenge is gone either way.
    fn consume_challenge(
        &self,
        challenge_id: &str,
        username: &str,
        kind: CeremonyKind,
    ) -> Result<Challenge, Error> {
        let stored = self
            .challenges
            .consume(&ChallengeId::new(challenge_id))
            .ok_or(NotFoundError::Challenge)?;

        if stored.is_expired(self.config.challenge_ttl)
            || stored.kind != kind
            || stored.username != username
        {
            return Err(NotFoundError::Challenge.into());
        }

        Ok(stored)
    }

    fn admit(&self, operation: &str, username: &str) -> Result<(), Error> {
        if self.rate_limiter.admit(
            operation,
            username,
            self.config.max_attempts,
            self.config.rate_limit_window,
        ) {
            Ok(())
        } else {
            tracing::warn!(operation, username, "rate limited ceremony attempt");
            Err(RateLimitedError {
                operation: operation.to_string(),
            }
            .into())
        }
    }

    fn sweep_expired(&self) {
        let removed = self.challenges.sweep_expired(self.config.challenge_ttl);
        if removed > 0 {
            tracing::debug!(count = removed, "swept expired ceremony challenges");
        }
        self.rate_limiter.sweep_idle(self.config.rate_limit_window);
    }
}
