//! Contract for the external cryptographic verification collaborator.
//!
//! COSE key parsing, attestation statement validation and assertion signature
//! checks are delegated to an audited WebAuthn library behind this trait. The
//! coordinator hands it decoded bytes plus the expected challenge, relying
//! party id and origin, and receives either a verified outcome or a detail
//! string; it never needs to understand the formats itself.

use async_trait::async_trait;
use thiserror::Error;

/// Any failure reported by the verification collaborator.
///
/// The coordinator normalizes this into a user-safe verification error; the
/// detail string is the only part that crosses the boundary.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct VerifierError(pub String);

impl VerifierError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }
}

/// Attestation response fields for registration verification.
#[derive(Debug)]
pub struct RegistrationAssertion<'a> {
    pub raw_credential_id: &'a [u8],
    pub attestation_object: &'a [u8],
    pub client_data_json: &'a [u8],
    pub expected_challenge: &'a [u8],
    pub expected_rp_id: &'a str,
    pub expected_origin: &'a str,
}

/// Outcome of successful registration verification.
#[derive(Debug, Clone)]
pub struct VerifiedRegistration {
    /// Credential public key to persist, opaque to this crate.
    pub public_key: Vec<u8>,
    /// Initial authenticator sign count.
    pub sign_count: u32,
}

/// Assertion response fields for authentication verification.
#[derive(Debug)]
pub struct AuthenticationAssertion<'a> {
    pub raw_credential_id: &'a [u8],
    pub authenticator_data: &'a [u8],
    pub client_data_json: &'a [u8],
    pub signature: &'a [u8],
    pub expected_challenge: &'a [u8],
    pub expected_rp_id: &'a str,
    pub expected_origin: &'a str,
    /// Stored public key from registration.
    pub public_key: &'a [u8],
    /// Stored sign count; the verifier must reject assertions whose reported
    /// count does not exceed it (cloned-authenticator detection).
    pub current_sign_count: u32,
}

/// Outcome of successful authentication verification.
#[derive(Debug, Clone)]
pub struct VerifiedAuthentication {
    /// Authenticator-reported sign count to store.
    pub new_sign_count: u32,
}

/// External WebAuthn verification library boundary.
#[async_trait]
pub trait CeremonyVerifier: Send + Sync + 'static {
    async fn verify_registration(
        &self,
        assertion: RegistrationAssertion<'_>,
    ) -> Result<VerifiedRegistration, VerifierError>;

    async fn verify_authentication(
        &self,
        assertion: AuthenticationAssertion<'_>,
    ) -> Result<VerifiedAuthentication, VerifierError>;
}
