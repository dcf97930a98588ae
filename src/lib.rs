//! WebAuthn (FIDO2) ceremony core.
//!
//! This crate coordinates passkey registration and authentication ceremonies
//! for a relying party: it issues and consumes single-use challenges, rate
//! limits ceremony attempts, validates base64-encoded client payloads and
//! drives the external cryptographic verifier and credential store through
//! completion.
//!
//! The cryptographic primitives themselves (COSE keys, attestation and
//! assertion verification) live behind [`verifier::CeremonyVerifier`], the
//! user directory and credential storage behind the traits in
//! [`repositories`], and token minting behind [`tokens::TokenIssuer`]. The
//! crate owns only the ceremony state machine in
//! [`services::CeremonyCoordinator`] and the process-local stores it leans
//! on: [`challenge::ChallengeStore`] and [`rate_limit::RateLimiter`].

pub mod challenge;
pub mod error;
pub mod id;
pub mod options;
pub mod rate_limit;
pub mod repositories;
pub mod services;
pub mod tokens;
pub mod user;
pub mod validation;
pub mod verifier;

pub use challenge::{CeremonyKind, Challenge, ChallengeId, ChallengeStore};
pub use error::Error;
pub use rate_limit::RateLimiter;
pub use services::{
    AuthenticationAttempt, AuthenticationSuccess, CeremonyBegin, CeremonyConfig,
    CeremonyCoordinator, RegistrationAttempt,
};
pub use user::{User, UserId};
