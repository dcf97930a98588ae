//! Services orchestrating repositories, stores and collaborators.

pub mod ceremony;

pub use ceremony::{
    AuthenticationAttempt, AuthenticationSuccess, CeremonyBegin, CeremonyConfig,
    CeremonyCoordinator, RegistrationAttempt,
};
