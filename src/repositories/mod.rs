//! Repository traits for the external data stores the ceremony core depends on.
//!
//! The user directory and the durable credential store are collaborators, not
//! part of this crate: services talk to them through these traits so a
//! database-backed implementation and the in-memory test doubles are
//! interchangeable.

pub mod passkey;
pub mod user;

pub use passkey::{CredentialInfo, NewPasskeyCredential, PasskeyCredential, PasskeyRepository};
pub use user::UserRepository;
