use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(#[from] NotFoundError),

    #[error("Rate limited: {0}")]
    RateLimited(#[from] RateLimitedError),

    #[error("Verification error: {0}")]
    Verification(#[from] VerificationFailedError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Invalid {field}: {reason}")]
    InvalidEncoding { field: String, reason: String },

    #[error("Invalid username: {0}")]
    InvalidUsername(String),
}

#[derive(Debug, Error)]
pub enum NotFoundError {
    #[error("User not found")]
    User,

    #[error("Credential not found")]
    Credential,

    #[error("No passkey credentials found for this user")]
    NoCredentials,

    #[error("Invalid or expired challenge")]
    Challenge,
}

#[derive(Debug, Error)]
#[error("Too many {operation} attempts, please try again later")]
pub struct RateLimitedError {
    pub operation: String,
}

#[derive(Debug, Error)]
pub enum VerificationFailedError {
    #[error("Registration verification failed: {0}")]
    Registration(String),

    #[error("Authentication verification failed: {0}")]
    Authentication(String),
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT signing failed: {0}")]
    Signing(String),

    #[error("JWT verification failed: {0}")]
    Verification(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl Error {
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited(_))
    }

    pub fn is_verification_failure(&self) -> bool {
        matches!(self, Error::Verification(_))
    }
}
