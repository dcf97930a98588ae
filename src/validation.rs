//! Input validation for ceremony payloads.
//!
//! All binary WebAuthn fields travel as base64 text. Authenticator data,
//! client data and signatures use the standard alphabet; credential ids use
//! base64url, usually without padding. Browsers and authenticators are strict
//! about which alphabet each field uses, so the two are validated separately
//! and never interchangeably.

use std::sync::LazyLock;

use base64::{
    Engine,
    prelude::{BASE64_STANDARD, BASE64_URL_SAFE, BASE64_URL_SAFE_NO_PAD},
};
use regex::Regex;

use crate::error::ValidationError;

/// Username charset and length per the upstream user directory's rules:
/// letters, digits and `@ . + - _`, at most 150 characters.
static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]{1,150}$").expect("invalid username regex"));

/// Validate a username before it is used as a ceremony or rate-limit key.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::MissingField(
            "username cannot be empty".to_string(),
        ));
    }

    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::InvalidUsername(username.to_string()))
    }
}

/// Validate that `value` is non-empty standard base64 decoding to at least
/// one byte. The error carries the offending field name.
pub fn validate_encoded(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingField(format!(
            "{field} cannot be empty"
        )));
    }

    match BASE64_STANDARD.decode(value) {
        Ok(decoded) if decoded.is_empty() => Err(ValidationError::InvalidEncoding {
            field: field.to_string(),
            reason: "decoded to empty data".to_string(),
        }),
        Ok(_) => Ok(()),
        Err(e) => Err(ValidationError::InvalidEncoding {
            field: field.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Same contract as [`validate_encoded`] for base64url fields, accepting
/// unpadded input.
pub fn validate_encoded_url_safe(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingField(format!(
            "{field} cannot be empty"
        )));
    }

    match decode_base64url_padded(field, value) {
        Ok(decoded) if decoded.is_empty() => Err(ValidationError::InvalidEncoding {
            field: field.to_string(),
            reason: "decoded to empty data".to_string(),
        }),
        Ok(_) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Decode a standard-base64 field, tagging failures with the field name.
pub fn decode_standard(field: &str, value: &str) -> Result<Vec<u8>, ValidationError> {
    BASE64_STANDARD
        .decode(value)
        .map_err(|e| ValidationError::InvalidEncoding {
            field: field.to_string(),
            reason: e.to_string(),
        })
}

/// Decode base64url after normalizing padding; clients routinely strip the
/// trailing `=` from credential ids.
pub fn decode_base64url_padded(field: &str, value: &str) -> Result<Vec<u8>, ValidationError> {
    let mut padded = value.to_string();
    let remainder = padded.len() % 4;
    if remainder != 0 {
        padded.extend(std::iter::repeat_n('=', 4 - remainder));
    }

    BASE64_URL_SAFE
        .decode(&padded)
        .map_err(|e| ValidationError::InvalidEncoding {
            field: field.to_string(),
            reason: e.to_string(),
        })
}

/// Canonical encoding for stored credential ids: base64url without padding.
pub fn encode_base64url_unpadded(bytes: &[u8]) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}
