//! Wire structs for ceremony options returned by the "begin" endpoints.
//!
//! Field names follow the WebAuthn JSON conventions browsers expect
//! (camelCase). Challenge bytes and user handles are standard base64;
//! credential descriptor ids keep the canonical base64url form the
//! credentials are stored under.

use base64::{Engine, prelude::BASE64_STANDARD};
use serde::{Deserialize, Serialize};

/// Default client-side ceremony timeout, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u32 = 60_000;

/// COSE algorithm identifiers offered at registration: ES256, Ed25519, RS256.
pub const SUPPORTED_ALGORITHMS: [i32; 3] = [-7, -8, -257];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelyingParty {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    /// Standard base64 of the user handle bytes.
    pub id: String,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubKeyCredParam {
    #[serde(rename = "type")]
    pub credential_type: String,
    pub alg: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialDescriptor {
    #[serde(rename = "type")]
    pub credential_type: String,
    /// Canonical unpadded base64url credential id.
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub transports: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserVerification {
    Required,
    Preferred,
    Discouraged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<String>,
    pub require_resident_key: bool,
    pub user_verification: UserVerification,
}

impl Default for AuthenticatorSelection {
    fn default() -> Self {
        Self {
            authenticator_attachment: None,
            require_resident_key: false,
            // "preferred" keeps older authenticators usable while still
            // soliciting verification where available.
            user_verification: UserVerification::Preferred,
        }
    }
}

/// Options payload for `navigator.credentials.create()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptions {
    /// Standard base64 of the challenge nonce.
    pub challenge: String,
    pub rp: RelyingParty,
    pub user: UserEntity,
    pub pub_key_cred_params: Vec<PubKeyCredParam>,
    pub timeout: u32,
    pub exclude_credentials: Vec<CredentialDescriptor>,
    pub authenticator_selection: AuthenticatorSelection,
    pub attestation: String,
}

impl RegistrationOptions {
    pub fn new(
        challenge: &[u8],
        rp: RelyingParty,
        username: &str,
        display_name: &str,
        timeout: u32,
    ) -> Self {
        Self {
            challenge: BASE64_STANDARD.encode(challenge),
            rp,
            user: UserEntity {
                // The username bytes double as the opaque user handle.
                id: BASE64_STANDARD.encode(username.as_bytes()),
                name: username.to_string(),
                display_name: display_name.to_string(),
            },
            pub_key_cred_params: SUPPORTED_ALGORITHMS
                .iter()
                .map(|&alg| PubKeyCredParam {
                    credential_type: "public-key".to_string(),
                    alg,
                })
                .collect(),
            timeout,
            exclude_credentials: Vec::new(),
            authenticator_selection: AuthenticatorSelection::default(),
            attestation: "none".to_string(),
        }
    }
}

/// Options payload for `navigator.credentials.get()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationOptions {
    /// Standard base64 of the challenge nonce.
    pub challenge: String,
    pub rp_id: String,
    pub allow_credentials: Vec<CredentialDescriptor>,
    pub user_verification: UserVerification,
    pub timeout: u32,
}

impl AuthenticationOptions {
    pub fn new(
        challenge: &[u8],
        rp_id: &str,
        allow_credentials: Vec<CredentialDescriptor>,
        timeout: u32,
    ) -> Self {
        Self {
            challenge: BASE64_STANDARD.encode(challenge),
            rp_id: rp_id.to_string(),
            allow_credentials,
            user_verification: UserVerification::Preferred,
            timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_options_shape() {
        let options = RegistrationOptions::new(
            &[1u8; 32],
            RelyingParty {
                name: "Example".to_string(),
                id: "example.com".to_string(),
            },
            "alice",
            "Alice",
            DEFAULT_TIMEOUT_MS,
        );

        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["rp"]["id"], "example.com");
        assert_eq!(json["user"]["displayName"], "Alice");
        assert_eq!(json["attestation"], "none");
        assert_eq!(json["authenticatorSelection"]["userVerification"], "preferred");
        assert_eq!(json["pubKeyCredParams"][0]["alg"], -7);
        assert_eq!(json["timeout"], 60_000);

        // Challenge round-trips through standard base64
        let decoded = BASE64_STANDARD
            .decode(json["challenge"].as_str().unwrap())
            .unwrap();
        assert_eq!(decoded, vec![1u8; 32]);
    }

    #[test]
    fn test_user_handle_is_username_bytes() {
        let options = RegistrationOptions::new(
            &[0u8; 32],
            RelyingParty {
                name: "Example".to_string(),
                id: "example.com".to_string(),
            },
            "alice",
            "alice",
            DEFAULT_TIMEOUT_MS,
        );
        let handle = BASE64_STANDARD.decode(&options.user.id).unwrap();
        assert_eq!(handle, b"alice");
    }

    #[test]
    fn test_authentication_options_shape() {
        let options = AuthenticationOptions::new(
            &[2u8; 32],
            "example.com",
            vec![CredentialDescriptor {
                credential_type: "public-key".to_string(),
                id: "q83vEjRWeJ".to_string(),
                transports: vec!["usb".to_string(), "internal".to_string()],
            }],
            DEFAULT_TIMEOUT_MS,
        );

        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["rpId"], "example.com");
        assert_eq!(json["userVerification"], "preferred");
        assert_eq!(json["allowCredentials"][0]["type"], "public-key");
        assert_eq!(json["allowCredentials"][0]["id"], "q83vEjRWeJ");
        assert_eq!(json["allowCredentials"][0]["transports"][1], "internal");
    }

    #[test]
    fn test_empty_transports_omitted() {
        let descriptor = CredentialDescriptor {
            credential_type: "public-key".to_string(),
            id: "abc".to_string(),
            transports: Vec::new(),
        };
        let json = serde_json::to_string(&descriptor).unwrap();
        assert!(!json.contains("transports"));
    }
}
