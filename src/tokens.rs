//! Session token issuance after successful authentication.
//!
//! Token minting is a collaborator of the ceremony core; [`TokenIssuer`] is
//! the seam and [`JwtTokenIssuer`] the stateless HS256 implementation,
//! issuing the access/refresh pair callers expect.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{Error, User, error::TokenError};

/// Access/refresh token pair handed to a freshly authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Token issuance collaborator.
#[async_trait]
pub trait TokenIssuer: Send + Sync + 'static {
    async fn issue_tokens(&self, user: &User) -> Result<TokenPair, Error>;
}

/// Configuration for [`JwtTokenIssuer`].
#[derive(Debug, Clone)]
pub struct JwtConfig {
    secret: Vec<u8>,
    issuer: Option<String>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtConfig {
    pub fn new_hs256(secret: Vec<u8>) -> Self {
        Self {
            secret,
            issuer: None,
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }
}

/// Claims carried by both tokens; `token_use` distinguishes the two.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    pub iat: i64,
    pub exp: i64,
    pub token_use: String,
}

/// Stateless JWT issuer: no storage, tokens expire on their own.
pub struct JwtTokenIssuer {
    config: JwtConfig,
}

impl JwtTokenIssuer {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    fn mint(&self, user: &User, token_use: &str, ttl: Duration) -> Result<String, Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            iss: self.config.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            token_use: token_use.to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.config.secret),
        )
        .map_err(|e| Error::Token(TokenError::Signing(e.to_string())))
    }

    /// Decode and verify a token, returning its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, Error> {
        let mut validation = Validation::default();
        if let Some(issuer) = &self.config.issuer {
            validation.set_issuer(&[issuer]);
        }

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.config.secret),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| Error::Token(TokenError::Verification(e.to_string())))
    }
}

#[async_trait]
impl TokenIssuer for JwtTokenIssuer {
    async fn issue_tokens(&self, user: &User) -> Result<TokenPair, Error> {
        Ok(TokenPair {
            access: self.mint(user, "access", self.config.access_ttl)?,
            refresh: self.mint(user, "refresh", self.config.refresh_ttl)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserId;

    const TEST_SECRET: &[u8] = b"test_secret_key_for_hs256_tokens_not_for_production_use";

    fn test_user() -> User {
        User {
            id: UserId::new_random(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            first_name: None,
            last_name: None,
            joined_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_issue_and_verify() {
        let issuer = JwtTokenIssuer::new(
            JwtConfig::new_hs256(TEST_SECRET.to_vec()).with_issuer("portico-test"),
        );
        let user = test_user();

        let tokens = issuer.issue_tokens(&user).await.unwrap();
        assert_ne!(tokens.access, tokens.refresh);

        let access = issuer.verify(&tokens.access).unwrap();
        assert_eq!(access.sub, user.id.to_string());
        assert_eq!(access.token_use, "access");
        assert_eq!(access.iss.as_deref(), Some("portico-test"));

        let refresh = issuer.verify(&tokens.refresh).unwrap();
        assert_eq!(refresh.token_use, "refresh");
        assert!(refresh.exp > access.exp);
    }

    #[tokio::test]
    async fn test_verify_rejects_wrong_secret() {
        let issuer = JwtTokenIssuer::new(JwtConfig::new_hs256(TEST_SECRET.to_vec()));
        let other = JwtTokenIssuer::new(JwtConfig::new_hs256(b"different secret".to_vec()));

        let tokens = issuer.issue_tokens(&test_user()).await.unwrap();
        let result = other.verify(&tokens.access);
        assert!(matches!(result, Err(Error::Token(TokenError::Verification(_)))));
    }

    #[tokio::test]
    async fn test_verify_rejects_expired() {
        let issuer = JwtTokenIssuer::new(
            JwtConfig::new_hs256(TEST_SECRET.to_vec()).with_access_ttl(Duration::minutes(-5)),
        );

        let tokens = issuer.issue_tokens(&test_user()).await.unwrap();
        assert!(issuer.verify(&tokens.access).is_err());
    }

    #[tokio::test]
    async fn test_verify_rejects_garbage() {
        let issuer = JwtTokenIssuer::new(JwtConfig::new_hs256(TEST_SECRET.to_vec()));
        assert!(issuer.verify("not.a.jwt").is_err());
    }
}
