use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use super::ServiceAccountKey;
use crate::domain::errors::AuthError;
use crate::domain::ports::TokenExchanger;
use crate::domain::value_objects::Credential;

pub const MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for the signed assertion (the maximum Google accepts)
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Exchanges a self-signed RS256 assertion for an OAuth access token
pub struct ServiceAccountExchanger {
    client: reqwest::Client,
    issuer: String,
    token_uri: String,
    key_id: Option<String>,
    signing_key: EncodingKey,
}

impl ServiceAccountExchanger {
    /// Parses the private key up front so a bad key fails at startup
    pub fn new(client: reqwest::Client, key: &ServiceAccountKey) -> Result<Self, AuthError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| AuthError::Signing(format!("invalid private key: {}", e)))?;

        Ok(Self {
            client,
            issuer: key.client_email.clone(),
            token_uri: key.token_uri.clone(),
            key_id: key.private_key_id.clone(),
            signing_key,
        })
    }

    pub fn sign_assertion(&self) -> Result<String, AuthError> {
        let iat = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: self.issuer.clone(),
            scope: MESSAGING_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();

        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

#[async_trait]
impl TokenExchanger for ServiceAccountExchanger {
    async fn exchange(&self) -> Result<Credential, AuthError> {
        let assertion = self.sign_assertion()?;

        let response = self
            .client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;

        Ok(Credential::expiring_in(
            token.access_token,
            Duration::from_secs(token.expires_in),
        ))
    }
}
