//! Google ID token verification.
//!
//! Verification itself is Google's job: the token is handed to the
//! `tokeninfo` endpoint and the answer is checked against our client id.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::AuthError;

pub const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// A user as vouched for by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
}

/// Exchanges a provider ID token for an identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `SignInFailed` when the token is rejected, `Provider` when the
    /// provider could not be asked.
    async fn sign_in_with_id_token(&self, id_token: &str) -> Result<Identity, AuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    sub: String,
    aud: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<String>,
}

/// [`IdentityProvider`] backed by Google's `tokeninfo` endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTokenInfo {
    http: Client,
    endpoint: Url,
    client_id: Option<String>,
}

impl GoogleTokenInfo {
    pub fn new(client_id: Option<String>) -> Result<Self, AuthError> {
        Self::with_endpoint(GOOGLE_TOKENINFO_URL, client_id)
    }

    pub fn with_endpoint(endpoint: &str, client_id: Option<String>) -> Result<Self, AuthError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| AuthError::Provider(format!("bad tokeninfo URL: {e}")))?;
        Ok(Self {
            http: Client::new(),
            endpoint,
            client_id,
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleTokenInfo {
    async fn sign_in_with_id_token(&self, id_token: &str) -> Result<Identity, AuthError> {
        if id_token.is_empty() {
            return Err(AuthError::SignInFailed("Google ID token is missing.".into()));
        }

        let resp = self
            .http
            .get(self.endpoint.clone())
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        if !resp.status().is_success() {
            tracing::warn!(status = resp.status().as_u16(), "Google rejected ID token");
            return Err(AuthError::SignInFailed("Invalid Google ID token.".into()));
        }

        let info: TokenInfo = resp
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("unexpected tokeninfo response: {e}")))?;

        if let Some(expected) = &self.client_id {
            if &info.aud != expected {
                tracing::warn!(aud = %info.aud, "Google ID token issued for another client");
                return Err(AuthError::SignInFailed("Invalid Google ID token.".into()));
            }
        }

        // Unverified addresses are treated as absent.
        let email = info
            .email
            .filter(|_| info.email_verified.as_deref() != Some("false"));

        tracing::info!(user_id = %info.sub, "Google user authenticated");
        Ok(Identity {
            user_id: info.sub,
            email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepts_token_for_our_client() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tokeninfo")
            .match_query(mockito::Matcher::UrlEncoded("id_token".into(), "good".into()))
            .with_status(200)
            .with_body(r#"{"sub":"1234","aud":"client-1","email":"a@example.com","email_verified":"true"}"#)
            .create_async()
            .await;

        let provider = GoogleTokenInfo::with_endpoint(
            &format!("{}/tokeninfo", server.url()),
            Some("client-1".into()),
        )
        .unwrap();
        let identity = provider.sign_in_with_id_token("good").await.unwrap();
        assert_eq!(identity.user_id, "1234");
        assert_eq!(identity.email.as_deref(), Some("a@example.com"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejects_foreign_audience_and_bad_tokens() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tokeninfo")
            .match_query(mockito::Matcher::UrlEncoded("id_token".into(), "foreign".into()))
            .with_status(200)
            .with_body(r#"{"sub":"1","aud":"someone-else"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/tokeninfo")
            .match_query(mockito::Matcher::UrlEncoded("id_token".into(), "bad".into()))
            .with_status(400)
            .with_body(r#"{"error":"invalid_token"}"#)
            .create_async()
            .await;

        let provider = GoogleTokenInfo::with_endpoint(
            &format!("{}/tokeninfo", server.url()),
            Some("client-1".into()),
        )
        .unwrap();
        assert!(matches!(
            provider.sign_in_with_id_token("foreign").await,
            Err(AuthError::SignInFailed(_))
        ));
        assert!(matches!(
            provider.sign_in_with_id_token("bad").await,
            Err(AuthError::SignInFailed(_))
        ));
        assert!(matches!(
            provider.sign_in_with_id_token("").await,
            Err(AuthError::SignInFailed(_))
        ));
    }
}
