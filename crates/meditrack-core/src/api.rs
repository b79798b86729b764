//! ApiClient: the client side of the MediTrack backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::analytics::AnalyticsResult;
use crate::error::ApiError;
use crate::persistence::SessionSink;
use crate::session::NewSession;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionCreated {
    session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenIssued {
    api_token: String,
}

/// HTTP client for `/sessions`, `/analytics` and `/auth/google`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http_client: Client,
}

impl ApiClient {
    /// `base_url` is the API root, e.g. `http://localhost:3000/api`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    async fn check(resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.ok().filter(|b| !b.is_empty());
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// POST a finished session. Returns the new session id.
    pub async fn save_session(&self, token: &str, session: &NewSession) -> Result<String, ApiError> {
        let resp = self
            .http_client
            .post(self.endpoint("sessions")?)
            .bearer_auth(token)
            .json(session)
            .send()
            .await?;
        let created: SessionCreated = Self::check(resp)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        Ok(created.session_id)
    }

    pub async fn get_analytics(
        &self,
        token: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<AnalyticsResult, ApiError> {
        let resp = self
            .http_client
            .get(self.endpoint("analytics")?)
            .bearer_auth(token)
            .query(&[("startDate", start_date), ("endDate", end_date)])
            .send()
            .await?;
        Self::check(resp)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// Trades a Google ID token for a MediTrack API token.
    pub async fn exchange_google_token(&self, google_token: &str) -> Result<String, ApiError> {
        let resp = self
            .http_client
            .post(self.endpoint("auth/google")?)
            .json(&json!({ "googleToken": google_token }))
            .send()
            .await?;
        let issued: TokenIssued = Self::check(resp)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        Ok(issued.api_token)
    }
}

#[async_trait]
impl SessionSink for ApiClient {
    async fn insert_session(&self, token: &str, session: &NewSession) -> Result<String, ApiError> {
        self.save_session(token, session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let client = ApiClient::new("http://localhost:3000/api", Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint("sessions").unwrap().as_str(), "http://localhost:3000/api/sessions");
        let client = ApiClient::new("http://localhost:3000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.endpoint("auth/google").unwrap().as_str(),
            "http://localhost:3000/api/auth/google"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(matches!(
            ApiClient::new("not a url", Duration::from_secs(1)),
            Err(ApiError::InvalidUrl(_))
        ));
    }
}
