use async_trait::async_trait;
use huddle_core::config::ServerConfig;
use huddle_core::domain::{UserId, UserProfile, UserStatus};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("bulk fetch request failed: {0}")]
    Request(String),
    #[error("bulk fetch response decode failed: {0}")]
    Decode(String),
    #[error("bulk fetch rejected with status {code}")]
    Status { code: u16 },
}

/// Access to the server's bulk user endpoints. One call carries the full
/// list of ids drained from a pending set.
#[async_trait]
pub trait BulkFetcher: Send + Sync {
    async fn fetch_profiles_by_ids(&self, ids: &[UserId]) -> Result<Vec<UserProfile>, FetchError>;
    async fn fetch_statuses_by_ids(&self, ids: &[UserId]) -> Result<Vec<UserStatus>, FetchError>;
}

#[derive(Default)]
pub struct NoopBulkFetcher;

#[async_trait]
impl BulkFetcher for NoopBulkFetcher {
    async fn fetch_profiles_by_ids(&self, _ids: &[UserId]) -> Result<Vec<UserProfile>, FetchError> {
        Ok(Vec::new())
    }

    async fn fetch_statuses_by_ids(&self, _ids: &[UserId]) -> Result<Vec<UserStatus>, FetchError> {
        Ok(Vec::new())
    }
}

/// REST-backed fetcher. The server exposes both lookups as POST endpoints
/// taking a JSON array of id strings.
pub struct RestBulkFetcher {
    http: reqwest::Client,
    base_url: String,
    session_token: SecretString,
}

impl RestBulkFetcher {
    pub fn new(server: &ServerConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: server.base_url.trim_end_matches('/').to_owned(),
            session_token: server.session_token.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_ids<T>(&self, path: &str, ids: &[UserId]) -> Result<Vec<T>, FetchError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(self.session_token.expose_secret())
            .json(&ids)
            .send()
            .await
            .map_err(|error| FetchError::Request(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { code: status.as_u16() });
        }

        response.json().await.map_err(|error| FetchError::Decode(error.to_string()))
    }
}

#[async_trait]
impl BulkFetcher for RestBulkFetcher {
    async fn fetch_profiles_by_ids(&self, ids: &[UserId]) -> Result<Vec<UserProfile>, FetchError> {
        self.post_ids("/api/v4/users/ids", ids).await
    }

    async fn fetch_statuses_by_ids(&self, ids: &[UserId]) -> Result<Vec<UserStatus>, FetchError> {
        self.post_ids("/api/v4/users/status/ids", ids).await
    }
}
