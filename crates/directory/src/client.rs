//! Typed reqwest wrapper for the Admin Directory API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use tracing::debug;

use gaccount_core::config::DEFAULT_API_BASE_URL;
use gaccount_core::error::{AccountError, Result};

use crate::auth::CredentialProvider;
use crate::models::{ApiErrorBody, DirectoryUser, DirectoryUserList};
use crate::service::DirectoryService;

/// HTTP client for Admin Directory API user operations.
pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl DirectoryClient {
    /// Create a new client authorized by `credentials`.
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            credentials,
        }
    }

    /// Override the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn users_url(&self) -> String {
        format!("{}/admin/directory/v1/users", self.base_url)
    }

    fn user_url(&self, user_key: &str) -> String {
        format!("{}/admin/directory/v1/users/{}", self.base_url, user_key)
    }

    fn alias_url(&self, user_key: &str, alias: &str) -> String {
        format!(
            "{}/admin/directory/v1/users/{}/aliases/{}",
            self.base_url, user_key, alias
        )
    }

    /// The bearer token, refreshed first if it has expired.
    async fn bearer(&self) -> Result<String> {
        self.credentials.access_token().await
    }
}

/// Turn an unsuccessful response into an error, preferring the API's own message.
async fn error_from(resp: Response, action: &str) -> AccountError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);

    if status == StatusCode::CONFLICT {
        return AccountError::Conflict(format!("{action} failed: {message}"));
    }
    AccountError::remote(status.as_u16(), format!("{action} failed: {message}"))
}

#[async_trait]
impl DirectoryService for DirectoryClient {
    async fn get_user(&self, user_key: &str) -> Result<Option<DirectoryUser>> {
        debug!(user_key, "get user");
        let resp = self
            .http
            .get(self.user_url(user_key))
            .bearer_auth(self.bearer().await?)
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !resp.status().is_success() {
            return Err(error_from(resp, "get user").await);
        }

        let user = resp
            .json::<DirectoryUser>()
            .await
            .map_err(|e| AccountError::Serialization(format!("get user parse failed: {e}")))?;
        Ok(Some(user))
    }

    async fn insert_user(&self, user: &DirectoryUser) -> Result<DirectoryUser> {
        debug!(primary_email = %user.primary_email, "insert user");
        let resp = self
            .http
            .post(self.users_url())
            .bearer_auth(self.bearer().await?)
            .json(user)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_from(resp, "create user").await);
        }

        resp.json::<DirectoryUser>()
            .await
            .map_err(|e| AccountError::Serialization(format!("create user parse failed: {e}")))
    }

    async fn update_user(&self, user_key: &str, user: &DirectoryUser) -> Result<DirectoryUser> {
        debug!(user_key, primary_email = %user.primary_email, "update user");
        let resp = self
            .http
            .put(self.user_url(user_key))
            .bearer_auth(self.bearer().await?)
            .json(user)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_from(resp, "update user").await);
        }

        resp.json::<DirectoryUser>()
            .await
            .map_err(|e| AccountError::Serialization(format!("update user parse failed: {e}")))
    }

    async fn delete_user(&self, user_key: &str) -> Result<()> {
        debug!(user_key, "delete user");
        let resp = self
            .http
            .delete(self.user_url(user_key))
            .bearer_auth(self.bearer().await?)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_from(resp, "delete user").await);
        }
        Ok(())
    }

    async fn list_users(
        &self,
        domain: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<DirectoryUserList> {
        let mut req = self
            .http
            .get(self.users_url())
            .bearer_auth(self.bearer().await?)
            .query(&[("domain", domain)])
            .query(&[("maxResults", max_results)]);

        if let Some(token) = page_token {
            req = req.query(&[("pageToken", token)]);
        }

        let resp = req.send().await?;

        if !resp.status().is_success() {
            return Err(error_from(resp, "list users").await);
        }

        resp.json::<DirectoryUserList>()
            .await
            .map_err(|e| AccountError::Serialization(format!("list users parse failed: {e}")))
    }

    async fn delete_alias(&self, user_key: &str, alias: &str) -> Result<()> {
        debug!(user_key, alias, "delete alias");
        let resp = self
            .http
            .delete(self.alias_url(user_key, alias))
            .bearer_auth(self.bearer().await?)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_from(resp, "delete alias").await);
        }
        Ok(())
    }
}
