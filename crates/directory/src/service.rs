//! The remote directory operations the account layer depends on.

use async_trait::async_trait;

use gaccount_core::error::Result;

use crate::models::{DirectoryUser, DirectoryUserList};

/// Remote directory service. `user_key` is the primary email (or an alias)
/// that addresses the account.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Fetch a user. A missing account is `Ok(None)`, never an error.
    async fn get_user(&self, user_key: &str) -> Result<Option<DirectoryUser>>;

    /// Create a user. An existing account is `AccountError::Conflict`.
    async fn insert_user(&self, user: &DirectoryUser) -> Result<DirectoryUser>;

    /// Replace the user addressed by `user_key` with `user`.
    async fn update_user(&self, user_key: &str, user: &DirectoryUser) -> Result<DirectoryUser>;

    async fn delete_user(&self, user_key: &str) -> Result<()>;

    /// One page of the users in `domain`.
    async fn list_users(
        &self,
        domain: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<DirectoryUserList>;

    /// Remove `alias` from the user addressed by `user_key`.
    async fn delete_alias(&self, user_key: &str, alias: &str) -> Result<()>;
}
