//! Bearer credentials for Admin Directory API requests.
//!
//! The directory client asks its [`CredentialProvider`] for a token before
//! every call; providers refresh themselves when the token has expired or is
//! about to.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use gaccount_core::error::{AccountError, Result};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Scopes needed for user and alias management.
pub const DIRECTORY_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/admin.directory.user",
    "https://www.googleapis.com/auth/admin.directory.user.alias",
];

/// Tokens this close to expiry are treated as already expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Source of the bearer token used to authorize directory calls.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Whether the current token can be used right now.
    async fn is_valid(&self) -> bool;

    /// Obtain a fresh token.
    async fn refresh(&self) -> Result<()>;

    /// The current token, refreshed first if it is no longer valid.
    async fn access_token(&self) -> Result<String> {
        if !self.is_valid().await {
            self.refresh().await?;
        }
        self.current_token()
            .await
            .ok_or_else(|| AccountError::Auth("no access token after refresh".into()))
    }

    /// The cached token without any validity check.
    async fn current_token(&self) -> Option<String>;
}

/// A fixed token supplied by configuration. It never expires locally; the
/// directory rejects it once it does.
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn is_valid(&self) -> bool {
        !self.token.is_empty()
    }

    async fn refresh(&self) -> Result<()> {
        Err(AccountError::Auth(
            "static access token cannot be refreshed".into(),
        ))
    }

    async fn current_token(&self) -> Option<String> {
        Some(self.token.clone())
    }
}

/// The fields of a service account JSON key file that token exchange needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.into()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| AccountError::Config(format!("invalid service account key file: {e}")))
    }
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Service account credentials with domain-wide delegation: a signed JWT is
/// exchanged for an access token acting as `subject`.
pub struct ServiceAccountAuth {
    http: reqwest::Client,
    key: ServiceAccountKey,
    subject: String,
    scopes: Vec<String>,
    token: RwLock<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey, subject: &str, scopes: &[&str]) -> Self {
        Self {
            http: reqwest::Client::new(),
            key,
            subject: subject.to_string(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            token: RwLock::new(None),
        }
    }

    /// Load the key file at `path` and act as `subject`.
    pub fn from_service_account(path: &str, subject: &str, scopes: &[&str]) -> Result<Self> {
        let key = ServiceAccountKey::from_file(Path::new(path))?;
        Ok(Self::new(key, subject, scopes))
    }

    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let claims = JwtClaims {
            iss: &self.key.client_email,
            sub: &self.subject,
            scope: self.scopes.join(" "),
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| AccountError::Auth(format!("invalid service account private key: {e}")))?;
        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| AccountError::Auth(format!("failed to sign token request: {e}")))
    }
}

#[async_trait]
impl CredentialProvider for ServiceAccountAuth {
    async fn is_valid(&self) -> bool {
        let guard = self.token.read().await;
        guard
            .as_ref()
            .is_some_and(|t| t.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > Utc::now())
    }

    async fn refresh(&self) -> Result<()> {
        let now = Utc::now();
        let assertion = self.signed_assertion(now)?;
        debug!(token_uri = %self.key.token_uri, subject = %self.subject, "refreshing directory access token");

        let resp = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, "token exchange failed");
            return Err(AccountError::Auth(format!(
                "token exchange failed ({status}): {body}"
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| AccountError::Auth(format!("failed to parse token response: {e}")))?;

        let expires_at = now + Duration::seconds(token.expires_in.unwrap_or(3600));
        *self.token.write().await = Some(CachedToken {
            access_token: token.access_token,
            expires_at,
        });
        Ok(())
    }

    async fn current_token(&self) -> Option<String> {
        self.token
            .read()
            .await
            .as_ref()
            .map(|t| t.access_token.clone())
    }
}
