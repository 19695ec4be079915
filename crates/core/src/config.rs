//! TOML-based configuration for gaccount.

use crate::error::{AccountError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_API_BASE_URL: &str = "https://admin.googleapis.com";
pub const DEFAULT_BULK_ORG_UNIT: &str = "bulk-created-accounts";
pub const DEFAULT_ACTIVATED_ORG_UNIT: &str = "activated-accounts";

/// Top-level configuration, deserialized from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaccountConfig {
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
}

/// Directory domain and naming settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Email domain every account lives under.
    pub domain: String,
    /// Salt mixed into the numeric id before hashing anonymous account names.
    pub hash_salt: String,
    #[serde(default)]
    pub account_creation: AccountCreation,
    #[serde(default = "default_bulk_org_unit")]
    pub bulk_org_unit: String,
    #[serde(default = "default_activated_org_unit")]
    pub activated_org_unit: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_bulk_org_unit() -> String {
    DEFAULT_BULK_ORG_UNIT.into()
}

fn default_activated_org_unit() -> String {
    DEFAULT_ACTIVATED_ORG_UNIT.into()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.into()
}

/// The account creation switch. Accepts `true`/`false` or the words
/// `on`/`yes`/`true` (any case); every other word means off.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AccountCreation {
    Flag(bool),
    Word(String),
}

impl Default for AccountCreation {
    fn default() -> Self {
        Self::Flag(false)
    }
}

impl AccountCreation {
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Flag(b) => *b,
            Self::Word(w) => matches!(w.to_lowercase().as_str(), "on" | "yes" | "true"),
        }
    }
}

/// Credentials used to authorize directory calls.
///
/// Either a static `access_token`, or a service account key plus the admin
/// user it impersonates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub service_account_key_path: Option<String>,
    #[serde(default)]
    pub admin_email: Option<String>,
}

/// Audit log storage. When no database path is set, entries go to the
/// tracing output only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub database_path: Option<String>,
}

/// Optional person lookup web service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

impl GaccountConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| AccountError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Validate the configuration, returning an error for invalid combinations.
    pub fn validate(&self) -> Result<()> {
        if self.directory.domain.trim().is_empty() {
            return Err(AccountError::Config(
                "directory.domain must not be empty".into(),
            ));
        }

        if self.directory.domain.contains('@') {
            return Err(AccountError::Config(format!(
                "directory.domain must be a bare domain, got: {}",
                self.directory.domain
            )));
        }

        if self.directory.hash_salt.is_empty() {
            return Err(AccountError::Config(
                "directory.hash_salt must not be empty".into(),
            ));
        }

        if self.directory.bulk_org_unit.trim_matches('/').is_empty()
            || self.directory.activated_org_unit.trim_matches('/').is_empty()
        {
            return Err(AccountError::Config(
                "directory org unit names must not be empty".into(),
            ));
        }

        let creds = &self.credentials;
        match (&creds.access_token, &creds.service_account_key_path) {
            (Some(_), Some(_)) => {
                return Err(AccountError::Config(
                    "credentials.access_token and credentials.service_account_key_path are mutually exclusive".into(),
                ));
            }
            (None, None) => {
                return Err(AccountError::Config(
                    "either credentials.access_token or credentials.service_account_key_path is required".into(),
                ));
            }
            (None, Some(key_path)) => {
                if creds.admin_email.is_none() {
                    return Err(AccountError::Config(
                        "credentials.admin_email is required with a service account key".into(),
                    ));
                }
                if !Path::new(key_path).exists() {
                    return Err(AccountError::Config(format!(
                        "credentials.service_account_key_path file does not exist: {key_path}"
                    )));
                }
            }
            (Some(_), None) => {}
        }

        if let Some(ref url) = self.lookup.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AccountError::Config(format!(
                    "lookup.base_url must be an http(s) URL, got: {url}"
                )));
            }
        }

        Ok(())
    }

    /// Whether the configuration allows creating new accounts.
    pub fn account_creation_enabled(&self) -> bool {
        self.directory.account_creation.is_enabled()
    }
}
