use std::path::Path;
use std::sync::Arc;

use gaccount_core::audit::{AuditSink, TracingAuditLog};
use gaccount_core::config::GaccountConfig;
use gaccount_core::db::sqlite::SqliteAuditLog;
use gaccount_core::db::DatabasePool;
use gaccount_core::lookup::HttpPersonLookup;
use gaccount_core::person::PersonLookup;
use gaccount_directory::auth::{CredentialProvider, ServiceAccountAuth, StaticToken, DIRECTORY_SCOPES};
use gaccount_directory::client::DirectoryClient;
use gaccount_directory::identity::IdentityResolver;
use gaccount_directory::lifecycle::LifecycleController;
use gaccount_directory::repository::{AccountRepository, OrgUnits};
use tracing::info;

/// Everything a command needs, built once from configuration.
pub struct Context {
    pub controller: LifecycleController,
    lookup: Option<Arc<dyn PersonLookup>>,
    pub audit_log: Option<Arc<SqliteAuditLog>>,
}

impl Context {
    /// Load and validate the configuration file, then wire up the services.
    pub async fn load(config_path: &str) -> anyhow::Result<Self> {
        let config = GaccountConfig::load(Path::new(config_path))?;
        config.validate()?;
        info!("Loaded configuration from {}", config_path);
        Self::build(&config).await
    }

    pub async fn build(config: &GaccountConfig) -> anyhow::Result<Self> {
        let credentials = credentials(config)?;
        let client = DirectoryClient::new(credentials).with_base_url(&config.directory.api_base_url);

        let audit_log = match config.audit.database_path.as_deref() {
            Some(path) => {
                let connect_str = format!("sqlite:{}?mode=rwc", path);
                let pool = DatabasePool::new_sqlite(&connect_str).await?;
                Some(Arc::new(SqliteAuditLog::new(pool.into_sqlite())))
            }
            None => None,
        };
        let sink: Arc<dyn AuditSink> = match &audit_log {
            Some(log) => log.clone() as Arc<dyn AuditSink>,
            None => Arc::new(TracingAuditLog),
        };

        let lookup: Option<Arc<dyn PersonLookup>> = config.lookup.base_url.as_deref().map(|url| {
            Arc::new(HttpPersonLookup::new(url, config.lookup.token.as_deref())) as Arc<dyn PersonLookup>
        });

        let repo = AccountRepository::new(
            Arc::new(client),
            sink,
            IdentityResolver::new(&config.directory.domain, &config.directory.hash_salt),
            OrgUnits::new(
                &config.directory.bulk_org_unit,
                &config.directory.activated_org_unit,
            ),
        );

        Ok(Self {
            controller: LifecycleController::new(repo, config.account_creation_enabled()),
            lookup,
            audit_log,
        })
    }

    pub fn lookup(&self) -> Option<&Arc<dyn PersonLookup>> {
        self.lookup.as_ref()
    }
}

fn credentials(config: &GaccountConfig) -> anyhow::Result<Arc<dyn CredentialProvider>> {
    let creds = &config.credentials;
    if let Some(token) = creds.access_token.as_deref() {
        return Ok(Arc::new(StaticToken::new(token)));
    }

    let key_path = creds
        .service_account_key_path
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("credentials.service_account_key_path not configured"))?;
    let admin_email = creds
        .admin_email
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("credentials.admin_email not configured"))?;

    let auth = ServiceAccountAuth::from_service_account(key_path, admin_email, DIRECTORY_SCOPES)?;
    Ok(Arc::new(auth))
}
