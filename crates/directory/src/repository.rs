//! Account lookup, creation, deletion, rename, and the single update used by
//! handle commits.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use gaccount_core::audit::{AuditKind, AuditSink};
use gaccount_core::config::{DEFAULT_ACTIVATED_ORG_UNIT, DEFAULT_BULK_ORG_UNIT};
use gaccount_core::error::{AccountError, Result};
use gaccount_core::person::PersonRecord;

use crate::handle::AccountHandle;
use crate::identity::{local_part, IdentityResolver};
use crate::models::{DirectoryUser, DirectoryUserName};
use crate::password::{validate_password_hash, HASH_FUNCTION};
use crate::service::DirectoryService;

/// Page size used when listing the whole domain.
pub const LIST_PAGE_SIZE: u32 = 500;

/// The two organizational units an account moves between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgUnits {
    pub bulk: String,
    pub activated: String,
}

impl OrgUnits {
    pub fn new(bulk: &str, activated: &str) -> Self {
        Self {
            bulk: bare_org_unit(bulk).to_string(),
            activated: bare_org_unit(activated).to_string(),
        }
    }
}

impl Default for OrgUnits {
    fn default() -> Self {
        Self::new(DEFAULT_BULK_ORG_UNIT, DEFAULT_ACTIVATED_ORG_UNIT)
    }
}

/// `name` or `/name` → `name`.
pub fn bare_org_unit(name: &str) -> &str {
    name.trim_start_matches('/')
}

/// `name` or `/name` → `/name`.
pub fn org_unit_path(name: &str) -> String {
    format!("/{}", bare_org_unit(name))
}

/// Gateway between person records and directory accounts.
#[derive(Clone)]
pub struct AccountRepository {
    directory: Arc<dyn DirectoryService>,
    audit: Arc<dyn AuditSink>,
    resolver: IdentityResolver,
    org_units: OrgUnits,
}

impl AccountRepository {
    pub fn new(
        directory: Arc<dyn DirectoryService>,
        audit: Arc<dyn AuditSink>,
        resolver: IdentityResolver,
        org_units: OrgUnits,
    ) -> Self {
        Self {
            directory,
            audit,
            resolver,
            org_units,
        }
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    pub fn org_units(&self) -> &OrgUnits {
        &self.org_units
    }

    /// Write an audit entry. Sink failures are traced and swallowed.
    pub(crate) async fn record(&self, person: &PersonRecord, kind: AuditKind, message: &str) {
        if let Err(e) = self.audit.record(person, kind, message).await {
            warn!(
                person = %person.identifier(),
                kind = %kind,
                error = %e,
                "failed to write audit entry"
            );
        }
    }

    pub(crate) async fn backfill_username(&self, person: &PersonRecord) {
        if let Err(e) = self.audit.backfill_username(person).await {
            warn!(person = %person.identifier(), error = %e, "failed to back-fill audit username");
        }
    }

    pub(crate) async fn update_username(&self, numeric_id: Option<&str>, old: &str, new: &str) {
        if let Err(e) = self.audit.update_username(numeric_id, old, new).await {
            warn!(old, new, error = %e, "failed to rewrite audit history");
        }
    }

    /// Probe the person's candidate names, claimed first. A missing candidate
    /// moves on to the next; any other failure is returned.
    pub async fn find(&self, person: &PersonRecord) -> Result<Option<AccountHandle>> {
        for name in self.resolver.candidates(person) {
            match self.directory.get_user(&name).await {
                Ok(Some(user)) => {
                    debug!(person = %person.identifier(), primary_email = %user.primary_email, "account found");
                    return Ok(Some(AccountHandle::new(self.clone(), person.clone(), user)));
                }
                Ok(None) => continue,
                Err(e) => {
                    error!(person = %person.identifier(), candidate = %name, error = %e, "account lookup failed");
                    return Err(e);
                }
            }
        }
        Ok(None)
    }

    /// Fetch a single name, primary or alias.
    pub async fn lookup(&self, email: &str) -> Result<Option<DirectoryUser>> {
        self.directory.get_user(email).await
    }

    pub async fn create(&self, person: &PersonRecord, password_hash: &str) -> Result<AccountHandle> {
        if person.numeric_id().is_none() {
            return Err(AccountError::Precondition(format!(
                "cannot create an account for {} without a numeric id",
                person.identifier()
            )));
        }
        validate_password_hash(password_hash)?;
        let (Some(first), Some(last)) = (
            person.first_name().filter(|n| !n.is_empty()),
            person.last_name().filter(|n| !n.is_empty()),
        ) else {
            return Err(AccountError::Validation(
                "first and last name are required to create an account".into(),
            ));
        };
        let Some(primary_email) = self.resolver.preferred_name(person) else {
            return Err(AccountError::Precondition(format!(
                "no account name can be derived for {}",
                person.identifier()
            )));
        };

        let user = DirectoryUser {
            primary_email,
            name: DirectoryUserName {
                given_name: first.to_string(),
                family_name: last.to_string(),
            },
            org_unit_path: Some(org_unit_path(&self.org_units.bulk)),
            password: Some(password_hash.to_string()),
            hash_function: Some(HASH_FUNCTION.to_string()),
            ..Default::default()
        };

        match self.directory.insert_user(&user).await {
            Ok(created) => {
                info!(person = %person.identifier(), primary_email = %created.primary_email, "account created");
                self.record(person, AuditKind::Create, "account created").await;
                self.record(
                    person,
                    AuditKind::Update,
                    &format!("moved to OU={}", self.org_units.bulk),
                )
                .await;
                Ok(AccountHandle::new(self.clone(), person.clone(), created)
                    .with_known_password(password_hash))
            }
            Err(e) => {
                error!(person = %person.identifier(), primary_email = %user.primary_email, error = %e, "account creation failed");
                self.record(person, AuditKind::Error, &format!("error creating account: {e}"))
                    .await;
                Err(e)
            }
        }
    }

    pub async fn delete(&self, handle: AccountHandle) -> Result<()> {
        let primary_email = handle.primary_name().to_string();
        let person = handle.person().clone();
        match self.directory.delete_user(&primary_email).await {
            Ok(()) => {
                info!(person = %person.identifier(), primary_email = %primary_email, "account deleted");
                self.record(&person, AuditKind::Update, "account deleted").await;
                Ok(())
            }
            Err(e) => {
                error!(person = %person.identifier(), primary_email = %primary_email, error = %e, "account deletion failed");
                self.record(&person, AuditKind::Error, &format!("error deleting account: {e}"))
                    .await;
                Err(e)
            }
        }
    }

    /// Change the handle's primary name with one update addressed by the old
    /// name. Staged changes on the handle are left alone. The directory keeps
    /// the old name as an alias; see [`AccountRepository::remove_alias`].
    pub async fn rename(&self, handle: &mut AccountHandle, new_name: &str) -> Result<()> {
        let old_name = handle.primary_name().to_string();
        let mut body = handle.snapshot().clone();
        body.primary_email = new_name.to_string();
        body.password = None;
        body.hash_function = None;

        let renamed = self.update(handle.person(), &old_name, &body).await?;
        info!(old = %old_name, new = %new_name, "account renamed");
        handle.replace_snapshot(renamed);
        self.record(
            handle.person(),
            AuditKind::Update,
            &format!("renamed from {old_name} to {new_name}"),
        )
        .await;
        Ok(())
    }

    /// Drop `alias` from the account whose primary name is `primary_email`.
    pub async fn remove_alias(
        &self,
        person: &PersonRecord,
        primary_email: &str,
        alias: &str,
    ) -> Result<()> {
        match self.directory.delete_alias(primary_email, alias).await {
            Ok(()) => {
                debug!(alias = %alias, primary_email = %primary_email, "alias removed");
                Ok(())
            }
            Err(e) => {
                error!(alias = %alias, primary_email = %primary_email, error = %e, "alias removal failed");
                self.record(person, AuditKind::Error, &format!("error removing alias {alias}: {e}"))
                    .await;
                Err(e)
            }
        }
    }

    /// The single remote update behind a commit or rename.
    pub async fn update(
        &self,
        person: &PersonRecord,
        addressed_by: &str,
        user: &DirectoryUser,
    ) -> Result<DirectoryUser> {
        match self.directory.update_user(addressed_by, user).await {
            Ok(updated) => Ok(updated),
            Err(e) => {
                error!(person = %person.identifier(), primary_email = %addressed_by, error = %e, "account update failed");
                self.record(person, AuditKind::Error, &format!("error updating account: {e}"))
                    .await;
                Err(e)
            }
        }
    }

    /// Every account in the domain keyed by local part.
    pub async fn list_all(&self) -> Result<BTreeMap<String, String>> {
        let mut accounts = BTreeMap::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .directory
                .list_users(self.resolver.domain(), LIST_PAGE_SIZE, page_token.as_deref())
                .await?;
            for user in page.users.unwrap_or_default() {
                accounts.insert(local_part(&user.primary_email).to_string(), user.primary_email);
            }
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        debug!(count = accounts.len(), "listed accounts");
        Ok(accounts)
    }
}
