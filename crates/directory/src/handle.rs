//! A live directory account bound to the person it belongs to.
//!
//! Setters stage changes and queue audit entries locally. Nothing reaches the
//! directory until [`AccountHandle::commit`], which sends every staged change
//! in one update and only then writes the queued entries.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use gaccount_core::audit::{AuditKind, PendingEntry};
use gaccount_core::error::{AccountError, Result};
use gaccount_core::person::PersonRecord;

use crate::availability::{Availability, PENDING_WINDOW_SECS};
use crate::identity::{is_anonymous_local_part, local_part};
use crate::models::{DirectoryUser, DirectoryUserName};
use crate::password::{validate_password_hash, HASH_FUNCTION};
use crate::repository::{org_unit_path, AccountRepository};

/// Changes waiting for the next commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedChanges {
    pub name: Option<DirectoryUserName>,
    pub password: Option<String>,
    pub org_unit_path: Option<String>,
}

impl StagedChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.password.is_none() && self.org_unit_path.is_none()
    }

    fn apply_to(&self, user: &DirectoryUser) -> DirectoryUser {
        let mut updated = user.clone();
        if let Some(name) = &self.name {
            updated.name = name.clone();
        }
        if let Some(path) = &self.org_unit_path {
            updated.org_unit_path = Some(path.clone());
        }
        match &self.password {
            Some(hash) => {
                updated.password = Some(hash.clone());
                updated.hash_function = Some(HASH_FUNCTION.to_string());
            }
            None => {
                updated.password = None;
                updated.hash_function = None;
            }
        }
        updated
    }
}

pub struct AccountHandle {
    repo: AccountRepository,
    person: PersonRecord,
    user: DirectoryUser,
    staged: StagedChanges,
    pending: VecDeque<PendingEntry>,
    /// The directory never returns credentials; this is the last one we sent.
    known_password: Option<String>,
}

impl AccountHandle {
    pub(crate) fn new(repo: AccountRepository, person: PersonRecord, user: DirectoryUser) -> Self {
        Self {
            repo,
            person,
            user,
            staged: StagedChanges::default(),
            pending: VecDeque::new(),
            known_password: None,
        }
    }

    pub(crate) fn with_known_password(mut self, password_hash: &str) -> Self {
        self.known_password = Some(password_hash.to_string());
        self
    }

    pub fn person(&self) -> &PersonRecord {
        &self.person
    }

    pub(crate) fn set_person(&mut self, person: PersonRecord) {
        self.person = person;
    }

    /// The last state confirmed by the directory.
    pub fn snapshot(&self) -> &DirectoryUser {
        &self.user
    }

    pub(crate) fn replace_snapshot(&mut self, user: DirectoryUser) {
        self.user = user;
    }

    pub fn primary_name(&self) -> &str {
        &self.user.primary_email
    }

    pub fn first_name(&self) -> &str {
        match &self.staged.name {
            Some(name) => &name.given_name,
            None => &self.user.name.given_name,
        }
    }

    pub fn last_name(&self) -> &str {
        match &self.staged.name {
            Some(name) => &name.family_name,
            None => &self.user.name.family_name,
        }
    }

    /// Org unit path, staged value first.
    pub fn org_unit(&self) -> Option<&str> {
        self.staged
            .org_unit_path
            .as_deref()
            .or(self.user.org_unit_path.as_deref())
    }

    pub fn creation_time(&self) -> Option<DateTime<Utc>> {
        self.user.creation_time
    }

    pub fn staged(&self) -> &StagedChanges {
        &self.staged
    }

    pub fn pending_log(&self) -> impl Iterator<Item = &PendingEntry> {
        self.pending.iter()
    }

    pub fn is_anonymous_name(&self) -> bool {
        is_anonymous_local_part(local_part(self.primary_name()))
    }

    pub fn is_activated(&self) -> bool {
        self.org_unit() != Some(org_unit_path(&self.repo.org_units().bulk).as_str())
    }

    pub fn is_pending(&self) -> bool {
        self.is_pending_at(Utc::now())
    }

    /// Inside the 24 hours following creation.
    pub fn is_pending_at(&self, now: DateTime<Utc>) -> bool {
        self.creation_time()
            .is_some_and(|created| (now - created).num_seconds() < PENDING_WINDOW_SECS)
    }

    pub fn time_until_available(&self) -> Availability {
        self.time_until_available_at(Utc::now())
    }

    pub fn time_until_available_at(&self, now: DateTime<Utc>) -> Availability {
        Availability::at(self.creation_time(), now)
    }

    fn queue(&mut self, kind: AuditKind, message: String) {
        self.pending.push_back(PendingEntry::new(kind, message));
    }

    pub fn set_name(&mut self, first: &str, last: &str) {
        if self.first_name() == first && self.last_name() == last {
            return;
        }
        self.staged.name = Some(DirectoryUserName {
            given_name: first.to_string(),
            family_name: last.to_string(),
        });
        self.queue(
            AuditKind::Update,
            format!("name changed to {first} {last}"),
        );
    }

    pub fn set_password(&mut self, password_hash: &str) -> Result<()> {
        validate_password_hash(password_hash)?;
        let current = self.staged.password.as_deref().or(self.known_password.as_deref());
        if current == Some(password_hash) {
            return Ok(());
        }
        self.staged.password = Some(password_hash.to_string());
        self.queue(AuditKind::Update, "password changed".to_string());
        Ok(())
    }

    /// Accepts `name` or `/name`.
    pub fn set_org_unit(&mut self, name: &str) {
        let path = org_unit_path(name);
        if self.org_unit() == Some(path.as_str()) {
            return;
        }
        self.queue(
            AuditKind::Update,
            format!("moved to OU={}", path.trim_start_matches('/')),
        );
        self.staged.org_unit_path = Some(path);
    }

    /// Move an anonymous account to `username@domain`, dropping the old name.
    pub async fn rename_to_claimed_name(&mut self) -> Result<()> {
        if !self.is_anonymous_name() {
            return Err(AccountError::Precondition(format!(
                "{} is not an anonymous account name",
                self.primary_name()
            )));
        }
        let Some(claimed) = self.repo.resolver().claimed_name(&self.person) else {
            return Err(AccountError::Precondition(format!(
                "{} has no username to claim the account with",
                self.person.identifier()
            )));
        };

        let repo = self.repo.clone();
        let anonymous = self.primary_name().to_string();
        repo.rename(self, &claimed).await?;
        repo.backfill_username(&self.person).await;
        repo.remove_alias(&self.person, &claimed, &anonymous).await
    }

    /// Claim the account if needed, set the password, and move it into the
    /// activated unit.
    pub async fn activate(&mut self, password_hash: &str) -> Result<()> {
        validate_password_hash(password_hash)?;
        if self.is_anonymous_name() {
            self.rename_to_claimed_name().await?;
        }
        self.set_password(password_hash)?;
        let activated = self.repo.org_units().activated.clone();
        self.set_org_unit(&activated);
        self.commit().await
    }

    /// Send staged changes in a single update addressed by the current name.
    ///
    /// On failure the staged changes and queued entries are kept so the
    /// commit can be retried.
    pub async fn commit(&mut self) -> Result<()> {
        if self.staged.is_empty() && self.pending.is_empty() {
            return Ok(());
        }

        let addressed_by = self.user.primary_email.clone();
        let body = self.staged.apply_to(&self.user);
        match self.repo.update(&self.person, &addressed_by, &body).await {
            Ok(updated) => {
                if let Some(hash) = self.staged.password.take() {
                    self.known_password = Some(hash);
                }
                self.user = updated;
                self.staged = StagedChanges::default();
                let entries: Vec<PendingEntry> = self.pending.drain(..).collect();
                info!(
                    primary_email = %addressed_by,
                    entries = entries.len(),
                    "account changes committed"
                );
                for entry in entries {
                    self.repo.record(&self.person, entry.kind, &entry.message).await;
                }
                Ok(())
            }
            Err(e) => {
                error!(
                    primary_email = %addressed_by,
                    queued = self.pending.len(),
                    error = %e,
                    "commit failed; staged changes kept"
                );
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for AccountHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountHandle")
            .field("person", &self.person)
            .field("primary_email", &self.user.primary_email)
            .field("staged", &self.staged)
            .field("pending", &self.pending.len())
            .finish()
    }
}
