//! Top-level account operations, one per command.

use std::collections::BTreeMap;

use tracing::info;

use gaccount_core::error::{AccountError, Result};
use gaccount_core::person::PersonRecord;

use crate::handle::AccountHandle;
use crate::repository::AccountRepository;

pub struct LifecycleController {
    repo: AccountRepository,
    account_creation: bool,
}

impl LifecycleController {
    pub fn new(repo: AccountRepository, account_creation: bool) -> Self {
        Self {
            repo,
            account_creation,
        }
    }

    pub fn repository(&self) -> &AccountRepository {
        &self.repo
    }

    pub async fn find(&self, person: &PersonRecord) -> Result<Option<AccountHandle>> {
        self.repo.find(person).await
    }

    async fn require(&self, person: &PersonRecord) -> Result<AccountHandle> {
        self.repo.find(person).await?.ok_or_else(|| {
            AccountError::Precondition(format!("no account exists for {}", person.identifier()))
        })
    }

    pub async fn create(&self, person: &PersonRecord, password_hash: &str) -> Result<AccountHandle> {
        if !self.account_creation {
            return Err(AccountError::Precondition(
                "account creation is disabled".into(),
            ));
        }
        if let Some(existing) = self.repo.find(person).await? {
            return Err(AccountError::Precondition(format!(
                "an account already exists for {}: {}",
                person.identifier(),
                existing.primary_name()
            )));
        }
        self.repo.create(person, password_hash).await
    }

    pub async fn delete(&self, person: &PersonRecord) -> Result<()> {
        let handle = self.require(person).await?;
        self.repo.delete(handle).await
    }

    /// Move the account back into the bulk unit.
    pub async fn reset(&self, person: &PersonRecord) -> Result<AccountHandle> {
        let mut handle = self.require(person).await?;
        let bulk = self.repo.org_units().bulk.clone();
        handle.set_org_unit(&bulk);
        handle.commit().await?;
        info!(person = %person.identifier(), primary_email = %handle.primary_name(), "account reset");
        Ok(handle)
    }

    pub async fn rename(
        &self,
        person: &PersonRecord,
        old_username: &str,
        new_username: &str,
        delete_alias: bool,
    ) -> Result<AccountHandle> {
        if old_username == new_username {
            return Err(AccountError::Validation(
                "old and new usernames are the same".into(),
            ));
        }

        let old_person = person.with_username(old_username);
        let mut handle = self.require(&old_person).await?;
        if handle.is_anonymous_name() {
            return Err(AccountError::Precondition(format!(
                "{} is still in anonymous form; it is renamed on activation",
                handle.primary_name()
            )));
        }

        let new_name = self.repo.resolver().account_name(new_username);
        if let Some(existing) = self.repo.lookup(&new_name).await? {
            let reason = if existing.primary_email == new_name {
                format!("{new_name} already exists")
            } else {
                format!("{new_name} is an alias for {}", existing.primary_email)
            };
            return Err(AccountError::Precondition(reason));
        }

        let old_name = handle.primary_name().to_string();
        self.repo.rename(&mut handle, &new_name).await?;
        handle.set_person(person.with_username(new_username));
        self.repo
            .update_username(person.numeric_id(), old_username, new_username)
            .await;

        if delete_alias {
            self.repo
                .remove_alias(handle.person(), &new_name, &old_name)
                .await?;
        }
        Ok(handle)
    }

    pub async fn list(&self) -> Result<BTreeMap<String, String>> {
        self.repo.list_all().await
    }

    pub async fn activate(&self, person: &PersonRecord, password_hash: &str) -> Result<AccountHandle> {
        let mut handle = self.require(person).await?;
        handle.activate(password_hash).await?;
        info!(person = %person.identifier(), primary_email = %handle.primary_name(), "account activated");
        Ok(handle)
    }

    pub async fn update_name(&self, person: &PersonRecord, first: &str, last: &str) -> Result<AccountHandle> {
        let mut handle = self.require(person).await?;
        handle.set_name(first, last);
        handle.commit().await?;
        Ok(handle)
    }
}
