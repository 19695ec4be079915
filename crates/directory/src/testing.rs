//! In-memory directory and audit sink used by the account-layer tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use gaccount_core::audit::{AuditKind, AuditSink};
use gaccount_core::error::{AccountError, Result};
use gaccount_core::person::PersonRecord;

use crate::identity::IdentityResolver;
use crate::models::{DirectoryUser, DirectoryUserList};
use crate::repository::{AccountRepository, OrgUnits};
use crate::service::DirectoryService;

pub const DOMAIN: &str = "example.edu";
pub const SALT: &str = "pepper";

/// One call made against the fake directory.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get(String),
    Insert(String),
    Update {
        key: String,
        primary_email: String,
        org_unit: Option<String>,
        password: Option<String>,
    },
    Delete(String),
    List(Option<String>),
    DeleteAlias { user_key: String, alias: String },
}

#[derive(Default)]
struct State {
    users: BTreeMap<String, DirectoryUser>,
    aliases: BTreeMap<String, String>,
    calls: Vec<Call>,
    failures: HashMap<&'static str, u16>,
    applied_updates: usize,
    relisted: Vec<String>,
}

impl State {
    fn resolve(&self, key: &str) -> Option<String> {
        if self.users.contains_key(key) {
            return Some(key.to_string());
        }
        self.aliases.get(key).cloned()
    }

    fn take_failure(&mut self, op: &'static str) -> Result<()> {
        match self.failures.remove(op) {
            Some(status) => Err(AccountError::remote(status, format!("injected {op} failure"))),
            None => Ok(()),
        }
    }
}

/// Directory held in memory. Renames leave the old name behind as an alias,
/// the way the real service does.
#[derive(Default)]
pub struct FakeDirectory {
    state: Mutex<State>,
    page_size: Option<usize>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    pub fn seed(&self, user: DirectoryUser) {
        let mut state = self.state.lock().unwrap();
        state.users.insert(user.primary_email.clone(), user);
    }

    /// Report `primary_email` a second time at the end of the listing, as the
    /// real service does when the domain changes between pages.
    pub fn relist(&self, primary_email: &str) {
        self.state.lock().unwrap().relisted.push(primary_email.to_string());
    }

    /// Make the next call of kind `op` ("get", "insert", "update", "delete",
    /// "list", "delete_alias") fail with `status`.
    pub fn fail_next(&self, op: &'static str, status: u16) {
        self.state.lock().unwrap().failures.insert(op, status);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn user(&self, primary_email: &str) -> Option<DirectoryUser> {
        self.state.lock().unwrap().users.get(primary_email).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.state.lock().unwrap().users.len()
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        self.state.lock().unwrap().aliases.contains_key(alias)
    }

    /// Updates that actually changed stored state.
    pub fn applied_updates(&self) -> usize {
        self.state.lock().unwrap().applied_updates
    }
}

#[async_trait]
impl DirectoryService for FakeDirectory {
    async fn get_user(&self, user_key: &str) -> Result<Option<DirectoryUser>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Get(user_key.to_string()));
        state.take_failure("get")?;
        Ok(state
            .resolve(user_key)
            .and_then(|primary| state.users.get(&primary).cloned()))
    }

    async fn insert_user(&self, user: &DirectoryUser) -> Result<DirectoryUser> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Insert(user.primary_email.clone()));
        state.take_failure("insert")?;
        if state.resolve(&user.primary_email).is_some() {
            return Err(AccountError::Conflict("create user failed: Entity already exists.".into()));
        }
        let mut stored = user.clone();
        stored.creation_time = Some(Utc::now());
        stored.id = Some(format!("id-{}", state.users.len() + 1));
        stored.password = None;
        state.users.insert(stored.primary_email.clone(), stored.clone());
        Ok(stored)
    }

    async fn update_user(&self, user_key: &str, user: &DirectoryUser) -> Result<DirectoryUser> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Update {
            key: user_key.to_string(),
            primary_email: user.primary_email.clone(),
            org_unit: user.org_unit_path.clone(),
            password: user.password.clone(),
        });
        state.take_failure("update")?;

        let Some(primary) = state.resolve(user_key) else {
            return Err(AccountError::remote(404, "update user failed: Resource Not Found: userKey"));
        };
        let Some(existing) = state.users.remove(&primary) else {
            return Err(AccountError::remote(404, "update user failed: Resource Not Found: userKey"));
        };

        let mut stored = user.clone();
        stored.creation_time = existing.creation_time;
        stored.id = existing.id.clone();
        stored.password = None;
        if stored.primary_email != primary {
            state.aliases.insert(primary.clone(), stored.primary_email.clone());
            for target in state.aliases.values_mut() {
                if *target == primary {
                    *target = stored.primary_email.clone();
                }
            }
        }
        state.users.insert(stored.primary_email.clone(), stored.clone());
        state.applied_updates += 1;
        Ok(stored)
    }

    async fn delete_user(&self, user_key: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete(user_key.to_string()));
        state.take_failure("delete")?;
        let Some(primary) = state.resolve(user_key) else {
            return Err(AccountError::remote(404, "delete user failed: Resource Not Found: userKey"));
        };
        state.users.remove(&primary);
        state.aliases.retain(|_, target| *target != primary);
        Ok(())
    }

    async fn list_users(
        &self,
        domain: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<DirectoryUserList> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::List(page_token.map(String::from)));
        state.take_failure("list")?;

        let page_size = self.page_size.unwrap_or(max_results as usize);
        let start: usize = page_token.and_then(|t| t.parse().ok()).unwrap_or(0);
        let suffix = format!("@{domain}");
        let mut matching: Vec<DirectoryUser> = state
            .users
            .values()
            .filter(|u| u.primary_email.ends_with(&suffix))
            .cloned()
            .collect();
        matching.extend(
            state
                .relisted
                .iter()
                .filter_map(|email| state.users.get(email).cloned()),
        );
        let page: Vec<DirectoryUser> = matching.iter().skip(start).take(page_size).cloned().collect();
        let next = start + page.len();
        Ok(DirectoryUserList {
            users: Some(page),
            next_page_token: (next < matching.len()).then(|| next.to_string()),
        })
    }

    async fn delete_alias(&self, user_key: &str, alias: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DeleteAlias {
            user_key: user_key.to_string(),
            alias: alias.to_string(),
        });
        state.take_failure("delete_alias")?;
        if state.aliases.remove(alias).is_none() {
            return Err(AccountError::remote(404, "delete alias failed: Resource Not Found"));
        }
        Ok(())
    }
}

/// One audit sink event.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditEvent {
    Record {
        username: Option<String>,
        numeric_id: Option<String>,
        kind: AuditKind,
        message: String,
    },
    Backfill {
        username: Option<String>,
        numeric_id: Option<String>,
    },
    UsernameChanged {
        old: String,
        new: String,
    },
}

#[derive(Default)]
pub struct MemoryAuditLog {
    events: Mutex<Vec<AuditEvent>>,
    failing: Mutex<bool>,
}

impl MemoryAuditLog {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }

    /// `(kind, message)` of every recorded entry, in order.
    pub fn records(&self) -> Vec<(AuditKind, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                AuditEvent::Record { kind, message, .. } => Some((kind, message)),
                _ => None,
            })
            .collect()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    fn check(&self) -> Result<()> {
        if *self.failing.lock().unwrap() {
            return Err(AccountError::Io(std::io::Error::other("audit sink unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl AuditSink for MemoryAuditLog {
    async fn record(&self, person: &PersonRecord, kind: AuditKind, message: &str) -> Result<()> {
        self.check()?;
        self.events.lock().unwrap().push(AuditEvent::Record {
            username: person.username().map(String::from),
            numeric_id: person.numeric_id().map(String::from),
            kind,
            message: message.to_string(),
        });
        Ok(())
    }

    async fn backfill_username(&self, person: &PersonRecord) -> Result<()> {
        self.check()?;
        self.events.lock().unwrap().push(AuditEvent::Backfill {
            username: person.username().map(String::from),
            numeric_id: person.numeric_id().map(String::from),
        });
        Ok(())
    }

    async fn update_username(
        &self,
        _numeric_id: Option<&str>,
        old_username: &str,
        new_username: &str,
    ) -> Result<()> {
        self.check()?;
        self.events.lock().unwrap().push(AuditEvent::UsernameChanged {
            old: old_username.to_string(),
            new: new_username.to_string(),
        });
        Ok(())
    }
}

pub fn resolver() -> IdentityResolver {
    IdentityResolver::new(DOMAIN, SALT)
}

pub fn repository(directory: &Arc<FakeDirectory>, audit: &Arc<MemoryAuditLog>) -> AccountRepository {
    AccountRepository::new(
        directory.clone(),
        audit.clone(),
        resolver(),
        OrgUnits::default(),
    )
}

pub fn person(username: Option<&str>, numeric_id: Option<&str>) -> PersonRecord {
    PersonRecord::new(username.map(String::from), numeric_id.map(String::from)).unwrap()
}

/// The anonymous address for `numeric_id`.
pub fn anonymous_email(numeric_id: &str) -> String {
    resolver().account_name(&resolver().anonymous_local_part(numeric_id))
}

pub const PASSWORD_HASH: &str = "6a2f1e0b2cbd0f1a5e1c03b8d0c3b2f4e5a6b7c8";
