//! Person identity records and the input rules used to build them.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AccountError, Result};

/// Canonical identity facts for one member of the organization.
///
/// At least one of `username` / `numeric_id` is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    username: Option<String>,
    numeric_id: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

impl PersonRecord {
    /// Build a record from its identifiers. Fails if both are absent.
    pub fn new(username: Option<String>, numeric_id: Option<String>) -> Result<Self> {
        let username = username.filter(|u| !u.is_empty());
        let numeric_id = numeric_id.filter(|n| !n.is_empty());
        if username.is_none() && numeric_id.is_none() {
            return Err(AccountError::Validation(
                "a person needs a username or a numeric id".into(),
            ));
        }
        Ok(Self {
            username,
            numeric_id,
            first_name: None,
            last_name: None,
        })
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    pub fn with_first_name(mut self, first: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self
    }

    pub fn with_last_name(mut self, last: impl Into<String>) -> Self {
        self.last_name = Some(last.into());
        self
    }

    /// A copy of this record bound to a different username.
    pub fn with_username(&self, username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..self.clone()
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn numeric_id(&self) -> Option<&str> {
        self.numeric_id.as_deref()
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    /// How this person is referred to in messages: username if known.
    pub fn identifier(&self) -> &str {
        self.username
            .as_deref()
            .or(self.numeric_id.as_deref())
            .unwrap_or_default()
    }
}

/// Optional service that fills in identity facts from an authoritative source.
#[async_trait]
pub trait PersonLookup: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<PersonRecord>>;
    async fn find_by_numeric_id(&self, numeric_id: &str) -> Result<Option<PersonRecord>>;
}

/// Raw identity fields as supplied by a caller (command-line flags, forms).
#[derive(Debug, Clone, Default)]
pub struct PersonInput {
    pub numeric_id: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Check a numeric id: exactly eight ASCII digits.
pub fn validate_numeric_id(numeric_id: &str) -> Result<()> {
    if numeric_id.len() == 8 && numeric_id.chars().all(|c| c.is_ascii_digit()) {
        return Ok(());
    }
    Err(AccountError::Validation(format!(
        "the numeric id \"{numeric_id}\" is incorrect"
    )))
}

/// Check a username: a lowercase letter followed by 1-15 lowercase letters or digits.
pub fn validate_username(username: &str) -> Result<()> {
    let mut chars = username.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    let rest_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if first_ok && rest_ok && (2..=16).contains(&username.len()) {
        return Ok(());
    }
    Err(AccountError::Validation(format!(
        "the username \"{username}\" is incorrect"
    )))
}

impl PersonInput {
    /// Lowercase the username, drop empty fields and validate identifier syntax.
    fn normalized(&self) -> Result<Self> {
        let clean = |v: &Option<String>| v.as_ref().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let out = Self {
            numeric_id: clean(&self.numeric_id),
            username: clean(&self.username).map(|u| u.to_lowercase()),
            first_name: clean(&self.first_name),
            last_name: clean(&self.last_name),
        };
        if let Some(ref id) = out.numeric_id {
            validate_numeric_id(id)?;
        }
        if let Some(ref u) = out.username {
            validate_username(u)?;
        }
        Ok(out)
    }
}

async fn lookup_person(
    lookup: &dyn PersonLookup,
    numeric_id: Option<&str>,
    username: Option<&str>,
) -> Result<PersonRecord> {
    let found = match (numeric_id, username) {
        (Some(id), _) => lookup.find_by_numeric_id(id).await?,
        (None, Some(u)) => lookup.find_by_username(u).await?,
        (None, None) => {
            return Err(AccountError::Validation(
                "a valid numeric id or username must be specified to look up a person".into(),
            ))
        }
    };

    found.ok_or_else(|| match numeric_id {
        Some(id) => AccountError::NotFound(format!("numeric id \"{id}\" does not map to a known person")),
        None => AccountError::NotFound(format!(
            "username \"{}\" does not map to a known person",
            username.unwrap_or_default()
        )),
    })
}

fn check_matches(person: &PersonRecord, numeric_id: Option<&str>, username: Option<&str>) -> Result<()> {
    if let Some(id) = numeric_id {
        if person.numeric_id() != Some(id) {
            return Err(AccountError::Validation(format!(
                "data mismatch: numeric id \"{id}\" does not match lookup result \"{}\"",
                person.numeric_id().unwrap_or_default()
            )));
        }
    }
    if let Some(u) = username {
        if person.username() != Some(u) {
            return Err(AccountError::Validation(format!(
                "data mismatch: username \"{u}\" does not match lookup result \"{}\"",
                person.username().unwrap_or_default()
            )));
        }
    }
    Ok(())
}

/// Build the record for a new account.
///
/// With every field supplied no lookup happens. Without a lookup service the
/// numeric id and both names are required. Otherwise the person is looked up
/// (numeric id first) and supplied names override the looked-up ones.
pub async fn resolve_for_create(
    input: &PersonInput,
    lookup: Option<&Arc<dyn PersonLookup>>,
) -> Result<PersonRecord> {
    let input = input.normalized()?;

    if let (Some(id), Some(u), Some(first), Some(last)) = (
        &input.numeric_id,
        &input.username,
        &input.first_name,
        &input.last_name,
    ) {
        return Ok(PersonRecord::new(Some(u.clone()), Some(id.clone()))?.with_name(first, last));
    }

    let Some(lookup) = lookup else {
        return match (&input.numeric_id, &input.first_name, &input.last_name) {
            (Some(id), Some(first), Some(last)) => {
                Ok(PersonRecord::new(input.username.clone(), Some(id.clone()))?.with_name(first, last))
            }
            _ => Err(AccountError::Validation(
                "numeric id, first name and last name are required when no person lookup service is configured".into(),
            )),
        };
    };

    let numeric_id = input.numeric_id.as_deref();
    let username = input.username.as_deref();
    let mut person = lookup_person(&**lookup, numeric_id, username).await?;
    check_matches(&person, numeric_id, username)?;

    if let Some(first) = input.first_name {
        person = person.with_first_name(first);
    }
    if let Some(last) = input.last_name {
        person = person.with_last_name(last);
    }
    Ok(person)
}

/// Build the record used to find an existing account.
///
/// At least one identifier is required. When only one is supplied and a
/// lookup service is available, the other is filled in from the service.
pub async fn resolve_identity(
    input: &PersonInput,
    lookup: Option<&Arc<dyn PersonLookup>>,
) -> Result<PersonRecord> {
    let input = input.normalized()?;
    let person = PersonRecord::new(input.username.clone(), input.numeric_id.clone())?;

    if person.username().is_some() && person.numeric_id().is_some() {
        return Ok(person);
    }

    match lookup {
        Some(lookup) => lookup_person(&**lookup, person.numeric_id(), person.username()).await,
        None => Ok(person),
    }
}

/// Build the record for renaming an account from `old_username` to `new_username`.
///
/// With a lookup service, a supplied numeric id must belong to a person whose
/// username is one of the two; without one, the numeric id is required.
pub async fn resolve_for_rename(
    numeric_id: Option<&str>,
    old_username: &str,
    new_username: &str,
    lookup: Option<&Arc<dyn PersonLookup>>,
) -> Result<PersonRecord> {
    let numeric_id = numeric_id.map(str::trim).filter(|s| !s.is_empty());
    let old_username = old_username.trim().to_lowercase();
    let new_username = new_username.trim().to_lowercase();

    if numeric_id.is_none() && lookup.is_none() {
        return Err(AccountError::Validation(
            "a numeric id must be specified when no person lookup service is configured".into(),
        ));
    }
    if let Some(id) = numeric_id {
        validate_numeric_id(id)?;
    }
    validate_username(&old_username)?;
    validate_username(&new_username)?;

    let Some(lookup) = lookup else {
        return PersonRecord::new(Some(old_username), numeric_id.map(String::from));
    };

    match numeric_id {
        Some(id) => {
            let person = lookup
                .find_by_numeric_id(id)
                .await?
                .ok_or_else(|| AccountError::NotFound(format!("numeric id \"{id}\" was not found")))?;
            let known = person.username();
            if known != Some(old_username.as_str()) && known != Some(new_username.as_str()) {
                return Err(AccountError::Validation(
                    "the numeric id does not match either username".into(),
                ));
            }
            Ok(person)
        }
        None => lookup
            .find_by_username(&new_username)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("the new username \"{new_username}\" was not found"))),
    }
}
