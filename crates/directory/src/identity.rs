//! Mapping person records onto directory account names.
//!
//! A person's account is named either `username@domain` (claimed) or, when no
//! username was known at creation time, `md5(numeric_id ++ salt)@domain`
//! (anonymous). The salted hash keeps anonymous names from being guessable
//! from sequential numeric ids.

use md5::{Digest, Md5};

use gaccount_core::person::PersonRecord;

/// Derives candidate account names for a person.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    domain: String,
    salt: String,
}

impl IdentityResolver {
    pub fn new(domain: &str, salt: &str) -> Self {
        Self {
            domain: domain.to_string(),
            salt: salt.to_string(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// `local@domain`.
    pub fn account_name(&self, local: &str) -> String {
        format!("{local}@{}", self.domain)
    }

    /// 32 lowercase hex characters derived from the numeric id and salt.
    pub fn anonymous_local_part(&self, numeric_id: &str) -> String {
        let mut hasher = Md5::new();
        hasher.update(numeric_id.as_bytes());
        hasher.update(self.salt.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn claimed_name(&self, person: &PersonRecord) -> Option<String> {
        person.username().map(|u| self.account_name(u))
    }

    pub fn anonymous_name(&self, person: &PersonRecord) -> Option<String> {
        person
            .numeric_id()
            .map(|id| self.account_name(&self.anonymous_local_part(id)))
    }

    /// Names to probe, claimed name first.
    ///
    /// A person may have a claimed account while a legacy anonymous account
    /// also exists under their numeric id; the claimed one wins.
    pub fn candidates(&self, person: &PersonRecord) -> Vec<String> {
        self.claimed_name(person)
            .into_iter()
            .chain(self.anonymous_name(person))
            .collect()
    }

    /// The name a new account for this person gets.
    pub fn preferred_name(&self, person: &PersonRecord) -> Option<String> {
        self.claimed_name(person)
            .or_else(|| self.anonymous_name(person))
    }
}

/// The part of an address before the `@`.
pub fn local_part(email: &str) -> &str {
    email.split_once('@').map_or(email, |(local, _)| local)
}

/// True iff `local` is exactly 32 lowercase hex characters.
pub fn is_anonymous_local_part(local: &str) -> bool {
    local.len() == 32 && local.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}
