//! gaccount core: identity records, configuration, errors and the account audit log.

pub mod audit;
pub mod config;
pub mod db;
pub mod error;
pub mod lookup;
pub mod person;
