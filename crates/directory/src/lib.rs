//! gaccount directory: account naming, lifecycle, and the Admin Directory
//! API client behind it.

pub mod auth;
pub mod availability;
pub mod client;
pub mod handle;
pub mod identity;
pub mod lifecycle;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;
