pub mod activate;
pub mod audit_log;
pub mod context;
pub mod create;
pub mod delete;
pub mod list;
pub mod rename;
pub mod reset;
pub mod status;
pub mod update_name;
