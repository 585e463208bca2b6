//! Shared services used across hosts.

mod database;

pub use database::DatabaseService;
