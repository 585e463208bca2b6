pub mod add;
pub mod auth_cmd;
pub mod common;
pub mod config;
pub mod daemon;
pub mod delete;
pub mod list;
pub mod meeting;
pub mod summary;
pub mod sync;
